//! NEON configuration documents
//!
//! Documents decode into `serde_yaml`'s ordered [`Value`] tree. NEON entities
//! such as `listOf(string())` become [`Value::Tagged`] nodes named after the
//! entity, so they are written back as entities rather than strings. Encoding
//! uses a block-mode writer whose quoting follows NEON's literal rules.
//!
//! # Example
//!
//! ```rust
//! use ldump_document::{ConfigDocument, EncodeOptions};
//!
//! let doc = ConfigDocument::decode("parameters:\n  level: 5\n").unwrap();
//! let text = doc.encode(&EncodeOptions::default()).unwrap();
//!
//! assert_eq!(text, "parameters:\n    level: 5\n");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod decode;
mod document;
mod encode;
mod error;

pub use document::{value_kind, ConfigDocument};
pub use encode::{EncodeOptions, DEFAULT_INDENT};
pub use error::{DocumentError, DocumentResult};

/// Value tree types, re-exported so callers do not need their own `serde_yaml` dependency
pub use serde_yaml::{Mapping, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
