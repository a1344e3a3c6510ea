//! larastan-dump core
//!
//! Regenerates `phpstan-larastan.neon` from the `extension.neon` shipped by
//! the installed Larastan package:
//! - bootstrap files are rewritten relative to the new file location
//! - conflicting container return-type services are removed, and the run
//!   fails if any of them disappeared upstream
//!
//! # Example
//!
//! ```rust,ignore
//! use ldump_core::{ComposerRegistry, ConfigTransformer, DumpConfig, Outcome};
//!
//! let root = std::env::current_dir()?;
//! let registry = ComposerRegistry::discover(&root)?;
//! match ConfigTransformer::new(DumpConfig::new(&root), registry).run()? {
//!     Outcome::Updated { target, .. } => println!("  Updated {}", target.display()),
//!     Outcome::Skipped { .. } => {}
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod paths;
pub mod registry;
pub mod services;
pub mod transformer;

pub use bootstrap::rewrite_bootstrap_paths;
pub use config::{
    DumpConfig, MissingPackagePolicy, DEFAULT_ORIGIN_FILE, DEFAULT_PACKAGE, DEFAULT_TARGET_FILE,
};
pub use error::{DumpError, DumpResult, PathError, RegistryError};
pub use registry::{ComposerRegistry, PackageRegistry, StaticRegistry};
pub use services::{remove_disabled_services, remove_services, DISABLED_SERVICES};
pub use transformer::{transform, ConfigTransformer, Outcome};

pub use ldump_document::{ConfigDocument, EncodeOptions};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
