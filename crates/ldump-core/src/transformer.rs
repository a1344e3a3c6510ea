//! Dump pipeline
//!
//! lookup → read → decode → relocate bootstrap files → drop disabled
//! services → encode → write. Every check runs before the single write, so a
//! failed run leaves the previous target file untouched.

use crate::bootstrap::rewrite_bootstrap_paths;
use crate::config::{DumpConfig, MissingPackagePolicy};
use crate::error::{DumpError, DumpResult, PathError};
use crate::registry::PackageRegistry;
use crate::services::remove_disabled_services;
use ldump_document::ConfigDocument;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Target file was (re)written
    Updated {
        target: PathBuf,
        /// Service classes dropped from the document
        removed: Vec<String>,
    },
    /// Package is not installed and the policy is [`MissingPackagePolicy::Skip`]
    Skipped { package: String },
}

/// Apply both rewrites to a decoded document
///
/// # Errors
/// Any error from [`rewrite_bootstrap_paths`] or [`remove_disabled_services`].
pub fn transform(
    document: &mut ConfigDocument,
    package_root: &Path,
    target: &Path,
) -> DumpResult<Vec<String>> {
    rewrite_bootstrap_paths(document, package_root, target)?;
    remove_disabled_services(document)
}

/// Regenerates the target configuration from the installed package
#[derive(Debug)]
pub struct ConfigTransformer<R> {
    config: DumpConfig,
    registry: R,
}

impl<R: PackageRegistry> ConfigTransformer<R> {
    /// Create transformer
    #[inline]
    #[must_use]
    pub fn new(config: DumpConfig, registry: R) -> Self {
        Self { config, registry }
    }

    /// Run the whole pipeline
    ///
    /// # Errors
    /// Any [`DumpError`]; nothing is written when one is returned.
    pub fn run(&self) -> DumpResult<Outcome> {
        let Some(package_dir) = self.package_dir()? else {
            return Ok(Outcome::Skipped {
                package: self.config.package.clone(),
            });
        };

        let origin = self.config.origin_path(&package_dir);
        let target = self.config.target_path();
        let (text, removed) = self.render(&package_dir, &origin, &target)?;

        fs::write(&target, text).map_err(|e| DumpError::io_error(&target, e))?;
        info!(target = %target.display(), removed = removed.len(), "updated configuration");

        Ok(Outcome::Updated { target, removed })
    }

    /// Install directory, `None` when skipping
    fn package_dir(&self) -> DumpResult<Option<PathBuf>> {
        let package = &self.config.package;
        match self.registry.install_path(package)? {
            Some(dir) => {
                debug!(package = %package, dir = %dir.display(), "found package");
                Ok(Some(dir))
            }
            None => match self.config.missing_package {
                MissingPackagePolicy::Skip => {
                    warn!(package = %package, "package not installed, skipping");
                    Ok(None)
                }
                MissingPackagePolicy::Fail => Err(DumpError::NotInstalled {
                    package: package.clone(),
                }),
            },
        }
    }

    /// Produce the target text without writing it
    fn render(
        &self,
        package_dir: &Path,
        origin: &Path,
        target: &Path,
    ) -> DumpResult<(String, Vec<String>)> {
        if !target.is_absolute() {
            return Err(PathError::NotAbsolute(target.to_path_buf()).into());
        }

        let content = fs::read_to_string(origin).map_err(|e| DumpError::io_error(origin, e))?;
        let mut document =
            ConfigDocument::decode(&content).map_err(|source| DumpError::MalformedDocument {
                path: origin.to_path_buf(),
                source,
            })?;
        debug!(origin = %origin.display(), keys = document.root().len(), "decoded origin");

        let removed = transform(&mut document, package_dir, target)?;
        let text = document
            .encode(&self.config.encode)
            .map_err(DumpError::Encode)?;

        Ok((text, removed))
    }
}
