//! Dump configuration

use ldump_document::EncodeOptions;
use std::path::{Path, PathBuf};

/// Composer package whose configuration is dumped
pub const DEFAULT_PACKAGE: &str = "larastan/larastan";

/// Configuration file shipped in the package root
pub const DEFAULT_ORIGIN_FILE: &str = "extension.neon";

/// File written into the project root
pub const DEFAULT_TARGET_FILE: &str = "phpstan-larastan.neon";

/// What to do when the package is not installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPackagePolicy {
    /// Do nothing and report [`Outcome::Skipped`](crate::Outcome::Skipped)
    #[default]
    Skip,
    /// Fail with [`DumpError::NotInstalled`](crate::DumpError::NotInstalled)
    Fail,
}

/// Dump configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConfig {
    /// Project root; the target file is written here
    pub root_dir: PathBuf,
    /// Composer package name
    pub package: String,
    /// Origin file name, relative to the package directory
    pub origin_file: String,
    /// Target file name, relative to `root_dir`
    pub target_file: String,
    /// Output encoding
    pub encode: EncodeOptions,
    /// Missing package handling
    pub missing_package: MissingPackagePolicy,
}

impl DumpConfig {
    /// Default configuration for the project at `root_dir`
    #[inline]
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            package: DEFAULT_PACKAGE.to_string(),
            origin_file: DEFAULT_ORIGIN_FILE.to_string(),
            target_file: DEFAULT_TARGET_FILE.to_string(),
            encode: EncodeOptions::default(),
            missing_package: MissingPackagePolicy::default(),
        }
    }

    /// With package name
    #[inline]
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    /// With origin file name
    #[inline]
    #[must_use]
    pub fn with_origin_file(mut self, origin_file: impl Into<String>) -> Self {
        self.origin_file = origin_file.into();
        self
    }

    /// With target file name
    #[inline]
    #[must_use]
    pub fn with_target_file(mut self, target_file: impl Into<String>) -> Self {
        self.target_file = target_file.into();
        self
    }

    /// With encoder options
    #[inline]
    #[must_use]
    pub fn with_encode_options(mut self, encode: EncodeOptions) -> Self {
        self.encode = encode;
        self
    }

    /// With missing package policy
    #[inline]
    #[must_use]
    pub fn with_missing_package(mut self, policy: MissingPackagePolicy) -> Self {
        self.missing_package = policy;
        self
    }

    /// Origin path inside an install directory
    #[inline]
    #[must_use]
    pub fn origin_path(&self, package_dir: &Path) -> PathBuf {
        package_dir.join(&self.origin_file)
    }

    /// Target path in the project root
    #[inline]
    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        self.root_dir.join(&self.target_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DumpConfig::new("/app");

        assert_eq!(config.package, "larastan/larastan");
        assert_eq!(config.target_path(), PathBuf::from("/app/phpstan-larastan.neon"));
        assert_eq!(
            config.origin_path(Path::new("/app/vendor/larastan/larastan")),
            PathBuf::from("/app/vendor/larastan/larastan/extension.neon")
        );
        assert_eq!(config.missing_package, MissingPackagePolicy::Skip);
        assert_eq!(config.encode.indent(), "    ");
    }

    #[test]
    fn builder_overrides() {
        let config = DumpConfig::new("/app")
            .with_package("nunomaduro/larastan")
            .with_target_file("build/larastan.neon")
            .with_encode_options(EncodeOptions::spaces(2))
            .with_missing_package(MissingPackagePolicy::Fail);

        assert_eq!(config.package, "nunomaduro/larastan");
        assert_eq!(config.target_path(), PathBuf::from("/app/build/larastan.neon"));
        assert_eq!(config.encode.indent(), "  ");
        assert_eq!(config.missing_package, MissingPackagePolicy::Fail);
    }
}
