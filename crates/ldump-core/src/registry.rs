//! Installed-package lookup
//!
//! [`ComposerRegistry`] reads the metadata Composer writes on every install
//! (`vendor/composer/installed.json`). [`StaticRegistry`] is a fixed map for
//! embedders and tests.

use crate::error::RegistryError;
use crate::paths::normalize;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of package install directories
#[cfg_attr(test, mockall::automock)]
pub trait PackageRegistry {
    /// Install directory of `package`, `None` when it is not installed
    ///
    /// # Errors
    /// Returns error if the registry metadata cannot be read.
    fn install_path(&self, package: &str) -> Result<Option<PathBuf>, RegistryError>;
}

/// Registry backed by Composer's `installed.json`
#[derive(Debug, Clone)]
pub struct ComposerRegistry {
    vendor_dir: PathBuf,
    packages: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ComposerManifest {
    #[serde(default)]
    config: ComposerConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ComposerConfig {
    #[serde(rename = "vendor-dir")]
    vendor_dir: Option<String>,
}

/// Composer 2 wraps the list in an object, Composer 1 writes the bare list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstalledJson {
    V2 { packages: Vec<InstalledPackage> },
    V1(Vec<InstalledPackage>),
}

#[derive(Debug, Deserialize)]
struct InstalledPackage {
    name: String,
    #[serde(rename = "install-path")]
    install_path: Option<String>,
}

impl ComposerRegistry {
    /// Manifest file name in the project root
    pub const MANIFEST: &'static str = "composer.json";

    /// Load the registry for the project at `root`
    ///
    /// The vendor directory comes from `config.vendor-dir` in
    /// `composer.json` when set, `vendor` otherwise. A missing
    /// `installed.json` yields an empty registry.
    ///
    /// # Errors
    /// Returns error if a metadata file exists but cannot be read or parsed.
    pub fn discover(root: &Path) -> Result<Self, RegistryError> {
        let manifest: ComposerManifest = read_json(&root.join(Self::MANIFEST))?.unwrap_or_default();
        let vendor_dir = normalize(&root.join(
            manifest.config.vendor_dir.as_deref().unwrap_or("vendor"),
        ));

        Self::from_vendor_dir(vendor_dir)
    }

    /// Load the registry from an explicit vendor directory
    ///
    /// # Errors
    /// Returns error if `installed.json` exists but cannot be read or parsed.
    pub fn from_vendor_dir(vendor_dir: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let vendor_dir = vendor_dir.into();
        let composer_dir = vendor_dir.join("composer");
        let installed_path = composer_dir.join("installed.json");

        let installed = match read_json::<InstalledJson>(&installed_path)? {
            Some(InstalledJson::V2 { packages } | InstalledJson::V1(packages)) => packages,
            None => {
                debug!(path = %installed_path.display(), "no installed.json, registry is empty");
                Vec::new()
            }
        };

        let packages = installed
            .into_iter()
            .map(|package| {
                let path = match &package.install_path {
                    Some(install_path) => normalize(&composer_dir.join(install_path)),
                    None => vendor_dir.join(&package.name),
                };
                (package.name, path)
            })
            .collect::<BTreeMap<_, _>>();

        debug!(
            vendor_dir = %vendor_dir.display(),
            packages = packages.len(),
            "loaded composer registry"
        );

        Ok(Self {
            vendor_dir,
            packages,
        })
    }

    /// Resolved vendor directory
    #[inline]
    #[must_use]
    pub fn vendor_dir(&self) -> &Path {
        &self.vendor_dir
    }

    /// Number of installed packages
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether no package is installed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageRegistry for ComposerRegistry {
    fn install_path(&self, package: &str) -> Result<Option<PathBuf>, RegistryError> {
        Ok(self.packages.get(package).cloned())
    }
}

/// Fixed name → directory map
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    packages: BTreeMap<String, PathBuf>,
}

impl StaticRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With an installed package
    #[inline]
    #[must_use]
    pub fn with_package(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.packages.insert(name.into(), path.into());
        self
    }
}

impl PackageRegistry for StaticRegistry {
    fn install_path(&self, package: &str) -> Result<Option<PathBuf>, RegistryError> {
        Ok(self.packages.get(package).cloned())
    }
}

/// Read and parse a JSON file, `None` if it does not exist
fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, RegistryError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(RegistryError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| RegistryError::InvalidMetadata {
            path: path.to_path_buf(),
            source,
        })
}
