//! Testing utilities for larastan-dump workspace
//!
//! Shared fixtures: a representative upstream `extension.neon` and temporary
//! Composer projects to run the dump against.

#![allow(missing_docs)]

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const LARASTAN: &str = "larastan/larastan";

pub const TARGET_FILE: &str = "phpstan-larastan.neon";

/// Upstream configuration with every disabled service present
///
/// Tab-indented like the published file, with bare `%param%` and `@service`
/// references, `parametersSchema` entities and `conditionalTags`.
pub const EXTENSION_NEON: &str = include_str!("../fixtures/extension.neon");

/// Services left after the disabled ones are removed from [`EXTENSION_NEON`]
pub const KEPT_SERVICES: [&str; 5] = [
    "Larastan\\Larastan\\Methods\\RelationForwardsCallsExtension",
    "Larastan\\Larastan\\Properties\\MigrationHelper",
    "Larastan\\Larastan\\Rules\\NoEnvCallsOutsideOfConfigRule",
    "Larastan\\Larastan\\Rules\\NoModelMakeRule",
    "Larastan\\Larastan\\Types\\RelationParserHelper",
];

/// Temporary Composer project
pub struct ProjectFixture {
    dir: TempDir,
    packages: Vec<serde_json::Value>,
}

impl ProjectFixture {
    /// Project without any installed package metadata
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            packages: Vec::new(),
        }
    }

    /// Project with Larastan installed and shipping `extension`
    pub fn with_larastan(extension: &str) -> Self {
        let mut project = Self::new();
        project.install(LARASTAN, extension);
        project
    }

    /// Install `name` under `vendor/` with the given `extension.neon`
    ///
    /// Writes Composer 2 metadata covering every package installed so far.
    pub fn install(&mut self, name: &str, extension: &str) -> PathBuf {
        let package_dir = self.root().join("vendor").join(name);
        fs::create_dir_all(&package_dir).unwrap();
        fs::write(package_dir.join("extension.neon"), extension).unwrap();

        self.packages.push(json!({
            "name": name,
            "version": "3.0.0",
            "install-path": format!("../{name}"),
        }));
        self.write_installed_json();
        package_dir
    }

    /// Record an empty `installed.json`
    pub fn with_empty_registry(mut self) -> Self {
        self.packages.clear();
        self.write_installed_json();
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn package_dir(&self) -> PathBuf {
        self.root().join("vendor").join(LARASTAN)
    }

    pub fn target(&self) -> PathBuf {
        self.root().join(TARGET_FILE)
    }

    pub fn read_target(&self) -> String {
        fs::read_to_string(self.target()).unwrap()
    }

    pub fn write_target(&self, content: &str) {
        fs::write(self.target(), content).unwrap();
    }

    fn write_installed_json(&self) {
        let composer_dir = self.root().join("vendor/composer");
        fs::create_dir_all(&composer_dir).unwrap();
        let installed = json!({
            "packages": self.packages,
            "dev": true,
            "dev-package-names": [],
        });
        fs::write(
            composer_dir.join("installed.json"),
            serde_json::to_string_pretty(&installed).unwrap(),
        )
        .unwrap();
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}
