//! Bootstrap file relocation

use crate::error::{DumpError, DumpResult};
use crate::paths::{relative_path, resolve};
use ldump_document::{value_kind, ConfigDocument, Value};
use std::path::Path;
use tracing::debug;

/// Section holding the bootstrap file list
pub const PARAMETERS: &str = "parameters";

/// Key of the bootstrap file list inside [`PARAMETERS`]
pub const BOOTSTRAP_FILES: &str = "bootstrapFiles";

/// Rewrite `parameters.bootstrapFiles` from package-relative to target-relative
///
/// Each entry is resolved against `package_root`, then made relative to the
/// directory holding `target`. Length and order are kept.
///
/// # Errors
/// - [`DumpError::MissingOrMalformedSection`] if `parameters` is not a mapping
///   or `bootstrapFiles` is not a sequence
/// - [`DumpError::InvalidEntryType`] for a non-string entry
/// - [`DumpError::Path`] if the paths cannot be related
pub fn rewrite_bootstrap_paths(
    document: &mut ConfigDocument,
    package_root: &Path,
    target: &Path,
) -> DumpResult<()> {
    let target_dir = target.parent().unwrap_or(target);
    let section = format!("{PARAMETERS}.{BOOTSTRAP_FILES}");

    let parameters = match document.root_mut().get_mut(PARAMETERS) {
        Some(Value::Mapping(parameters)) => parameters,
        other => {
            return Err(DumpError::section(
                PARAMETERS,
                "mapping",
                other.map_or("missing", |v| value_kind(v)),
            ))
        }
    };

    let files = match parameters.get_mut(BOOTSTRAP_FILES) {
        Some(Value::Sequence(files)) => files,
        other => {
            return Err(DumpError::section(
                section,
                "sequence",
                other.map_or("missing", |v| value_kind(v)),
            ))
        }
    };

    for (index, entry) in files.iter_mut().enumerate() {
        let Value::String(file) = entry else {
            return Err(DumpError::InvalidEntryType {
                section,
                index,
                actual: value_kind(entry),
            });
        };

        let absolute = resolve(package_root, file.as_str())?;
        let relocated = relative_path(target_dir, &absolute)?;

        debug!(from = %file, to = %relocated, "relocated bootstrap file");
        *file = relocated;
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::paths::normalize;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn document(text: &str) -> ConfigDocument {
        ConfigDocument::decode(text).unwrap()
    }

    fn files(document: &ConfigDocument) -> Vec<String> {
        document
            .get_path("parameters.bootstrapFiles")
            .and_then(Value::as_sequence)
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn rewrites_relative_to_target_dir() {
        let mut doc = document("parameters:\n  bootstrapFiles:\n    - vendor/autoload.php\n");

        rewrite_bootstrap_paths(
            &mut doc,
            Path::new("/pkg"),
            Path::new("/proj/phpstan-larastan.neon"),
        )
        .unwrap();

        assert_eq!(files(&doc), vec!["../pkg/vendor/autoload.php"]);
    }

    #[test]
    fn keeps_length_and_order() {
        let mut doc = document(
            "parameters:\n  bootstrapFiles:\n    - bootstrap.php\n    - stubs/a.php\n    - ../shared/b.php\n",
        );

        rewrite_bootstrap_paths(
            &mut doc,
            Path::new("/app/vendor/larastan/larastan"),
            Path::new("/app/phpstan-larastan.neon"),
        )
        .unwrap();

        assert_eq!(
            files(&doc),
            vec![
                "vendor/larastan/larastan/bootstrap.php",
                "vendor/larastan/larastan/stubs/a.php",
                "vendor/larastan/shared/b.php",
            ]
        );
    }

    #[test]
    fn empty_list_is_accepted() {
        let mut doc = document("parameters:\n  bootstrapFiles: []\n");

        rewrite_bootstrap_paths(&mut doc, Path::new("/pkg"), Path::new("/proj/out.neon")).unwrap();

        assert!(files(&doc).is_empty());
    }

    #[test]
    fn missing_parameters_fails() {
        let mut doc = document("services: []\n");

        let err = rewrite_bootstrap_paths(&mut doc, Path::new("/pkg"), Path::new("/proj/out.neon"))
            .unwrap_err();

        assert!(matches!(
            err,
            DumpError::MissingOrMalformedSection { ref section, actual: "missing", .. } if section == "parameters"
        ));
    }

    #[test]
    fn missing_bootstrap_files_fails() {
        let mut doc = document("parameters:\n  level: 5\n");

        let err = rewrite_bootstrap_paths(&mut doc, Path::new("/pkg"), Path::new("/proj/out.neon"))
            .unwrap_err();

        assert!(matches!(
            err,
            DumpError::MissingOrMalformedSection { ref section, expected: "sequence", .. }
                if section == "parameters.bootstrapFiles"
        ));
    }

    #[test]
    fn scalar_parameters_fails() {
        let mut doc = document("parameters: 5\n");

        let err = rewrite_bootstrap_paths(&mut doc, Path::new("/pkg"), Path::new("/proj/out.neon"))
            .unwrap_err();

        assert!(matches!(
            err,
            DumpError::MissingOrMalformedSection { actual: "number", .. }
        ));
    }

    #[test]
    fn non_string_entry_fails_with_index() {
        let mut doc = document("parameters:\n  bootstrapFiles:\n    - a.php\n    - 42\n");

        let err = rewrite_bootstrap_paths(&mut doc, Path::new("/pkg"), Path::new("/proj/out.neon"))
            .unwrap_err();

        assert!(matches!(
            err,
            DumpError::InvalidEntryType { index: 1, actual: "number", .. }
        ));
    }

    proptest! {
        #[test]
        fn rewritten_entries_point_to_same_files(
            entries in prop::collection::vec("[a-z]{1,4}(/[a-z]{1,4}){0,3}\\.php", 0..6),
            package in "(/[a-z]{1,4}){1,4}",
            project in "(/[a-z]{1,4}){1,4}",
        ) {
            let package_root = Path::new(&package);
            let target = Path::new(&project).join("phpstan-larastan.neon");
            let mut doc = ConfigDocument::default();
            doc.root_mut().insert(
                Value::from(PARAMETERS),
                Value::Mapping(
                    [(
                        Value::from(BOOTSTRAP_FILES),
                        Value::Sequence(entries.iter().cloned().map(Value::String).collect()),
                    )]
                    .into_iter()
                    .collect(),
                ),
            );

            rewrite_bootstrap_paths(&mut doc, package_root, &target).unwrap();

            let rewritten = files(&doc);
            prop_assert_eq!(rewritten.len(), entries.len());

            let target_dir = target.parent().unwrap();
            for (original, relocated) in entries.iter().zip(&rewritten) {
                prop_assert_eq!(
                    normalize(&target_dir.join(relocated)),
                    normalize(&package_root.join(original))
                );
            }
        }
    }
}
