//! Lexical path helpers
//!
//! Nothing here touches the filesystem: the upstream package and the target
//! file may be resolved before either exists, and symlinks inside `vendor/`
//! must not change the relative paths written into the document.

use crate::error::PathError;
use std::path::{Component, Path, PathBuf};

/// Fold `.` and `..` components
///
/// `..` directly under the root stays at the root; leading `..` of a relative
/// path is kept.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::ParentDir) | None => parts.push(component),
                Some(_) => {}
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Resolve `path` against an absolute `base`
///
/// Absolute paths are only normalized.
///
/// # Errors
/// [`PathError::NotAbsolute`] if `base` is relative.
pub fn resolve(base: &Path, path: impl AsRef<Path>) -> Result<PathBuf, PathError> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    if !base.is_absolute() {
        return Err(PathError::NotAbsolute(base.to_path_buf()));
    }
    Ok(normalize(&base.join(path)))
}

/// Relative path from directory `from` to `to`, `/`-separated
///
/// Returns `.` when both name the same directory.
///
/// # Errors
/// - [`PathError::NotAbsolute`] if either input is relative
/// - [`PathError::DifferentRoots`] if the inputs have different prefixes
/// - [`PathError::NonUtf8`] if a differing component is not UTF-8
pub fn relative_path(from: &Path, to: &Path) -> Result<String, PathError> {
    for path in [from, to] {
        if !path.is_absolute() {
            return Err(PathError::NotAbsolute(path.to_path_buf()));
        }
    }

    let from = normalize(from);
    let to = normalize(to);
    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();

    if from_parts.first() != to_parts.first() {
        return Err(PathError::DifferentRoots { from, to });
    }

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = vec![".."; from_parts.len() - common];
    for part in &to_parts[common..] {
        let segment = part
            .as_os_str()
            .to_str()
            .ok_or_else(|| PathError::NonUtf8(to.clone()))?;
        segments.push(segment);
    }

    if segments.is_empty() {
        return Ok(".".to_string());
    }
    Ok(segments.join("/"))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/../../b")), PathBuf::from("../../b"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let base = Path::new("/pkg");

        assert_eq!(
            resolve(base, "vendor/autoload.php").unwrap(),
            PathBuf::from("/pkg/vendor/autoload.php")
        );
        assert_eq!(
            resolve(base, "../../autoload.php").unwrap(),
            PathBuf::from("/autoload.php")
        );
        assert_eq!(
            resolve(base, "/etc/./bootstrap.php").unwrap(),
            PathBuf::from("/etc/bootstrap.php")
        );
    }

    #[test]
    fn resolve_requires_absolute_base() {
        assert_eq!(
            resolve(Path::new("pkg"), "a.php"),
            Err(PathError::NotAbsolute(PathBuf::from("pkg")))
        );
    }

    #[test]
    fn relative_path_between_siblings() {
        assert_eq!(
            relative_path(Path::new("/proj"), Path::new("/pkg/vendor/autoload.php")).unwrap(),
            "../pkg/vendor/autoload.php"
        );
    }

    #[test]
    fn relative_path_into_subdirectory() {
        assert_eq!(
            relative_path(
                Path::new("/app"),
                Path::new("/app/vendor/larastan/larastan/bootstrap.php")
            )
            .unwrap(),
            "vendor/larastan/larastan/bootstrap.php"
        );
    }

    #[test]
    fn relative_path_to_self_is_dot() {
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b/")).unwrap(), ".");
    }

    #[test]
    fn relative_path_rejects_relative_inputs() {
        assert!(matches!(
            relative_path(Path::new("proj"), Path::new("/pkg")),
            Err(PathError::NotAbsolute(_))
        ));
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z]{1,6}"
    }

    proptest! {
        #[test]
        fn relative_path_resolves_back(
            from in prop::collection::vec(segment(), 0..5),
            to in prop::collection::vec(segment(), 1..5),
        ) {
            let from = PathBuf::from(format!("/{}", from.join("/")));
            let to = PathBuf::from(format!("/{}", to.join("/")));

            let relative = relative_path(&from, &to).unwrap();

            prop_assert_eq!(resolve(&from, &relative).unwrap(), normalize(&to));
        }
    }
}
