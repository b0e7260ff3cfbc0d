use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Result of resolving an archive entry name against an extraction root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SanitizedPath {
    /// Path relative to the extraction root.
    pub relative: PathBuf,
    /// `base` joined with `relative`.
    pub resolved: PathBuf,
}

/// Resolve `entry_name` against `base`, rejecting anything that escapes it.
///
/// `base` is expected to be absolute and already canonical. Backslashes are
/// treated as separators so archives produced on Windows cannot smuggle
/// `..\..\` past the check. The resolved path must be a strict descendant of
/// `base`; absolute names, drive-prefixed names and `..` walks that leave the
/// root all fail with [`Error::PathTraversal`].
pub fn sanitize_entry_path(entry_name: &str, base: &Path) -> Result<SanitizedPath> {
    if entry_name.contains('\0') {
        return Err(Error::InvalidPath);
    }

    let unified = entry_name.replace('\\', "/");
    let entry_path = Path::new(&unified);

    if entry_path.has_root() || entry_path.is_absolute() || has_drive_prefix(&unified) {
        return Err(Error::PathTraversal {
            entry: entry_name.to_string(),
            resolved: entry_path.to_path_buf(),
        });
    }

    let resolved = normalize_path(&base.join(entry_path));

    let relative = match resolved.strip_prefix(base) {
        Ok(rel) if rel.components().next().is_some() => rel.to_path_buf(),
        _ => {
            return Err(Error::PathTraversal {
                entry: entry_name.to_string(),
                resolved,
            });
        }
    };

    Ok(SanitizedPath { relative, resolved })
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Resolve `.` and `..` lexically. Nothing on disk is consulted.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(component.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_base_path() -> &'static Path {
        if cfg!(windows) {
            Path::new("C:/opt/unpacked")
        } else {
            Path::new("/opt/unpacked")
        }
    }

    #[test]
    fn plain_entry_resolves_under_base() {
        let result = sanitize_entry_path("extension/package.json", test_base_path()).unwrap();
        assert_eq!(result.relative, Path::new("extension/package.json"));
        assert_eq!(result.resolved, test_base_path().join("extension/package.json"));
    }

    #[test]
    fn inner_parent_segments_are_folded() {
        let result = sanitize_entry_path("extension/out/../package.json", test_base_path()).unwrap();
        assert_eq!(result.relative, Path::new("extension/package.json"));
    }

    #[test]
    fn current_dir_segments_are_ignored() {
        let result = sanitize_entry_path("./extension/./main.js", test_base_path()).unwrap();
        assert_eq!(result.relative, Path::new("extension/main.js"));
    }

    #[test]
    fn parent_escape_rejected() {
        let result = sanitize_entry_path("../../etc/passwd", test_base_path());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn nested_parent_escape_rejected() {
        let result = sanitize_entry_path("extension/../../sibling/evil.js", test_base_path());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn backslash_escape_rejected() {
        let result = sanitize_entry_path("..\\..\\evil.js", test_base_path());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn absolute_path_rejected() {
        let result = sanitize_entry_path("/etc/passwd", test_base_path());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn drive_prefixed_path_rejected() {
        let result = sanitize_entry_path("C:\\Windows\\evil.dll", test_base_path());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn entry_resolving_to_base_itself_rejected() {
        let result = sanitize_entry_path("extension/..", test_base_path());
        assert!(matches!(result, Err(Error::PathTraversal { .. })));
    }

    #[test]
    fn null_byte_rejected() {
        let result = sanitize_entry_path("ext\0ension", test_base_path());
        assert!(matches!(result, Err(Error::InvalidPath)));
    }

    #[test]
    fn path_normalization() {
        let result = normalize_path(Path::new("foo//bar/baz/../qux"));
        assert_eq!(result, Path::new("foo/bar/qux"));
    }
}
