//! Root-relative path normalization
//!
//! Every path handed to git is relative to the watched root and uses `/`
//! as its only separator.

use std::path::Path;

/// Normalize a root-relative path into the canonical form used for git arguments
///
/// Backslashes become `/`, repeated separators collapse, leading and trailing
/// separators are dropped and non-breaking spaces become plain spaces. An
/// empty path normalizes to `/`.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut last_was_sep = false;

    for ch in path.chars() {
        let ch = match ch {
            '\\' => '/',
            '\u{00A0}' | '\u{202F}' => ' ',
            other => other,
        };

        if ch == '/' {
            if last_was_sep {
                continue;
            }
            last_was_sep = true;
        } else {
            last_was_sep = false;
        }
        out.push(ch);
    }

    let trimmed = out.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Express `path` relative to `root` in normalized form
///
/// Returns `None` when the path is outside the root or is the root itself.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        return None;
    }

    Some(normalize(&joined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_plain_path_unchanged() {
        assert_eq!(normalize("notes/a.md"), "notes/a.md");
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize("notes\\daily\\2024.md"), "notes/daily/2024.md");
        assert_eq!(normalize("notes//daily///2024.md"), "notes/daily/2024.md");
        assert_eq!(normalize("/notes/a.md/"), "notes/a.md");
    }

    #[test]
    fn test_normalize_non_breaking_space() {
        assert_eq!(normalize("my\u{00A0}note.md"), "my note.md");
        assert_eq!(normalize("my\u{202F}note.md"), "my note.md");
    }

    #[test]
    fn test_normalize_empty_is_root() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("///"), "/");
    }

    #[test]
    fn test_relative_to() {
        let root = PathBuf::from("/vault");
        assert_eq!(
            relative_to(&root, &root.join("notes").join("a.md")),
            Some("notes/a.md".to_string())
        );
        assert_eq!(relative_to(&root, &root), None);
        assert_eq!(relative_to(&root, Path::new("/elsewhere/a.md")), None);
    }
}
