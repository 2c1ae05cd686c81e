/*
 * paths.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Path arithmetic for url resolution and emission.
//!
//! All resolution is lexical: stylesheet urls are resolved against the
//! stylesheet's directory without touching the filesystem, so the scan works
//! on sources that have not been written to their final location yet.

use std::path::{Component, Path, PathBuf};

/// Resolve a stylesheet url against the stylesheet path, lexically
/// normalizing `.` and `..` components.
pub fn make_absolute_to(css_path: &Path, url: &str) -> PathBuf {
    let url_path = Path::new(url);
    if url_path.is_absolute() {
        return normalize(url_path);
    }
    let base = css_path.parent().unwrap_or_else(|| Path::new(""));
    normalize(&base.join(url_path))
}

/// Lexically remove `.` components and fold `..` into their parent.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Express `target` relative to `base_dir`, falling back to `target` itself
/// when the two share no common root.
pub fn relative_to(base_dir: &Path, target: &Path) -> PathBuf {
    let base_norm = normalize(base_dir);
    let base: Vec<Component<'_>> = base_norm.components().collect();
    let target_norm = normalize(target);
    let tgt: Vec<Component<'_>> = target_norm.components().collect();

    let mut common = 0;
    while common < base.len() && common < tgt.len() && base[common] == tgt[common] {
        common += 1;
    }
    if common == 0 && base.first().is_some_and(|c| matches!(c, Component::RootDir | Component::Prefix(_))) {
        return target_norm;
    }

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &tgt[common..] {
        out.push(component);
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Render a path as url text with forward slashes.
pub fn to_url_text(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str("..");
            }
            Component::Normal(part) => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&part.to_string_lossy());
            }
            Component::Prefix(prefix) => {
                out.push_str(&prefix.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_absolute_resolves_parent_segments() {
        let css = Path::new("/site/css/app.css");
        assert_eq!(
            make_absolute_to(css, "../i/02/a.gif"),
            PathBuf::from("/site/i/02/a.gif")
        );
        assert_eq!(
            make_absolute_to(css, "./b.png"),
            PathBuf::from("/site/css/b.png")
        );
        assert_eq!(make_absolute_to(css, "/img/c.png"), PathBuf::from("/img/c.png"));
    }

    #[test]
    fn test_normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
    }

    #[test]
    fn test_relative_to_walks_up() {
        assert_eq!(
            relative_to(Path::new("/site/css"), Path::new("/site/images/s.png")),
            PathBuf::from("../images/s.png")
        );
        assert_eq!(
            relative_to(Path::new("/site/css"), Path::new("/site/css/s.png")),
            PathBuf::from("s.png")
        );
    }

    #[test]
    fn test_to_url_text_uses_forward_slashes() {
        assert_eq!(to_url_text(Path::new("../images/s.png")), "../images/s.png");
        assert_eq!(to_url_text(Path::new("/site/s.png")), "/site/s.png");
    }
}
