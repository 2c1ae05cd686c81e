/*
 * hasher.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Content-hashing capability for produced assets.
//!
//! The pipeline consumes hashing as a capability: given a file path, the
//! hasher materializes a copy whose name encodes a content digest and
//! returns the new path, which the rewrite pass then references for
//! cache-busting. [`Sha256Hasher`] is the provided implementation; callers
//! may supply their own.
//!
//! Urls carrying a `%IMAGE:<name>%` placeholder are resolved by a later
//! substitution stage outside this pipeline and must pass through every
//! stage untouched; [`is_token_url`] is the shared check.

use std::path::{Path, PathBuf};

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Content-addresses produced files.
///
/// Implementations must be safe to share across concurrently running
/// pipelines.
pub trait ImageHasher: Send + Sync {
    /// Copy or rename `path` so its file name encodes a digest of the
    /// contents, returning the new path.
    fn hash_file(&self, path: &Path) -> anyhow::Result<PathBuf>;
}

static IMAGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%IMAGE:[^%]+%").expect("token pattern is valid"));

/// Whether a stylesheet url carries an `%IMAGE:<name>%` placeholder.
pub fn is_token_url(url: &str) -> bool {
    IMAGE_TOKEN.is_match(url)
}

/// Hex digits of the digest kept in file names.
const DIGEST_LEN: usize = 16;

/// SHA-256 content hasher.
///
/// `a/b/sheet.png` becomes `<dir>/sheet.<digest16>.png`, where `<dir>` is
/// the configured destination directory or the source file's own directory.
/// The source file is copied, not moved.
#[derive(Debug, Clone, Default)]
pub struct Sha256Hasher {
    destination_dir: Option<PathBuf>,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_destination(dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: Some(dir.into()),
        }
    }
}

impl ImageHasher for Sha256Hasher {
    fn hash_file(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let contents = std::fs::read(path)
            .with_context(|| format!("reading `{}` for hashing", path.display()))?;
        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let digest = hex::encode(hasher.finalize());
        let digest = &digest[..DIGEST_LEN];

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{}.{}.{}", stem, digest, ext.to_string_lossy()),
            None => format!("{}.{}", stem, digest),
        };
        let dir = match &self.destination_dir {
            Some(dir) => dir.clone(),
            None => path.parent().map_or_else(PathBuf::new, Path::to_path_buf),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating `{}`", dir.display()))?;
        let hashed = dir.join(name);
        std::fs::copy(path, &hashed).with_context(|| {
            format!("copying `{}` to `{}`", path.display(), hashed.display())
        })?;
        tracing::debug!(from = %path.display(), to = %hashed.display(), "content-hashed asset");
        Ok(hashed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_urls_are_detected() {
        assert!(is_token_url("%IMAGE:abcdefg%"));
        assert!(is_token_url("../i/%IMAGE:logo%"));
        assert!(!is_token_url("../i/logo.png"));
        assert!(!is_token_url("%IMAGE:%"));
    }

    #[test]
    fn test_hash_file_encodes_digest_in_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("sheet.png");
        std::fs::write(&source, b"not really a png").expect("write");

        let hasher = Sha256Hasher::new();
        let hashed = hasher.hash_file(&source).expect("hash");
        assert!(hashed.exists());
        assert_eq!(hashed.parent(), source.parent());
        let name = hashed.file_name().expect("name").to_string_lossy().into_owned();
        assert!(name.starts_with("sheet."));
        assert!(name.ends_with(".png"));
        // stem + 16 hex digits + extension
        assert_eq!(name.len(), "sheet.".len() + DIGEST_LEN + ".png".len());
    }

    #[test]
    fn test_hashing_is_stable_for_identical_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        std::fs::write(&a, b"same bytes").expect("write");
        std::fs::write(&b, b"same bytes").expect("write");

        let hasher = Sha256Hasher::new();
        let hashed_a = hasher.hash_file(&a).expect("hash a");
        let hashed_b = hasher.hash_file(&b).expect("hash b");
        let digest_of = |p: &Path| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .and_then(|n| n.split('.').nth(1).map(str::to_string))
        };
        assert_eq!(digest_of(&hashed_a), digest_of(&hashed_b));
    }

    #[test]
    fn test_destination_dir_is_used() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("sheet.png");
        std::fs::write(&source, b"bytes").expect("write");
        let dest = dir.path().join("hashed");

        let hasher = Sha256Hasher::with_destination(&dest);
        let hashed = hasher.hash_file(&source).expect("hash");
        assert_eq!(hashed.parent(), Some(dest.as_path()));
        assert!(hashed.exists());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let hasher = Sha256Hasher::new();
        let err = hasher
            .hash_file(Path::new("/nonexistent/sheet.png"))
            .expect_err("should fail");
        assert!(err.to_string().contains("sheet.png"));
    }
}
