/*
 * model.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Data model for the image-assembly scan.
//!
//! A scan over one stylesheet produces a list of [`ScanOutput`]s: index 0 is
//! always the default bucket (no [`ScanInput`]), followed by one output per
//! caller-declared bucket in declaration order. Entries are unique by
//! `(image_path, position)` and kept in first-referenced (document) order,
//! which the packer relies on.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolved anchor of a background usage within a vertical strip.
///
/// Horizontal stacking is not supported, so the horizontal component of a
/// `background-position` must resolve to left/zero for the usage to qualify;
/// only the vertical component is modeled here. A zero length in any unit
/// and the keyword `top` both normalize to [`ImagePosition::Top`], so `0`,
/// `0px` and `top` dedupe to one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImagePosition {
    Top,
    /// Vertical offset in pixels; negative moves the visible window down
    /// the strip.
    Pixels(i32),
}

impl ImagePosition {
    /// Build a position from a pixel offset, normalizing zero to `Top`.
    pub fn from_pixels(offset: i32) -> Self {
        if offset == 0 {
            ImagePosition::Top
        } else {
            ImagePosition::Pixels(offset)
        }
    }

    /// The vertical offset in pixels.
    pub fn vertical_px(self) -> i32 {
        match self {
            ImagePosition::Top => 0,
            ImagePosition::Pixels(offset) => offset,
        }
    }
}

/// One sprite-candidate usage discovered by the scan.
///
/// Uniqueness key is the pair of both fields: the same image referenced with
/// two different anchors is two entries (and two slots in the sheet).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputImage {
    /// Absolute path of the referenced image.
    pub image_path: PathBuf,
    pub position: ImagePosition,
}

impl InputImage {
    pub fn new(image_path: impl Into<PathBuf>, position: ImagePosition) -> Self {
        Self {
            image_path: image_path.into(),
            position,
        }
    }
}

/// A caller-declared bucket: certain images belong together regardless of
/// where they are referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInput {
    pub bucket_name: String,
    /// Absolute image paths claimed by this bucket.
    pub images_in_bucket: HashSet<PathBuf>,
}

impl ScanInput {
    pub fn new(
        bucket_name: impl Into<String>,
        images_in_bucket: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            images_in_bucket: images_in_bucket.into_iter().collect(),
        }
    }

    pub fn claims(&self, path: &Path) -> bool {
        self.images_in_bucket.contains(path)
    }
}

/// The images collected for one bucket during a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutput {
    /// `None` exactly for the default bucket.
    pub scan_input: Option<ScanInput>,
    /// Unique by `(path, position)`, in first-referenced order.
    pub image_references: Vec<InputImage>,
}

impl ScanOutput {
    /// The default bucket for images no declared bucket claims.
    pub fn default_bucket() -> Self {
        Self {
            scan_input: None,
            image_references: Vec::new(),
        }
    }

    pub fn for_bucket(scan_input: ScanInput) -> Self {
        Self {
            scan_input: Some(scan_input),
            image_references: Vec::new(),
        }
    }

    /// Bucket name, or `None` for the default bucket.
    pub fn bucket_name(&self) -> Option<&str> {
        self.scan_input.as_ref().map(|input| input.bucket_name.as_str())
    }

    /// Whether any entry references `path`, at any position.
    pub fn references_path(&self, path: &Path) -> bool {
        self.image_references
            .iter()
            .any(|reference| reference.image_path == path)
    }

    /// Add an entry unless its `(path, position)` key is already present.
    /// Returns whether the entry was added.
    pub fn try_add(&mut self, reference: InputImage) -> bool {
        if self.image_references.contains(&reference) {
            return false;
        }
        self.image_references.push(reference);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.image_references.is_empty()
    }
}

/// Why a background declaration did not qualify for spriting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Both the `background` shorthand and a longhand background property
    /// appear in the same declaration block.
    ShorthandAndLonghand,
    /// `background-image` without a `background-position` in the block.
    MissingPosition,
    /// More than one `url()` in the declaration (layered backgrounds).
    MultipleUrls,
    /// The horizontal position component is not left/zero.
    HorizontalNotLeftAligned,
    /// A nonzero position length in a unit the packer cannot resolve.
    UnsupportedUnit { unit: String },
    /// An unsupported position keyword (e.g. `bottom`).
    UnsupportedKeyword { keyword: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::ShorthandAndLonghand => write!(
                f,
                "block declares both the `background` shorthand and longhand background properties"
            ),
            FailureReason::MissingPosition => {
                write!(f, "`background-image` without a `background-position`")
            }
            FailureReason::MultipleUrls => {
                write!(f, "declaration references more than one image")
            }
            FailureReason::HorizontalNotLeftAligned => {
                write!(f, "horizontal position is not left-aligned")
            }
            FailureReason::UnsupportedUnit { unit } => {
                write!(f, "position length in unsupported unit `{}`", unit)
            }
            FailureReason::UnsupportedKeyword { keyword } => {
                write!(f, "unsupported position keyword `{}`", keyword)
            }
        }
    }
}

/// One analysis-log record: a sprite candidate that failed the criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub image_path: PathBuf,
    pub reason: FailureReason,
    /// Source line of the offending declaration, when known.
    pub line: Option<u32>,
}

/// Append-only record of declarations that looked like sprite candidates
/// but failed eligibility, kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisLog {
    entries: Vec<AnalysisEntry>,
}

impl AnalysisLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        image_path: impl Into<PathBuf>,
        reason: FailureReason,
        line: Option<u32>,
    ) {
        self.entries.push(AnalysisEntry {
            image_path: image_path.into(),
            reason,
            line,
        });
    }

    pub fn entries(&self) -> &[AnalysisEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fatal inconsistency discovered while accumulating scan state.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The same absolute image path was found both sprite-eligible and
    /// criteria-failed across rules. Picking either interpretation would
    /// silently corrupt downstream sprite geometry, so the scan aborts.
    #[error(
        "image `{}` is referenced by rules with conflicting spriting behavior",
        .path.display()
    )]
    ConflictingImageReference { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_normalizes_zero_to_top() {
        assert_eq!(ImagePosition::from_pixels(0), ImagePosition::Top);
        assert_eq!(ImagePosition::from_pixels(-200), ImagePosition::Pixels(-200));
        assert_eq!(ImagePosition::Top.vertical_px(), 0);
        assert_eq!(ImagePosition::Pixels(-200).vertical_px(), -200);
    }

    #[test]
    fn test_try_add_is_idempotent_by_key() {
        let mut output = ScanOutput::default_bucket();
        let entry = InputImage::new("/img/a.gif", ImagePosition::Top);
        assert!(output.try_add(entry.clone()));
        assert!(!output.try_add(entry));
        assert_eq!(output.image_references.len(), 1);

        // A different position for the same path is a distinct entry.
        assert!(output.try_add(InputImage::new(
            "/img/a.gif",
            ImagePosition::Pixels(-10)
        )));
        assert_eq!(output.image_references.len(), 2);
        assert!(output.references_path(Path::new("/img/a.gif")));
    }

    #[test]
    fn test_bucket_claims() {
        let input = ScanInput::new("icons", vec![PathBuf::from("/img/a.gif")]);
        assert!(input.claims(Path::new("/img/a.gif")));
        assert!(!input.claims(Path::new("/img/b.gif")));
        let output = ScanOutput::for_bucket(input);
        assert_eq!(output.bucket_name(), Some("icons"));
        assert!(ScanOutput::default_bucket().bucket_name().is_none());
    }

    #[test]
    fn test_analysis_log_records_in_order() {
        let mut log = AnalysisLog::new();
        log.record("/img/a.gif", FailureReason::MissingPosition, Some(4));
        log.record(
            "/img/b.gif",
            FailureReason::UnsupportedUnit {
                unit: "em".to_string(),
            },
            None,
        );
        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[0].image_path, PathBuf::from("/img/a.gif"));
        assert!(log.entries()[1].reason.to_string().contains("`em`"));
    }

    #[test]
    fn test_scan_error_names_the_path() {
        let err = ScanError::ConflictingImageReference {
            path: PathBuf::from("/img/a.gif"),
        };
        assert!(err.to_string().contains("/img/a.gif"));
    }
}
