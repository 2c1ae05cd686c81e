/*
 * packer.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Vertical-strip sprite packing.
//!
//! One sheet is produced per scan-output bucket. Images are placed in
//! first-referenced order, left-aligned, each below the previous one plus
//! the configured padding. Recorded offsets follow the CSS
//! `background-position` convention: X is always 0, Y is the negated
//! cumulative height preceding the image.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

use crate::model::{InputImage, ScanOutput};

/// Errors while packing one bucket.
///
/// Packing failures are isolated per bucket: the caller reports the error
/// for the affected bucket and continues with the others.
#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to read or decode image `{}`", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write sprite sheet `{}`", .path.display())]
    SheetWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Where one scan entry landed in its sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedImage {
    /// CSS X offset; always 0 in a vertical strip.
    pub x: i32,
    /// CSS Y offset: negated cumulative height preceding the image.
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// The computed layout of one sprite sheet.
#[derive(Debug, Clone, Default)]
pub struct SpriteLayout {
    /// Path the sheet was written to. Callers that content-hash the sheet
    /// afterwards update this to the hashed path before rewriting CSS.
    pub sheet_path: PathBuf,
    pub width: u32,
    pub height: u32,
    placements: HashMap<InputImage, PlacedImage>,
    order: Vec<InputImage>,
}

impl SpriteLayout {
    /// Assemble a layout from precomputed placements, in entry order. The
    /// packer is the normal producer; this exists for callers that replay a
    /// recorded layout (and for tests).
    pub fn from_parts(
        sheet_path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        entries: Vec<(InputImage, PlacedImage)>,
    ) -> Self {
        let order = entries.iter().map(|(reference, _)| reference.clone()).collect();
        let placements = entries.into_iter().collect();
        Self {
            sheet_path: sheet_path.into(),
            width,
            height,
            placements,
            order,
        }
    }

    /// Look up the placement for a scan entry.
    pub fn placement(&self, reference: &InputImage) -> Option<&PlacedImage> {
        self.placements.get(reference)
    }

    /// Placements in first-referenced order.
    pub fn entries(&self) -> impl Iterator<Item = (&InputImage, &PlacedImage)> {
        self.order
            .iter()
            .filter_map(|reference| Some((reference, self.placements.get(reference)?)))
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Pack one bucket into a sprite sheet written at `sheet_path`.
///
/// An empty bucket yields an empty layout and no file. Reading or decoding
/// failure of any referenced image aborts this bucket with an error naming
/// the offending path.
pub fn pack(
    scan_output: &ScanOutput,
    padding_px: u32,
    sheet_path: &Path,
) -> Result<SpriteLayout, SpriteError> {
    if scan_output.is_empty() {
        return Ok(SpriteLayout::default());
    }

    // Decode each distinct file once; an entry per (path, position) key may
    // reference the same file more than once.
    let mut decoded: HashMap<PathBuf, RgbaImage> = HashMap::new();
    for reference in &scan_output.image_references {
        if !decoded.contains_key(&reference.image_path) {
            let img = image::open(&reference.image_path)
                .map_err(|source| SpriteError::ImageRead {
                    path: reference.image_path.clone(),
                    source,
                })?
                .to_rgba8();
            decoded.insert(reference.image_path.clone(), img);
        }
    }

    let mut placements = HashMap::new();
    let mut order = Vec::new();
    let mut width = 0u32;
    let mut cursor = 0u32;
    let mut slots = Vec::new();
    for (index, reference) in scan_output.image_references.iter().enumerate() {
        let img = &decoded[&reference.image_path];
        if index > 0 {
            cursor += padding_px;
        }
        slots.push((reference.clone(), cursor));
        placements.insert(
            reference.clone(),
            PlacedImage {
                x: 0,
                y: -(cursor as i32),
                width: img.width(),
                height: img.height(),
            },
        );
        order.push(reference.clone());
        width = width.max(img.width());
        cursor += img.height();
    }
    let height = cursor;

    let mut sheet = RgbaImage::new(width, height);
    for (reference, top) in &slots {
        let img = &decoded[&reference.image_path];
        image::imageops::replace(&mut sheet, img, 0, i64::from(*top));
    }

    if let Some(parent) = sheet_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    sheet
        .save(sheet_path)
        .map_err(|source| SpriteError::SheetWrite {
            path: sheet_path.to_path_buf(),
            source,
        })?;

    tracing::debug!(
        sheet = %sheet_path.display(),
        images = order.len(),
        width,
        height,
        "packed sprite sheet"
    );

    Ok(SpriteLayout {
        sheet_path: sheet_path.to_path_buf(),
        width,
        height,
        placements,
        order,
    })
}
