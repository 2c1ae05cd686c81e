/*
 * lib.rs
 * Copyright (c) 2025 the webpress developers
 *
 * Image-assembly data model and sprite packing.
 */

//! Sprite assembly for the webpress pipeline.
//!
//! The scan pass (in `webpress-core`) discovers background-image usage and
//! groups it into buckets described by the types in [`model`]. This crate
//! then turns each bucket into a sprite sheet:
//!
//! - [`model`] - scan inputs/outputs, the resolved image position, and the
//!   analysis log of declarations that failed the spriting criteria
//! - [`packer`] - the vertical-strip layout and sheet composition
//! - [`map`] - the machine-readable record of which source image landed at
//!   which offset in which sheet
//!
//! Packing is strictly vertical: one column, images in first-referenced
//! order, left-aligned. This keeps offset math exact and covers the common
//! icon-strip case; 2-D bin packing is out of scope.

pub mod map;
pub mod model;
pub mod packer;

pub use map::{AssemblyMap, InputRecord, SheetRecord};
pub use model::{
    AnalysisLog, FailureReason, ImagePosition, InputImage, ScanError, ScanInput, ScanOutput,
};
pub use packer::{PlacedImage, SpriteError, SpriteLayout, pack};
