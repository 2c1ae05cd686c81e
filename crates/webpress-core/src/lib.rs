/*
 * lib.rs
 * Copyright (c) 2025 the webpress developers
 *
 * Stylesheet processing pipeline.
 */

//! Core pipeline of webpress: policy validation, image-sprite assembly and
//! stylesheet rewriting.
//!
//! The entry point is [`pipeline::CssPipeline`], which sequences
//! parse -> policy visitors -> scan -> pack -> rewrite -> print over a
//! single stylesheet and reports every problem through one diagnostics
//! channel. The individual passes live in [`visitors`] and are usable on
//! their own against a [`webpress_css::StyleSheet`].
//!
//! Command-line handling, configuration files, directory enumeration and
//! the SASS/LESS front end are collaborators of this crate, not part of it.

pub mod background;
pub mod error;
pub mod hasher;
pub mod measure;
pub mod paths;
pub mod pipeline;
pub mod visitors;

pub use error::{PipelineError, Result};
pub use hasher::{ImageHasher, Sha256Hasher};
pub use measure::Measure;
pub use pipeline::{BucketConfig, CssPipeline, PipelineOptions, PipelineOutput, PipelineStage};
