/*
 * error.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Error types for the pipeline.

use thiserror::Error;

/// Internal stage failures.
///
/// These never escape [`crate::pipeline::CssPipeline::execute`]: the
/// orchestrator converts them into diagnostics so the caller receives one
/// uniform error channel and the host process is never terminated from
/// here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] webpress_sprites::ScanError),

    #[error(transparent)]
    Sprite(#[from] webpress_sprites::SpriteError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
