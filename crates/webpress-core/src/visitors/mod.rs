/*
 * visitors/mod.rs
 * Copyright (c) 2025 the webpress developers
 */

//! The pipeline's stylesheet passes.
//!
//! Policy passes (`selector_policy`, `exclude_properties`, `lowercase`) are
//! idempotent and collect diagnostics. The image-assembly passes form the
//! two-traversal sprite protocol: `image_scan` discovers and classifies
//! background-image usage (run exactly once per stylesheet), and
//! `image_rewrite` substitutes packed coordinates after assembly.

pub mod exclude_properties;
pub mod image_rewrite;
pub mod image_scan;
pub mod lowercase;
pub mod selector_policy;

pub use exclude_properties::ExcludePropertiesVisitor;
pub use image_rewrite::ImageAssemblyRewriteVisitor;
pub use image_scan::{ImageAssemblyScanVisitor, ScanResults};
pub use lowercase::LowercaseValidationVisitor;
pub use selector_policy::SelectorPolicyVisitor;
