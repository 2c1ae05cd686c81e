//! Structured diagnostics for the webpress pipeline.
//!
//! Every failure the pipeline can surface to a caller is expressed as a
//! [`Diagnostic`]: a severity, a message, and an optional file/line location.
//! Diagnostics are collected into a [`DiagnosticBag`], which deduplicates
//! repeated reports before they are surfaced (a single malformed construct
//! can otherwise produce many redundant records).
//!
//! Fatal errors ([`Severity::Error`]) prevent output-file creation for the
//! stylesheet being processed; warnings do not.

mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticBag, Severity};
