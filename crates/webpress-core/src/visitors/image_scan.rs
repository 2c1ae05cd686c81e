/*
 * visitors/image_scan.rs
 * Copyright (c) 2025 the webpress developers
 */

//! The image-assembly scan pass.
//!
//! First half of the two-traversal sprite protocol: walk the tree in
//! document order, classify every background declaration, and group the
//! qualifying image references into buckets for the packer. The visitor
//! owns all scan state (assembled references, criteria-failed set, analysis
//! log), so concurrent pipelines over different stylesheets stay isolated.
//!
//! Consistency contract: an absolute image path must never end up both
//! sprite-eligible and criteria-failed within one scan. Different rules
//! giving the same asset incompatible spriting behavior cannot be resolved
//! automatically without silently corrupting sprite geometry, so the scan
//! aborts with [`ScanError::ConflictingImageReference`], whichever side was
//! seen first.
//!
//! This pass accumulates state and must run exactly once per stylesheet per
//! pipeline invocation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use webpress_css::ast::{Page, Ruleset, StyleSheet};
use webpress_css::visitor::Visitor;
use webpress_sprites::{AnalysisLog, InputImage, ScanError, ScanInput, ScanOutput};

use crate::background::{BackgroundScan, scan_block};
use crate::hasher::is_token_url;
use crate::paths::make_absolute_to;

/// Everything one scan produces, handed immutably to the packer.
#[derive(Debug, Clone)]
pub struct ScanResults {
    /// Index 0 is the default bucket; one more per declared bucket, in
    /// declaration order.
    pub outputs: Vec<ScanOutput>,
    pub analysis_log: AnalysisLog,
}

pub struct ImageAssemblyScanVisitor {
    css_path: PathBuf,
    ignore: HashSet<PathBuf>,
    outputs: Vec<ScanOutput>,
    analysis_log: AnalysisLog,
    criteria_failed: HashSet<PathBuf>,
}

impl ImageAssemblyScanVisitor {
    /// Build a scan over `css_path`. Ignore-list entries and bucket image
    /// paths are resolved against the stylesheet, like any other url in it.
    pub fn new(css_path: &Path, ignore: &[PathBuf], buckets: &[ScanInput]) -> Self {
        let ignore = ignore
            .iter()
            .map(|path| make_absolute_to(css_path, &path.to_string_lossy()))
            .collect();
        let mut outputs = vec![ScanOutput::default_bucket()];
        for bucket in buckets {
            let images_in_bucket = bucket
                .images_in_bucket
                .iter()
                .map(|path| make_absolute_to(css_path, &path.to_string_lossy()))
                .collect();
            outputs.push(ScanOutput::for_bucket(ScanInput {
                bucket_name: bucket.bucket_name.clone(),
                images_in_bucket,
            }));
        }
        Self {
            css_path: css_path.to_path_buf(),
            ignore,
            outputs,
            analysis_log: AnalysisLog::new(),
            criteria_failed: HashSet::new(),
        }
    }

    /// Run the single traversal, consuming the visitor.
    ///
    /// The tree is returned unchanged; this pass only reads it.
    pub fn scan(mut self, sheet: StyleSheet) -> Result<(StyleSheet, ScanResults), ScanError> {
        let sheet = self.visit_stylesheet(sheet)?;
        tracing::debug!(
            css = %self.css_path.display(),
            buckets = self.outputs.len(),
            references = self
                .outputs
                .iter()
                .map(|o| o.image_references.len())
                .sum::<usize>(),
            criteria_failed = self.analysis_log.entries().len(),
            "image-assembly scan complete"
        );
        Ok((
            sheet,
            ScanResults {
                outputs: self.outputs,
                analysis_log: self.analysis_log,
            },
        ))
    }

    fn assembled_anywhere(&self, path: &Path) -> bool {
        self.outputs.iter().any(|output| output.references_path(path))
    }

    fn visit_background_block(
        &mut self,
        items: &[webpress_css::ast::BlockItem],
    ) -> Result<(), ScanError> {
        match scan_block(items) {
            BackgroundScan::None => Ok(()),
            BackgroundScan::Failed(candidates) => {
                for candidate in candidates {
                    if is_token_url(&candidate.url) {
                        continue;
                    }
                    let path = make_absolute_to(&self.css_path, &candidate.url);
                    if self.ignore.contains(&path) {
                        continue;
                    }
                    // A path already collected for assembly now failing the
                    // criteria is the unrecoverable inconsistency.
                    if self.assembled_anywhere(&path) {
                        return Err(ScanError::ConflictingImageReference { path });
                    }
                    self.criteria_failed.insert(path.clone());
                    self.analysis_log
                        .record(path, candidate.reason, Some(candidate.line));
                }
                Ok(())
            }
            BackgroundScan::Usage(usage) => {
                // `%IMAGE:<name>%` placeholders are resolved by a later
                // substitution stage; never sprite them.
                if is_token_url(&usage.url) {
                    return Ok(());
                }
                let path = make_absolute_to(&self.css_path, &usage.url);
                if self.ignore.contains(&path) {
                    return Ok(());
                }
                if self.criteria_failed.contains(&path) {
                    return Err(ScanError::ConflictingImageReference { path });
                }
                self.add_image_reference(InputImage::new(path, usage.position));
                Ok(())
            }
        }
    }

    /// Place a qualifying reference: every declared bucket that claims the
    /// path receives it (buckets are not mutually exclusive), with duplicate
    /// `(path, position)` keys skipped as idempotent re-adds. Only when no
    /// declared bucket claims the path does it go to the default bucket.
    fn add_image_reference(&mut self, reference: InputImage) {
        let mut placed = false;
        for output in self.outputs.iter_mut().skip(1) {
            let claims = output
                .scan_input
                .as_ref()
                .is_some_and(|input| input.claims(&reference.image_path));
            if claims {
                output.try_add(reference.clone());
                placed = true;
            }
        }
        if !placed {
            self.outputs[0].try_add(reference);
        }
    }
}

impl Visitor for ImageAssemblyScanVisitor {
    type Error = ScanError;

    fn visit_ruleset(&mut self, node: Ruleset) -> Result<Ruleset, Self::Error> {
        self.visit_background_block(&node.items)?;
        Ok(node)
    }

    fn visit_page(&mut self, node: Page) -> Result<Page, Self::Error> {
        self.visit_background_block(&node.items)?;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpress_css::parse;
    use webpress_sprites::ImagePosition;

    const CSS_PATH: &str = "/site/css/app.css";

    fn scan_with(
        source: &str,
        ignore: &[&str],
        buckets: &[(&str, &[&str])],
    ) -> Result<ScanResults, ScanError> {
        let sheet = parse(source).expect("parse");
        let ignore: Vec<PathBuf> = ignore.iter().map(|path| PathBuf::from(*path)).collect();
        let buckets: Vec<ScanInput> = buckets
            .iter()
            .map(|(name, images)| {
                ScanInput::new(*name, images.iter().map(|image| PathBuf::from(*image)))
            })
            .collect();
        let visitor = ImageAssemblyScanVisitor::new(Path::new(CSS_PATH), &ignore, &buckets);
        visitor.scan(sheet).map(|(_, results)| results)
    }

    fn scan(source: &str) -> ScanResults {
        scan_with(source, &[], &[]).expect("scan")
    }

    #[test]
    fn test_urls_resolve_relative_to_stylesheet() {
        let results = scan("#a { background: url(../i/x.gif) no-repeat; }");
        assert_eq!(
            results.outputs[0].image_references,
            vec![InputImage::new("/site/i/x.gif", ImagePosition::Top)]
        );
    }

    #[test]
    fn test_idempotent_bucket_insertion() {
        let results = scan(
            "#a { background: url(x.gif) no-repeat; }\n\
             #b { background: url(x.gif) no-repeat; }",
        );
        assert_eq!(results.outputs[0].image_references.len(), 1);
    }

    #[test]
    fn test_distinct_positions_are_distinct_entries() {
        let results = scan(
            "#a { background: url(x.gif) no-repeat; }\n\
             #b { background: url(x.gif) no-repeat 0 -32px; }",
        );
        assert_eq!(results.outputs[0].image_references.len(), 2);
    }

    #[test]
    fn test_criteria_failure_is_logged_not_fatal() {
        let results = scan("#a { background-image: url(x.gif); }");
        assert!(results.outputs[0].is_empty());
        assert_eq!(results.analysis_log.entries().len(), 1);
        assert_eq!(
            results.analysis_log.entries()[0].image_path,
            PathBuf::from("/site/css/x.gif")
        );
    }

    #[test]
    fn test_conflict_qualified_then_failed_is_fatal() {
        let err = scan_with(
            "#a { background: url(x.gif) no-repeat; }\n\
             #b { background-image: url(x.gif); }",
            &[],
            &[],
        )
        .expect_err("should conflict");
        assert!(err.to_string().contains("x.gif"));
    }

    #[test]
    fn test_conflict_failed_then_qualified_is_fatal() {
        let err = scan_with(
            "#a { background-image: url(x.gif); }\n\
             #b { background: url(x.gif) no-repeat; }",
            &[],
            &[],
        )
        .expect_err("should conflict");
        assert!(err.to_string().contains("x.gif"));
    }

    #[test]
    fn test_ignored_images_are_recorded_nowhere() {
        let results = scan_with(
            "#a { background: url(x.gif) no-repeat; }\n\
             #b { background-image: url(skip.gif); }",
            &["x.gif", "skip.gif"],
            &[],
        )
        .expect("scan");
        assert!(results.outputs[0].is_empty());
        assert!(results.analysis_log.is_empty());
    }

    #[test]
    fn test_token_urls_are_never_spriting_candidates() {
        let results = scan("#a { background: url(%IMAGE:abcdefg%) no-repeat; }");
        assert!(results.outputs[0].is_empty());
        assert!(results.analysis_log.is_empty());
    }

    #[test]
    fn test_declared_bucket_takes_precedence_over_default() {
        let results = scan_with(
            "#a { background: url(x.gif) no-repeat; }",
            &[],
            &[("icons", &["x.gif"])],
        )
        .expect("scan");
        assert!(results.outputs[0].is_empty());
        assert_eq!(results.outputs[1].bucket_name(), Some("icons"));
        assert_eq!(results.outputs[1].image_references.len(), 1);
    }

    #[test]
    fn test_image_lands_in_every_claiming_bucket() {
        // Buckets are not mutually exclusive by design: one image may be
        // produced into multiple sheets for different delivery contexts.
        let results = scan_with(
            "#a { background: url(x.gif) no-repeat; }",
            &[],
            &[("icons", &["x.gif"]), ("buttons", &["x.gif", "y.gif"])],
        )
        .expect("scan");
        assert!(results.outputs[0].is_empty());
        assert_eq!(results.outputs[1].image_references.len(), 1);
        assert_eq!(results.outputs[2].image_references.len(), 1);
    }

    #[test]
    fn test_unclaimed_image_falls_to_default_once() {
        let results = scan_with(
            "#a { background: url(other.gif) no-repeat; }\n\
             #b { background: url(other.gif) no-repeat; }",
            &[],
            &[("icons", &["x.gif"])],
        )
        .expect("scan");
        assert_eq!(results.outputs[0].image_references.len(), 1);
        assert!(results.outputs[1].is_empty());
    }

    #[test]
    fn test_rulesets_inside_media_are_scanned() {
        let results = scan("@media screen { #a { background: url(x.gif) no-repeat; } }");
        assert_eq!(results.outputs[0].image_references.len(), 1);
    }

    #[test]
    fn test_page_rules_are_scanned() {
        let results = scan("@page { background: url(x.gif) no-repeat; }");
        assert_eq!(results.outputs[0].image_references.len(), 1);
    }

    #[test]
    fn test_non_background_blocks_are_skipped_silently() {
        let results = scan("#a { color: red; } #b { margin: 0; }");
        assert!(results.outputs[0].is_empty());
        assert!(results.analysis_log.is_empty());
    }
}
