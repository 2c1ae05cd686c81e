/*
 * pipeline.rs
 * Copyright (c) 2025 the webpress developers
 */

//! The stylesheet processing pipeline.
//!
//! One [`CssPipeline::execute`] call runs a single stylesheet through the
//! linear stage machine
//!
//! ```text
//! Parsed -> PolicyChecked -> Scanned -> Packed -> Rewritten -> Printed
//! ```
//!
//! with no backward transitions. A banned-selector violation moves to the
//! terminal `Rejected` state: no output text is produced and the violation
//! is reported through the diagnostics channel, by design, rather than as a
//! panic or a caller-visible `Err`. A stylesheet containing only hack
//! selectors gets a warning and runs to completion.
//!
//! The pipeline value owns all per-invocation state (tree, scan outputs,
//! layouts), so independent stylesheets may be processed on separate
//! pipelines in parallel. The optional hasher and measure capabilities are
//! shared and must be thread-safe.

use std::collections::HashSet;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use webpress_css::ast::StyleSheet;
use webpress_css::visitor::Visitor;
use webpress_css::{PrintMode, print};
use webpress_error_reporting::{Diagnostic, DiagnosticBag};
use webpress_sprites::{AssemblyMap, ScanInput, SheetRecord, SpriteLayout, pack};

use crate::error::PipelineError;
use crate::hasher::ImageHasher;
use crate::measure::Measure;
use crate::visitors::{
    ExcludePropertiesVisitor, ImageAssemblyRewriteVisitor, ImageAssemblyScanVisitor,
    LowercaseValidationVisitor, SelectorPolicyVisitor,
};

/// A named sprite bucket: images that belong together regardless of where
/// they are referenced. Paths may be relative to the stylesheet.
#[derive(Debug, Clone)]
pub struct BucketConfig {
    pub name: String,
    pub images: Vec<PathBuf>,
}

/// Configuration for one pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Selectors that fail the build (terminal `Rejected`, no output).
    pub banned_selectors: HashSet<String>,
    /// Selectors that are flagged with a warning but allowed through.
    pub hack_selectors: HashSet<String>,
    /// Property names stripped from the output.
    pub excluded_properties: HashSet<String>,
    /// Warn on uppercase selectors and property names.
    pub validate_lowercase: bool,

    /// Run the scan/pack/rewrite sprite protocol.
    pub assemble_background_images: bool,
    /// Absolute or stylesheet-relative image paths never to sprite.
    pub image_references_to_ignore: Vec<PathBuf>,
    /// Declared buckets, in precedence order.
    pub image_buckets: Vec<BucketConfig>,
    /// Vertical padding between packed images, in pixels.
    pub sprite_padding_px: u32,
    /// Directory receiving sprite sheets and the assembly map; defaults to
    /// a `sprites` directory next to the stylesheet.
    pub images_output_dir: Option<PathBuf>,

    /// Unit used for rewritten background offsets (e.g. `px`, `rem`).
    pub output_unit: String,
    /// Factor applied to pixel offsets before emission (e.g. 0.1 for rem
    /// with a 10px root).
    pub output_unit_factor: f64,
    /// Emit the longhand background triple instead of the shorthand.
    pub emit_longhand_background: bool,

    pub print_mode: PrintMode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            banned_selectors: HashSet::new(),
            hack_selectors: HashSet::new(),
            excluded_properties: HashSet::new(),
            validate_lowercase: false,
            assemble_background_images: false,
            image_references_to_ignore: Vec::new(),
            image_buckets: Vec::new(),
            sprite_padding_px: 0,
            images_output_dir: None,
            output_unit: "px".to_string(),
            output_unit_factor: 1.0,
            emit_longhand_background: false,
            print_mode: PrintMode::Minified,
        }
    }
}

/// How far a pipeline run progressed. Linear; `Rejected` and `ParseFailed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    ParseFailed,
    Parsed,
    PolicyChecked,
    /// A banned selector was found; no output is produced.
    Rejected,
    Scanned,
    Packed,
    Rewritten,
    Printed,
}

/// Everything one run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    /// The rewritten stylesheet text; `None` when the run failed or was
    /// rejected.
    pub css_text: Option<String>,
    pub stage: PipelineStage,
    /// Deduplicated diagnostics, fatal and otherwise.
    pub diagnostics: DiagnosticBag,
    /// Per-sheet assembly records (empty when not assembling).
    pub assembly_map: AssemblyMap,
    /// Final paths of produced sprite sheets (hashed when a hasher ran).
    pub sheets: Vec<PathBuf>,
}

/// The orchestrator. See the module docs.
pub struct CssPipeline {
    options: PipelineOptions,
    image_hasher: Option<Arc<dyn ImageHasher>>,
    measure: Option<Arc<dyn Measure>>,
}

impl CssPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            image_hasher: None,
            measure: None,
        }
    }

    /// Content-hash produced sheets with `hasher` and reference the hashed
    /// paths in the rewritten stylesheet.
    pub fn with_image_hasher(mut self, hasher: Arc<dyn ImageHasher>) -> Self {
        self.image_hasher = Some(hasher);
        self
    }

    /// Report per-stage wall time to `measure`.
    pub fn with_measure(mut self, measure: Arc<dyn Measure>) -> Self {
        self.measure = Some(measure);
        self
    }

    /// Process one stylesheet.
    ///
    /// Never returns an error and never terminates the process: every
    /// failure is reported through [`PipelineOutput::diagnostics`], and
    /// fatal ones leave [`PipelineOutput::css_text`] empty.
    pub fn execute(&self, source: &str, css_path: &Path) -> PipelineOutput {
        let mut diagnostics = DiagnosticBag::new();

        let sheet = match self.timed("parse", || webpress_css::parse(source)) {
            Ok(sheet) => sheet,
            Err(parse_error) => {
                for error in parse_error.errors {
                    diagnostics.push(
                        Diagnostic::error(error.message)
                            .with_file(css_path)
                            .with_line(error.line),
                    );
                }
                return finish(None, PipelineStage::ParseFailed, diagnostics, AssemblyMap::new(), Vec::new());
            }
        };
        tracing::debug!(css = %css_path.display(), rules = sheet.rules.len(), "parsed");

        let (sheet, rejected) = self.timed("policy", || self.run_policy(sheet, css_path, &mut diagnostics));
        if rejected {
            tracing::debug!(css = %css_path.display(), "rejected by selector policy");
            return finish(None, PipelineStage::Rejected, diagnostics, AssemblyMap::new(), Vec::new());
        }

        let (sheet, assembly_map, sheets) = if self.options.assemble_background_images {
            match self.assemble(sheet, css_path, &mut diagnostics) {
                Ok(assembled) => assembled,
                Err(error) => {
                    diagnostics.push(Diagnostic::error(error.to_string()).with_file(css_path));
                    return finish(None, PipelineStage::PolicyChecked, diagnostics, AssemblyMap::new(), Vec::new());
                }
            }
        } else {
            (sheet, AssemblyMap::new(), Vec::new())
        };

        let css_text = self.timed("print", || print(&sheet, self.options.print_mode));
        tracing::debug!(css = %css_path.display(), bytes = css_text.len(), "printed");
        finish(
            Some(css_text),
            PipelineStage::Printed,
            diagnostics,
            assembly_map,
            sheets,
        )
    }

    /// Lowercase validation, property exclusion and selector policy.
    /// Returns the (possibly rewritten) tree and whether the stylesheet was
    /// rejected.
    fn run_policy(
        &self,
        sheet: StyleSheet,
        css_path: &Path,
        diagnostics: &mut DiagnosticBag,
    ) -> (StyleSheet, bool) {
        let mut sheet = sheet;

        if self.options.validate_lowercase {
            let mut lowercase = LowercaseValidationVisitor::new();
            sheet = into_ok(lowercase.visit_stylesheet(sheet));
            diagnostics.extend(
                lowercase
                    .take_diagnostics()
                    .into_iter()
                    .map(|d| d.with_file(css_path)),
            );
        }

        if !self.options.excluded_properties.is_empty() {
            let mut exclude =
                ExcludePropertiesVisitor::new(self.options.excluded_properties.iter().cloned());
            sheet = into_ok(exclude.visit_stylesheet(sheet));
            if exclude.removed() > 0 {
                tracing::debug!(removed = exclude.removed(), "excluded properties");
            }
        }

        let mut policy = SelectorPolicyVisitor::new(
            self.options.banned_selectors.clone(),
            self.options.hack_selectors.clone(),
        );
        sheet = into_ok(policy.visit_stylesheet(sheet));
        diagnostics.extend(
            policy
                .take_diagnostics()
                .into_iter()
                .map(|d| d.with_file(css_path)),
        );
        let rejected = policy.banned_found();
        (sheet, rejected)
    }

    /// The scan -> pack -> hash -> rewrite protocol.
    ///
    /// Scan inconsistencies abort the stylesheet (via `Err`); packing
    /// failures are isolated per bucket and reported as diagnostics, with
    /// the affected declarations left untouched by the rewrite.
    fn assemble(
        &self,
        sheet: StyleSheet,
        css_path: &Path,
        diagnostics: &mut DiagnosticBag,
    ) -> Result<(StyleSheet, AssemblyMap, Vec<PathBuf>), PipelineError> {
        let buckets: Vec<ScanInput> = self
            .options
            .image_buckets
            .iter()
            .map(|bucket| ScanInput::new(&bucket.name, bucket.images.iter().cloned()))
            .collect();
        let scanner = ImageAssemblyScanVisitor::new(
            css_path,
            &self.options.image_references_to_ignore,
            &buckets,
        );
        let (sheet, results) = self.timed("scan", || scanner.scan(sheet))?;

        let images_dir = match &self.options.images_output_dir {
            Some(dir) => dir.clone(),
            None => css_path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("sprites"),
        };
        std::fs::create_dir_all(&images_dir)?;
        let stem = css_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stylesheet".to_string());

        // Rewrite precedence follows bucket declaration order with the
        // default bucket last, so pack in that order too.
        let mut outputs = results.outputs;
        let default_output = outputs.remove(0);
        outputs.push(default_output);

        let mut layouts: Vec<SpriteLayout> = Vec::new();
        for output in &outputs {
            if output.is_empty() {
                continue;
            }
            let bucket = output.bucket_name().unwrap_or("default");
            let sheet_path = images_dir.join(format!("{}.{}.png", stem, bucket));
            match self.timed("pack", || {
                pack(output, self.options.sprite_padding_px, &sheet_path)
            }) {
                Ok(layout) => layouts.push(layout),
                Err(sprite_error) => {
                    // Partial-failure isolation: this bucket's declarations
                    // stay unrewritten, the rest of the run continues.
                    let error = PipelineError::from(sprite_error);
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "bucket `{}` left unassembled: {}",
                            bucket, error
                        ))
                        .with_file(css_path),
                    );
                }
            }
        }

        if let Some(hasher) = &self.image_hasher {
            for layout in &mut layouts {
                match self.timed("hash", || hasher.hash_file(&layout.sheet_path)) {
                    Ok(hashed) => layout.sheet_path = hashed,
                    Err(error) => diagnostics.push(
                        Diagnostic::warning(format!(
                            "failed to content-hash `{}`: {:#}",
                            layout.sheet_path.display(),
                            error
                        ))
                        .with_file(css_path),
                    ),
                }
            }
        }

        let mut assembly_map = AssemblyMap::new();
        for layout in &layouts {
            assembly_map.push_sheet(SheetRecord::from_layout(layout));
        }
        if !assembly_map.is_empty() {
            let map_path = images_dir.join(format!("{}.assembly.json", stem));
            if let Err(error) = assembly_map.write_to(&map_path) {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "failed to write assembly map `{}`: {}",
                        map_path.display(),
                        error
                    ))
                    .with_file(css_path),
                );
            }
        }

        let mut rewriter = ImageAssemblyRewriteVisitor::new(
            css_path,
            &layouts,
            self.options.output_unit.clone(),
            self.options.output_unit_factor,
            self.options.emit_longhand_background,
        );
        let sheet = self.timed("rewrite", || into_ok(rewriter.visit_stylesheet(sheet)));
        tracing::debug!(
            css = %css_path.display(),
            sheets = layouts.len(),
            rewritten = rewriter.replaced(),
            "image assembly complete"
        );

        let sheets = layouts.iter().map(|l| l.sheet_path.clone()).collect();
        Ok((sheet, assembly_map, sheets))
    }

    fn timed<T>(&self, stage: &str, f: impl FnOnce() -> T) -> T {
        match &self.measure {
            Some(measure) => {
                let start = Instant::now();
                let out = f();
                measure.record(stage, start.elapsed());
                out
            }
            None => f(),
        }
    }
}

fn finish(
    css_text: Option<String>,
    stage: PipelineStage,
    mut diagnostics: DiagnosticBag,
    assembly_map: AssemblyMap,
    sheets: Vec<PathBuf>,
) -> PipelineOutput {
    diagnostics.dedup();
    PipelineOutput {
        css_text,
        stage,
        diagnostics,
        assembly_map,
        sheets,
    }
}

fn into_ok<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
