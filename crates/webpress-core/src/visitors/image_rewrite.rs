/*
 * visitors/image_rewrite.rs
 * Copyright (c) 2025 the webpress developers
 */

//! The image-assembly rewrite ("update") pass.
//!
//! Second half of the two-traversal sprite protocol. Each background
//! declaration is re-examined with the same classification as the scan; a
//! usage whose `(path, position)` key is found in a packed layout is
//! replaced by a single shorthand
//! `background: <x> <y> url(<sheet>) no-repeat;` (or the longhand triple
//! when configured). Declarations whose image was ignored or failed the
//! criteria find no placement and pass through unchanged, as do untouched
//! subtrees.

use std::convert::Infallible;
use std::path::{Path, PathBuf};

use webpress_css::ast::{BlockItem, Declaration, Expression, Page, Ruleset, Term};
use webpress_css::visitor::Visitor;
use webpress_sprites::{InputImage, PlacedImage, SpriteLayout};

use crate::background::{BackgroundScan, BackgroundUsage, is_background_property, scan_block};
use crate::hasher::is_token_url;
use crate::paths::{make_absolute_to, relative_to, to_url_text};

pub struct ImageAssemblyRewriteVisitor<'a> {
    css_path: PathBuf,
    css_dir: PathBuf,
    /// Packed layouts in bucket order (declared buckets first, default
    /// last); the first layout containing a key wins.
    layouts: &'a [SpriteLayout],
    output_unit: String,
    output_unit_factor: f64,
    emit_longhand: bool,
    replaced: usize,
}

impl<'a> ImageAssemblyRewriteVisitor<'a> {
    pub fn new(
        css_path: &Path,
        layouts: &'a [SpriteLayout],
        output_unit: impl Into<String>,
        output_unit_factor: f64,
        emit_longhand: bool,
    ) -> Self {
        Self {
            css_path: css_path.to_path_buf(),
            css_dir: css_path
                .parent()
                .map_or_else(PathBuf::new, Path::to_path_buf),
            layouts,
            output_unit: output_unit.into(),
            output_unit_factor,
            emit_longhand,
            replaced: 0,
        }
    }

    /// Number of declaration blocks rewritten so far.
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    fn lookup(&self, reference: &InputImage) -> Option<(&'a SpriteLayout, &'a PlacedImage)> {
        self.layouts
            .iter()
            .find_map(|layout| layout.placement(reference).map(|placed| (layout, placed)))
    }

    fn rewrite_items(&mut self, items: Vec<BlockItem>) -> Vec<BlockItem> {
        let BackgroundScan::Usage(usage) = scan_block(&items) else {
            return items;
        };
        if is_token_url(&usage.url) {
            return items;
        }
        let path = make_absolute_to(&self.css_path, &usage.url);
        let reference = InputImage::new(path, usage.position);
        let Some((layout, placed)) = self.lookup(&reference) else {
            return items;
        };
        self.replaced += 1;
        self.replace_background(items, layout, placed, &usage)
    }

    /// Drop every background-related declaration and splice the rewritten
    /// declaration(s) in at the position of the first one.
    fn replace_background(
        &self,
        items: Vec<BlockItem>,
        layout: &SpriteLayout,
        placed: &PlacedImage,
        usage: &BackgroundUsage,
    ) -> Vec<BlockItem> {
        let replacements = self.build_declarations(layout, placed, usage);
        let mut out = Vec::with_capacity(items.len());
        let mut spliced = false;
        for item in items {
            match item {
                BlockItem::Declaration(declaration)
                    if is_background_property(&declaration.property) =>
                {
                    if !spliced {
                        spliced = true;
                        out.extend(
                            replacements
                                .iter()
                                .cloned()
                                .map(BlockItem::Declaration),
                        );
                    }
                }
                other => out.push(other),
            }
        }
        out
    }

    fn build_declarations(
        &self,
        layout: &SpriteLayout,
        placed: &PlacedImage,
        usage: &BackgroundUsage,
    ) -> Vec<Declaration> {
        // CSS convention: the recorded Y offset is already negative; the
        // usage's own vertical offset shifts the window further down.
        let x_px = placed.x;
        let y_px = placed.y + usage.position.vertical_px();
        let x = self.offset_term(x_px);
        let y = self.offset_term(y_px);
        let url = Term::url(to_url_text(&relative_to(&self.css_dir, &layout.sheet_path)));
        let no_repeat = Term::ident("no-repeat");

        if self.emit_longhand {
            vec![
                self.declaration("background-image", vec![url], usage.line),
                self.declaration("background-position", vec![x, y], usage.line),
                self.declaration("background-repeat", vec![no_repeat], usage.line),
            ]
        } else {
            vec![self.declaration(
                "background",
                vec![x, y, url, no_repeat],
                usage.line,
            )]
        }
    }

    fn declaration(&self, property: &str, terms: Vec<Term>, line: u32) -> Declaration {
        Declaration {
            property: property.to_string(),
            value: Expression::from_terms(terms),
            important: false,
            line,
        }
    }

    /// An offset in the caller-specified output unit; zero prints bare.
    fn offset_term(&self, px: i32) -> Term {
        if px == 0 {
            Term::number(0.0)
        } else {
            Term::length(f64::from(px) * self.output_unit_factor, self.output_unit.clone())
        }
    }
}

impl Visitor for ImageAssemblyRewriteVisitor<'_> {
    type Error = Infallible;

    fn visit_ruleset(&mut self, mut node: Ruleset) -> Result<Ruleset, Self::Error> {
        node.items = self.rewrite_items(node.items);
        Ok(node)
    }

    fn visit_page(&mut self, mut node: Page) -> Result<Page, Self::Error> {
        node.items = self.rewrite_items(node.items);
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpress_css::{PrintMode, parse, print};
    use webpress_sprites::ImagePosition;

    const CSS_PATH: &str = "/site/css/app.css";

    fn layout_with(entries: Vec<(InputImage, PlacedImage)>) -> SpriteLayout {
        SpriteLayout::from_parts("/site/images/app.default.png", 16, 48, entries)
    }

    fn placed(y: i32) -> PlacedImage {
        PlacedImage {
            x: 0,
            y,
            width: 16,
            height: 16,
        }
    }

    fn rewrite(source: &str, layouts: &[SpriteLayout]) -> String {
        let sheet = parse(source).expect("parse");
        let mut visitor =
            ImageAssemblyRewriteVisitor::new(Path::new(CSS_PATH), layouts, "px", 1.0, false);
        let Ok(sheet) = visitor.visit_stylesheet(sheet);
        print(&sheet, PrintMode::Minified)
    }

    #[test]
    fn test_shorthand_replacement() {
        let layouts = vec![layout_with(vec![(
            InputImage::new("/site/i/x.gif", ImagePosition::Top),
            placed(0),
        )])];
        let out = rewrite("#a { background: url(../i/x.gif) no-repeat; }", &layouts);
        assert_eq!(
            out,
            "#a{background:0 0 url(../images/app.default.png) no-repeat;}"
        );
    }

    #[test]
    fn test_offsets_combine_placement_and_declared_position() {
        let layouts = vec![layout_with(vec![(
            InputImage::new("/site/i/x.gif", ImagePosition::Pixels(-20)),
            placed(-16),
        )])];
        let out = rewrite(
            "#a { background: url(../i/x.gif) no-repeat 0 -20px; }",
            &layouts,
        );
        assert!(out.contains("background:0 -36px url("));
    }

    #[test]
    fn test_longhand_pair_is_collapsed_to_shorthand() {
        let layouts = vec![layout_with(vec![(
            InputImage::new("/site/i/x.gif", ImagePosition::Top),
            placed(-16),
        )])];
        let out = rewrite(
            "#a { background-image: url(../i/x.gif); background-position: 0 0; color: red; }",
            &layouts,
        );
        assert_eq!(
            out,
            "#a{background:0 -16px url(../images/app.default.png) no-repeat;color:red;}"
        );
    }

    #[test]
    fn test_output_unit_and_factor_scale_offsets() {
        let layouts = vec![layout_with(vec![(
            InputImage::new("/site/i/x.gif", ImagePosition::Top),
            placed(-30),
        )])];
        let sheet = parse("#a { background: url(../i/x.gif) no-repeat; }").expect("parse");
        let mut visitor =
            ImageAssemblyRewriteVisitor::new(Path::new(CSS_PATH), &layouts, "rem", 0.1, false);
        let Ok(sheet) = visitor.visit_stylesheet(sheet);
        let out = print(&sheet, PrintMode::Minified);
        assert!(out.contains("background:0 -3rem url("));
    }

    #[test]
    fn test_longhand_emission() {
        let layouts = vec![layout_with(vec![(
            InputImage::new("/site/i/x.gif", ImagePosition::Top),
            placed(0),
        )])];
        let sheet = parse("#a { background: url(../i/x.gif) no-repeat; }").expect("parse");
        let mut visitor =
            ImageAssemblyRewriteVisitor::new(Path::new(CSS_PATH), &layouts, "px", 1.0, true);
        let Ok(sheet) = visitor.visit_stylesheet(sheet);
        let out = print(&sheet, PrintMode::Minified);
        assert_eq!(
            out,
            "#a{background-image:url(../images/app.default.png);background-position:0 0;background-repeat:no-repeat;}"
        );
    }

    #[test]
    fn test_unmatched_usage_passes_through() {
        let layouts = vec![layout_with(vec![])];
        let source = "#a { background: url(../i/unknown.gif) no-repeat; }";
        let out = rewrite(source, &layouts);
        assert_eq!(out, "#a{background:url(../i/unknown.gif) no-repeat;}");
    }

    #[test]
    fn test_failed_criteria_block_passes_through() {
        let layouts = vec![layout_with(vec![])];
        let source = "#a { background-image: url(../i/x.gif); }";
        let out = rewrite(source, &layouts);
        assert_eq!(out, "#a{background-image:url(../i/x.gif);}");
    }

    #[test]
    fn test_first_layout_wins_for_multi_bucket_images() {
        let icons = SpriteLayout::from_parts(
            "/site/images/app.icons.png",
            16,
            16,
            vec![(
                InputImage::new("/site/i/x.gif", ImagePosition::Top),
                placed(0),
            )],
        );
        let buttons = SpriteLayout::from_parts(
            "/site/images/app.buttons.png",
            16,
            32,
            vec![(
                InputImage::new("/site/i/x.gif", ImagePosition::Top),
                placed(-16),
            )],
        );
        let out = rewrite(
            "#a { background: url(../i/x.gif) no-repeat; }",
            &[icons, buttons],
        );
        assert!(out.contains("app.icons.png"));
        assert!(!out.contains("app.buttons.png"));
    }
}
