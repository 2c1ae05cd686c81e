/*
 * background.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Background-declaration analysis shared by the scan and rewrite passes.
//!
//! A declaration block may express a background image exactly one way:
//! either the `background` shorthand (url + repeat + position) or the
//! longhand pair `background-image` + `background-position`. Both in one
//! block is invalid input. This module classifies a block into "no
//! background image", "well-formed usage" or "criteria failure(s)", without
//! resolving urls or touching any scan state; that stays with the callers.

use webpress_css::ast::{BlockItem, Declaration, Term};
use webpress_sprites::{FailureReason, ImagePosition};

/// A well-formed background-image usage found in a declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundUsage {
    /// The url as written in the stylesheet, unresolved.
    pub url: String,
    /// Resolved vertical-strip anchor.
    pub position: ImagePosition,
    /// Source line of the declaration carrying the url.
    pub line: u32,
}

/// A sprite candidate that failed the eligibility criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedCandidate {
    /// The url as written in the stylesheet, unresolved.
    pub url: String,
    pub reason: FailureReason,
    pub line: u32,
}

/// Classification of one declaration block.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundScan {
    /// The block declares no background image at all.
    None,
    Usage(BackgroundUsage),
    Failed(Vec<FailedCandidate>),
}

/// Properties folded into the rewritten declaration.
pub fn is_background_property(property: &str) -> bool {
    property.eq_ignore_ascii_case("background")
        || property.eq_ignore_ascii_case("background-image")
        || property.eq_ignore_ascii_case("background-position")
        || property.eq_ignore_ascii_case("background-repeat")
}

/// Classify a declaration block. See the module docs for the contract.
pub fn scan_block(items: &[BlockItem]) -> BackgroundScan {
    let declarations: Vec<&Declaration> = items
        .iter()
        .filter_map(|item| match item {
            BlockItem::Declaration(declaration) => Some(declaration),
            BlockItem::ImportantComment(_) => None,
        })
        .collect();

    let shorthand = declarations
        .iter()
        .copied()
        .find(|d| d.has_property("background") && has_url(d));
    let longhand_image = declarations
        .iter()
        .copied()
        .find(|d| d.has_property("background-image") && has_url(d));
    let longhand_position = declarations
        .iter()
        .copied()
        .find(|d| d.has_property("background-position"));

    match (shorthand, longhand_image) {
        (None, None) => BackgroundScan::None,
        (Some(short), Some(long)) => {
            // Both forms in one block: every referenced image fails.
            let mut failed = Vec::new();
            for declaration in [short, long] {
                for url in urls_of(declaration) {
                    failed.push(FailedCandidate {
                        url,
                        reason: FailureReason::ShorthandAndLonghand,
                        line: declaration.line,
                    });
                }
            }
            BackgroundScan::Failed(failed)
        }
        (Some(declaration), None) => {
            classify(declaration, position_components(declaration), declaration.line)
        }
        (None, Some(declaration)) => match longhand_position {
            None => BackgroundScan::Failed(vec![FailedCandidate {
                url: first_url(declaration),
                reason: FailureReason::MissingPosition,
                line: declaration.line,
            }]),
            Some(position) => {
                classify(declaration, position_components(position), declaration.line)
            }
        },
    }
}

/// Turn a url-bearing declaration plus position components into a usage or
/// a failure.
fn classify(
    declaration: &Declaration,
    components: Vec<PositionComponent>,
    line: u32,
) -> BackgroundScan {
    let urls = urls_of(declaration);
    if urls.len() > 1 {
        return BackgroundScan::Failed(
            urls.into_iter()
                .map(|url| FailedCandidate {
                    url,
                    reason: FailureReason::MultipleUrls,
                    line,
                })
                .collect(),
        );
    }
    let url = first_url(declaration);

    match resolve_position(&components) {
        Ok(position) => BackgroundScan::Usage(BackgroundUsage {
            url,
            position,
            line,
        }),
        Err(reason) => BackgroundScan::Failed(vec![FailedCandidate { url, reason, line }]),
    }
}

fn has_url(declaration: &Declaration) -> bool {
    declaration
        .value
        .terms()
        .any(|t| matches!(t.term, Term::Url(_)))
}

fn urls_of(declaration: &Declaration) -> Vec<String> {
    declaration
        .value
        .terms()
        .filter_map(|t| t.term.as_url().map(str::to_string))
        .collect()
}

fn first_url(declaration: &Declaration) -> String {
    urls_of(declaration).into_iter().next().unwrap_or_default()
}

/// A raw `background-position` component before unit-aware resolution.
#[derive(Debug, Clone, PartialEq)]
enum PositionComponent {
    Keyword(String),
    Length { value: f64, unit: Option<String> },
}

/// Extract position components from a declaration's value, ignoring the
/// url, color and repeat/attachment keywords a shorthand may carry.
fn position_components(declaration: &Declaration) -> Vec<PositionComponent> {
    let mut components = Vec::new();
    for term in declaration.value.terms() {
        match &term.term {
            Term::Number { value, unit } => components.push(PositionComponent::Length {
                value: *value,
                unit: unit.clone(),
            }),
            Term::Ident(word) if is_position_keyword(word) => {
                components.push(PositionComponent::Keyword(word.to_ascii_lowercase()));
            }
            _ => {}
        }
    }
    components
}

fn is_position_keyword(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "left" | "right" | "center" | "top" | "bottom"
    )
}

/// Unit-aware resolution of the component pair into a vertical-strip
/// anchor.
///
/// Horizontal stacking is unsupported: the horizontal component must
/// resolve to left/zero. The vertical component must be `top` or a pixel
/// length (zero is accepted in any unit); everything else fails the
/// criteria rather than erroring, since an ineligible declaration simply
/// stays out of the sprite.
fn resolve_position(components: &[PositionComponent]) -> Result<ImagePosition, FailureReason> {
    let mut horizontal: Option<&PositionComponent> = None;
    let mut vertical: Option<&PositionComponent> = None;
    for component in components {
        match component {
            PositionComponent::Keyword(word) => match word.as_str() {
                "left" | "right" => {
                    horizontal.get_or_insert(component);
                }
                "top" | "bottom" => {
                    vertical.get_or_insert(component);
                }
                _ => {
                    // `center` fills whichever axis is still open.
                    if horizontal.is_none() {
                        horizontal = Some(component);
                    } else {
                        vertical.get_or_insert(component);
                    }
                }
            },
            PositionComponent::Length { .. } => {
                if horizontal.is_none() {
                    horizontal = Some(component);
                } else {
                    vertical.get_or_insert(component);
                }
            }
        }
    }

    match horizontal {
        None => {}
        Some(PositionComponent::Keyword(word)) if word == "left" => {}
        Some(PositionComponent::Keyword(_)) => {
            return Err(FailureReason::HorizontalNotLeftAligned);
        }
        Some(PositionComponent::Length { value, .. }) => {
            if *value != 0.0 {
                return Err(FailureReason::HorizontalNotLeftAligned);
            }
        }
    }

    match vertical {
        None => Ok(ImagePosition::Top),
        Some(PositionComponent::Keyword(word)) if word == "top" => Ok(ImagePosition::Top),
        Some(PositionComponent::Keyword(word)) => Err(FailureReason::UnsupportedKeyword {
            keyword: word.clone(),
        }),
        Some(PositionComponent::Length { value, unit }) => {
            if *value == 0.0 {
                return Ok(ImagePosition::Top);
            }
            match unit.as_deref() {
                Some("px") => Ok(ImagePosition::from_pixels(value.round() as i32)),
                Some(other) => Err(FailureReason::UnsupportedUnit {
                    unit: other.to_string(),
                }),
                None => Err(FailureReason::UnsupportedUnit {
                    unit: String::new(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webpress_css::ast::{Rule, StyleSheet};
    use webpress_css::parse;

    fn block_of(source: &str) -> Vec<BlockItem> {
        let sheet: StyleSheet = parse(source).expect("parse");
        match sheet.rules.into_iter().next() {
            Some(Rule::Ruleset(ruleset)) => ruleset.items,
            other => panic!("expected ruleset, got {:?}", other),
        }
    }

    #[test]
    fn test_block_without_background_is_none() {
        let items = block_of("p { color: red; margin: 0; }");
        assert_eq!(scan_block(&items), BackgroundScan::None);
    }

    #[test]
    fn test_shorthand_without_position_defaults_to_top() {
        let items = block_of("p { background: url(a.gif) no-repeat; }");
        let BackgroundScan::Usage(usage) = scan_block(&items) else {
            panic!("expected usage");
        };
        assert_eq!(usage.url, "a.gif");
        assert_eq!(usage.position, ImagePosition::Top);
    }

    #[test]
    fn test_shorthand_with_vertical_offset() {
        let items = block_of("p { background: url(a.gif) no-repeat 0 -200px; }");
        let BackgroundScan::Usage(usage) = scan_block(&items) else {
            panic!("expected usage");
        };
        assert_eq!(usage.position, ImagePosition::Pixels(-200));
    }

    #[test]
    fn test_left_top_keywords_qualify() {
        let items = block_of("p { background: url(a.gif) left top no-repeat; }");
        let BackgroundScan::Usage(usage) = scan_block(&items) else {
            panic!("expected usage");
        };
        assert_eq!(usage.position, ImagePosition::Top);
    }

    #[test]
    fn test_nonzero_horizontal_fails() {
        let items = block_of("p { background: url(a.gif) no-repeat -10px -200px; }");
        let BackgroundScan::Failed(failed) = scan_block(&items) else {
            panic!("expected failure");
        };
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].reason, FailureReason::HorizontalNotLeftAligned);
    }

    #[test]
    fn test_vertical_em_fails_with_unit() {
        let items = block_of("p { background: url(a.gif) 0 -2em; }");
        let BackgroundScan::Failed(failed) = scan_block(&items) else {
            panic!("expected failure");
        };
        assert_eq!(
            failed[0].reason,
            FailureReason::UnsupportedUnit {
                unit: "em".to_string()
            }
        );
    }

    #[test]
    fn test_zero_vertical_any_unit_is_top() {
        let items = block_of("p { background: url(a.gif) 0 0%; }");
        let BackgroundScan::Usage(usage) = scan_block(&items) else {
            panic!("expected usage");
        };
        assert_eq!(usage.position, ImagePosition::Top);
    }

    #[test]
    fn test_longhand_pair_qualifies() {
        let items = block_of(
            "p { background-repeat: no-repeat; background-position: 0 -16px; background-image: url(a.gif); }",
        );
        let BackgroundScan::Usage(usage) = scan_block(&items) else {
            panic!("expected usage");
        };
        assert_eq!(usage.url, "a.gif");
        assert_eq!(usage.position, ImagePosition::Pixels(-16));
    }

    #[test]
    fn test_longhand_image_without_position_fails() {
        let items = block_of("p { background-image: url(a.gif); }");
        let BackgroundScan::Failed(failed) = scan_block(&items) else {
            panic!("expected failure");
        };
        assert_eq!(failed[0].reason, FailureReason::MissingPosition);
    }

    #[test]
    fn test_shorthand_and_longhand_both_fail() {
        let items =
            block_of("p { background: url(a.gif) no-repeat; background-image: url(b.gif); }");
        let BackgroundScan::Failed(failed) = scan_block(&items) else {
            panic!("expected failure");
        };
        let urls: Vec<&str> = failed.iter().map(|f| f.url.as_str()).collect();
        assert_eq!(urls, vec!["a.gif", "b.gif"]);
        assert!(failed
            .iter()
            .all(|f| f.reason == FailureReason::ShorthandAndLonghand));
    }

    #[test]
    fn test_layered_backgrounds_fail() {
        let items = block_of("p { background: url(a.gif), url(b.gif); }");
        let BackgroundScan::Failed(failed) = scan_block(&items) else {
            panic!("expected failure");
        };
        assert_eq!(failed.len(), 2);
        assert!(failed.iter().all(|f| f.reason == FailureReason::MultipleUrls));
    }

    #[test]
    fn test_color_only_shorthand_is_none() {
        let items = block_of("p { background: #fff; }");
        assert_eq!(scan_block(&items), BackgroundScan::None);
    }
}
