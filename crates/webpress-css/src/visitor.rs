/*
 * visitor.rs
 * Copyright (c) 2025 the webpress developers
 */

//! The visitor protocol for stylesheet passes.
//!
//! A [`Visitor`] has one method per node variant. Each method takes the node
//! by value and returns the node to substitute — the original by default.
//! The free `walk_*` functions provide the default recursion, so an
//! implementation overrides only the variants it cares about and calls the
//! matching `walk_*` when it still wants the children visited.
//!
//! Traversal is always document order: top-to-bottom, depth-first,
//! left-to-right. Passes that accumulate state across the traversal (such as
//! the image-assembly scan) rely on that order for first-seen-wins conflict
//! detection and must run exactly once per stylesheet; stateless rewriting
//! passes may be re-run freely.

use crate::ast::{
    AtStatement, BlockItem, Declaration, Expression, ImportantComment, Media, Page, Rule,
    Ruleset, StyleSheet, Term, TermWithOperator, ValueItem,
};

/// A stylesheet pass. See the module docs for the substitution contract.
pub trait Visitor: Sized {
    /// Error type produced when a pass aborts the traversal.
    type Error;

    fn visit_stylesheet(&mut self, node: StyleSheet) -> Result<StyleSheet, Self::Error> {
        walk_stylesheet(self, node)
    }

    fn visit_rule(&mut self, node: Rule) -> Result<Rule, Self::Error> {
        walk_rule(self, node)
    }

    fn visit_ruleset(&mut self, node: Ruleset) -> Result<Ruleset, Self::Error> {
        walk_ruleset(self, node)
    }

    fn visit_media(&mut self, node: Media) -> Result<Media, Self::Error> {
        walk_media(self, node)
    }

    fn visit_page(&mut self, node: Page) -> Result<Page, Self::Error> {
        walk_page(self, node)
    }

    fn visit_at_statement(&mut self, node: AtStatement) -> Result<AtStatement, Self::Error> {
        Ok(node)
    }

    fn visit_important_comment(
        &mut self,
        node: ImportantComment,
    ) -> Result<ImportantComment, Self::Error> {
        Ok(node)
    }

    fn visit_block_item(&mut self, node: BlockItem) -> Result<BlockItem, Self::Error> {
        walk_block_item(self, node)
    }

    fn visit_declaration(&mut self, node: Declaration) -> Result<Declaration, Self::Error> {
        walk_declaration(self, node)
    }

    fn visit_expression(&mut self, node: Expression) -> Result<Expression, Self::Error> {
        walk_expression(self, node)
    }

    fn visit_term_with_operator(
        &mut self,
        node: TermWithOperator,
    ) -> Result<TermWithOperator, Self::Error> {
        walk_term_with_operator(self, node)
    }

    fn visit_term(&mut self, node: Term) -> Result<Term, Self::Error> {
        Ok(node)
    }
}

pub fn walk_stylesheet<V: Visitor>(
    visitor: &mut V,
    node: StyleSheet,
) -> Result<StyleSheet, V::Error> {
    let rules = node
        .rules
        .into_iter()
        .map(|rule| visitor.visit_rule(rule))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(StyleSheet { rules })
}

pub fn walk_rule<V: Visitor>(visitor: &mut V, node: Rule) -> Result<Rule, V::Error> {
    Ok(match node {
        Rule::Ruleset(ruleset) => Rule::Ruleset(visitor.visit_ruleset(ruleset)?),
        Rule::Media(media) => Rule::Media(visitor.visit_media(media)?),
        Rule::Page(page) => Rule::Page(visitor.visit_page(page)?),
        Rule::AtStatement(statement) => Rule::AtStatement(visitor.visit_at_statement(statement)?),
        Rule::ImportantComment(comment) => {
            Rule::ImportantComment(visitor.visit_important_comment(comment)?)
        }
    })
}

pub fn walk_ruleset<V: Visitor>(visitor: &mut V, node: Ruleset) -> Result<Ruleset, V::Error> {
    let items = node
        .items
        .into_iter()
        .map(|item| visitor.visit_block_item(item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Ruleset {
        selectors: node.selectors,
        items,
    })
}

pub fn walk_media<V: Visitor>(visitor: &mut V, node: Media) -> Result<Media, V::Error> {
    let rules = node
        .rules
        .into_iter()
        .map(|rule| visitor.visit_rule(rule))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Media {
        query: node.query,
        rules,
    })
}

pub fn walk_page<V: Visitor>(visitor: &mut V, node: Page) -> Result<Page, V::Error> {
    let items = node
        .items
        .into_iter()
        .map(|item| visitor.visit_block_item(item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page {
        pseudo: node.pseudo,
        items,
    })
}

pub fn walk_block_item<V: Visitor>(visitor: &mut V, node: BlockItem) -> Result<BlockItem, V::Error> {
    Ok(match node {
        BlockItem::Declaration(declaration) => {
            BlockItem::Declaration(visitor.visit_declaration(declaration)?)
        }
        BlockItem::ImportantComment(comment) => {
            BlockItem::ImportantComment(visitor.visit_important_comment(comment)?)
        }
    })
}

pub fn walk_declaration<V: Visitor>(
    visitor: &mut V,
    node: Declaration,
) -> Result<Declaration, V::Error> {
    let value = visitor.visit_expression(node.value)?;
    Ok(Declaration {
        property: node.property,
        value,
        important: node.important,
        line: node.line,
    })
}

pub fn walk_expression<V: Visitor>(
    visitor: &mut V,
    node: Expression,
) -> Result<Expression, V::Error> {
    let items = node
        .items
        .into_iter()
        .map(|item| {
            Ok(match item {
                ValueItem::Term(term) => ValueItem::Term(visitor.visit_term_with_operator(term)?),
                ValueItem::Comment(comment) => {
                    ValueItem::Comment(visitor.visit_important_comment(comment)?)
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expression { items })
}

pub fn walk_term_with_operator<V: Visitor>(
    visitor: &mut V,
    node: TermWithOperator,
) -> Result<TermWithOperator, V::Error> {
    let term = visitor.visit_term(node.term)?;
    Ok(TermWithOperator {
        operator: node.operator,
        term,
    })
}
