//! # Tag Query Language
//!
//! Advanced search filters prompts with boolean expressions over tags:
//!
//! ```text
//! (ai AND analysis) OR writing AND NOT template
//! ```
//!
//! ## Syntax
//!
//! - **Tags**: any run of characters other than whitespace and parentheses.
//! - **Operators**: `AND`, `OR`, `NOT`, matched case-insensitively and only as
//!   whole words (`android` is a tag, not `AND` + `roid`).
//! - **Grouping**: parentheses.
//! - **Precedence** (loosest first): `OR`, `AND`, `NOT`, group, tag.
//!   `a AND b OR c` is `(a AND b) OR c`; `NOT a AND b` is `(NOT a) AND b`.
//!
//! ## Pipeline
//!
//! 1. [`lexer::tokenize`] turns the whole input into tokens with byte offsets.
//! 2. [`parser::parse`] builds an [`Expr`] by recursive descent.
//! 3. [`eval::evaluate`] tests an expression against a [`TagSet`].
//! 4. [`eval::query_string`] (and `Display`) renders an expression back to
//!    canonical text with only the parentheses precedence requires.
//!
//! There is exactly one parser. Every entry point (saved searches, the API
//! facade, whatever UI sits on top) goes through [`parse`].
//!
//! ## Case
//!
//! Matching ignores case: tags are trimmed and lowercased on both sides.
//! Rendering keeps the tag text as written in the query.

pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::{evaluate, query_string, TagSet};
pub use parser::parse;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed tag query.
///
/// `And` and `Or` built by the parser or by [`Expr::and`]/[`Expr::or`] always
/// have at least two children and never directly contain a node of the same
/// operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Tag(String),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn tag(name: impl Into<String>) -> Self {
        Expr::Tag(name.into())
    }

    /// Conjunction of `operands`. Nested `And`s are spliced in and a single
    /// operand is returned as is.
    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Self {
        let mut flat = Vec::new();
        for operand in operands {
            match operand {
                Expr::And(children) => flat.extend(children),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Expr::And(flat)
        }
    }

    /// Disjunction of `operands`, flattened like [`Expr::and`].
    pub fn or(operands: impl IntoIterator<Item = Expr>) -> Self {
        let mut flat = Vec::new();
        for operand in operands {
            match operand {
                Expr::Or(children) => flat.extend(children),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Expr::Or(flat)
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Not(Box::new(operand))
    }

    pub fn matches(&self, tags: &TagSet) -> bool {
        evaluate(self, tags)
    }

    /// All tag literals in the expression, in order of appearance.
    pub fn tags(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_tags(&mut out);
        out
    }

    fn collect_tags<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Tag(t) => out.push(t),
            Expr::And(children) | Expr::Or(children) => {
                for child in children {
                    child.collect_tags(out);
                }
            }
            Expr::Not(inner) => inner.collect_tags(out),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&query_string(self))
    }
}

impl FromStr for Expr {
    type Err = crate::error::PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

// Persisted as the canonical query string so saved searches stay hand-editable.
impl Serialize for Expr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&query_string(self))
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
