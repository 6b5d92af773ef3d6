//! Evaluation and canonical rendering of [`Expr`] trees.

use super::Expr;
use std::collections::HashSet;

/// A case-folded set of tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(HashSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: &str) -> bool {
        let folded = fold(tag);
        !folded.is_empty() && self.0.insert(folded)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(&fold(tag))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: AsRef<str>> FromIterator<T> for TagSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag.as_ref());
        }
        set
    }
}

fn fold(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Decides whether a tag set satisfies `expr`. Pure; reuse one parsed
/// expression across any number of artifacts.
pub fn evaluate(expr: &Expr, tags: &TagSet) -> bool {
    match expr {
        Expr::Tag(t) => tags.contains(t),
        Expr::And(children) => children.iter().all(|c| evaluate(c, tags)),
        Expr::Or(children) => children.iter().any(|c| evaluate(c, tags)),
        Expr::Not(inner) => !evaluate(inner, tags),
    }
}

/// Binding strength, loosest first.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Or(_) => 1,
        Expr::And(_) => 2,
        Expr::Not(_) => 3,
        Expr::Tag(_) => 4,
    }
}

/// Renders `expr` in query syntax, parenthesizing a child only when it binds
/// more loosely than its parent.
pub fn query_string(expr: &Expr) -> String {
    let mut out = String::new();
    render(expr, &mut out);
    out
}

fn render(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Tag(t) => out.push_str(t),
        Expr::And(children) => render_joined(children, " AND ", 2, out),
        Expr::Or(children) => render_joined(children, " OR ", 1, out),
        Expr::Not(inner) => {
            out.push_str("NOT ");
            render_operand(inner, 3, out);
        }
    }
}

fn render_joined(children: &[Expr], sep: &str, level: u8, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        render_operand(child, level, out);
    }
}

fn render_operand(child: &Expr, parent_level: u8, out: &mut String) {
    if precedence(child) < parent_level {
        out.push('(');
        render(child, out);
        out.push(')');
    } else {
        render(child, out);
    }
}
