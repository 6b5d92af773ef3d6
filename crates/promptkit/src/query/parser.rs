//! Recursive-descent parser for tag queries.
//!
//! ```text
//! or      := and ( OR and )*
//! and     := unary ( AND unary )*
//! unary   := NOT unary | primary
//! primary := TAG | '(' or ')'
//! ```
//!
//! Each grammar level is one method, so precedence (`OR` < `AND` < `NOT` <
//! group < tag) falls out of the call structure. `And`/`Or` nodes are built
//! through [`Expr::and`]/[`Expr::or`], which flatten chains of the same
//! operator.

use super::lexer::{tokenize, Token, TokenKind};
use super::Expr;
use crate::error::{PromptError, Result};

/// How deeply `(` groups and `NOT`s may nest. Keeps recursion bounded for
/// queries read back from disk as well as typed ones.
pub const MAX_DEPTH: usize = 256;

/// Parses a query string into an expression tree.
///
/// Fails with [`PromptError::Syntax`] on empty input, unbalanced parentheses,
/// an operator missing an operand, two operands with no operator between
/// them, or groups and `NOT`s nested more than [`MAX_DEPTH`] deep. The
/// reported position is a byte offset into `input`.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input);
    if tokens.is_empty() {
        return Err(PromptError::syntax(0, "empty query"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        depth: 0,
    };
    let expr = parser.parse_or()?;

    if let Some(token) = parser.peek() {
        return Err(match token.kind {
            TokenKind::RParen => PromptError::syntax(token.position, "unmatched ')'"),
            _ => PromptError::syntax(
                token.position,
                format!("expected AND or OR before {}", token.kind),
            ),
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Byte length of the input, reported for errors at end of input.
    end: usize,
    /// Open groups and `NOT`s on the current path.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_if(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self, position: usize) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(PromptError::syntax(
                position,
                format!("query nests deeper than {} levels", MAX_DEPTH),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_and()?];
        while self.next_if(&TokenKind::Or) {
            operands.push(self.parse_and()?);
        }
        Ok(Expr::or(operands))
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_unary()?];
        while self.next_if(&TokenKind::And) {
            operands.push(self.parse_unary()?);
        }
        Ok(Expr::and(operands))
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if let Some(position) = self
            .peek()
            .filter(|t| t.kind == TokenKind::Not)
            .map(|t| t.position)
        {
            self.descend(position)?;
            self.pos += 1;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::not(operand));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            let after = self
                .pos
                .checked_sub(1)
                .and_then(|i| self.tokens.get(i))
                .map(|t| t.kind.to_string())
                .unwrap_or_else(|| "start of query".to_string());
            return Err(PromptError::syntax(
                self.end,
                format!("missing operand after {}", after),
            ));
        };
        self.pos += 1;

        match token.kind {
            TokenKind::Tag(name) => Ok(Expr::Tag(name)),
            TokenKind::LParen => {
                self.descend(token.position)?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                if self.next_if(&TokenKind::RParen) {
                    Ok(inner)
                } else {
                    Err(PromptError::syntax(token.position, "unmatched '('"))
                }
            }
            other => Err(PromptError::syntax(
                token.position,
                format!("expected a tag or '(' but found {}", other),
            )),
        }
    }
}
