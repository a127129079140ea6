//! Boolean expressions over other conditions of the same strategy (`remove` key)
//!
//! ```text
//! expr   := term ("OR" term)*
//! term   := factor ("AND" factor)*
//! factor := "NOT" factor | "(" expr ")" | NAME
//! ```
//!
//! Keywords are case-insensitive. A `NAME` is the configuration key of another
//! condition; its remove set is what the expression combines.

use super::{Condition, Partition};
use crate::error::EvaluationError;
use crate::{ClientStatus, TorrentSet};
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Condition(String),
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
}

impl Expression {
    /// Condition keys referenced by this expression, in order of appearance
    pub fn references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Condition(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Self::Not(inner) => inner.collect_references(names),
            Self::And(lhs, rhs) | Self::Or(lhs, rhs) => {
                lhs.collect_references(names);
                rhs.collect_references(names);
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condition(name) => f.write_str(name),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::And(lhs, rhs) => write!(f, "({lhs} AND {rhs})"),
            Self::Or(lhs, rhs) => write!(f, "({lhs} OR {rhs})"),
        }
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }

        let mut parser = Parser { tokens, pos: 0 };
        let expression = parser.expr()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expression),
            Some((token, position)) => Err(ExpressionError::UnexpectedToken {
                found: token.to_string(),
                position: *position,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    And,
    Or,
    Not,
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
            Self::Not => f.write_str("NOT"),
            Self::Open => f.write_str("("),
            Self::Close => f.write_str(")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars: Peekable<CharIndices<'_>> = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((Token::Open, position));
            }
            ')' => {
                chars.next();
                tokens.push((Token::Close, position));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let token = match word.to_ascii_uppercase().as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    _ => Token::Name(word),
                };
                tokens.push((token, position));
            }
            found => return Err(ExpressionError::UnexpectedChar { found, position }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Expression, ExpressionError> {
        let mut lhs = self.term()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expression::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expression, ExpressionError> {
        let mut lhs = self.factor()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.factor()?;
            lhs = Expression::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Expression, ExpressionError> {
        match self.next() {
            Some((Token::Not, _)) => Ok(Expression::Not(Box::new(self.factor()?))),
            Some((Token::Open, _)) => {
                let inner = self.expr()?;
                match self.next() {
                    Some((Token::Close, _)) => Ok(inner),
                    Some((token, position)) => Err(ExpressionError::UnexpectedToken {
                        found: token.to_string(),
                        position,
                    }),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some((Token::Name(name), _)) => Ok(Expression::Condition(name)),
            Some((token, position)) => Err(ExpressionError::UnexpectedToken {
                found: token.to_string(),
                position,
            }),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}

/// Expression whose leaves are already built conditions
enum Node {
    Leaf(Box<dyn Condition>),
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
}

/// Composite condition: combines the remove sets of other conditions
///
/// AND intersects, OR unites, NOT takes the complement within the input.
/// Every referenced condition sees the same input as this one.
pub struct ConditionParser {
    expression: Expression,
    root: Node,
}

impl ConditionParser {
    /// Builds the condition, asking `resolve` for every referenced condition key
    pub fn build<E, F>(expression: Expression, mut resolve: F) -> Result<Self, E>
    where
        F: FnMut(&str) -> Result<Box<dyn Condition>, E>,
    {
        let root = Self::resolve_node(&expression, &mut resolve)?;
        Ok(Self { expression, root })
    }

    fn resolve_node<E, F>(expression: &Expression, resolve: &mut F) -> Result<Node, E>
    where
        F: FnMut(&str) -> Result<Box<dyn Condition>, E>,
    {
        Ok(match expression {
            Expression::Condition(name) => Node::Leaf(resolve(name)?),
            Expression::Not(inner) => Node::Not(Box::new(Self::resolve_node(inner, resolve)?)),
            Expression::And(lhs, rhs) => Node::And(
                Box::new(Self::resolve_node(lhs, resolve)?),
                Box::new(Self::resolve_node(rhs, resolve)?),
            ),
            Expression::Or(lhs, rhs) => Node::Or(
                Box::new(Self::resolve_node(lhs, resolve)?),
                Box::new(Self::resolve_node(rhs, resolve)?),
            ),
        })
    }

    pub const fn expression(&self) -> &Expression {
        &self.expression
    }

    fn evaluate(
        node: &Node,
        status: &ClientStatus,
        torrents: &TorrentSet,
    ) -> Result<TorrentSet, EvaluationError> {
        Ok(match node {
            Node::Leaf(condition) => condition.apply(status, torrents)?.remove,
            Node::Not(inner) => {
                let removed = Self::evaluate(inner, status, torrents)?;
                torrents.difference(&removed).cloned().collect()
            }
            Node::And(lhs, rhs) => {
                let lhs = Self::evaluate(lhs, status, torrents)?;
                let rhs = Self::evaluate(rhs, status, torrents)?;
                lhs.intersection(&rhs).cloned().collect()
            }
            Node::Or(lhs, rhs) => {
                let mut lhs = Self::evaluate(lhs, status, torrents)?;
                lhs.extend(Self::evaluate(rhs, status, torrents)?);
                lhs
            }
        })
    }
}

impl Condition for ConditionParser {
    fn apply(
        &self,
        status: &ClientStatus,
        torrents: &TorrentSet,
    ) -> Result<Partition, EvaluationError> {
        let remove = Self::evaluate(&self.root, status, torrents)
            .map_err(|e| e.reported_by(self.name()))?;
        tracing::trace!(
            "Expression '{}' selected {} of {} torrent(s)",
            self.expression,
            remove.len(),
            torrents.len()
        );
        Ok(Partition::split(torrents, &remove))
    }

    fn name(&self) -> &'static str {
        "remove"
    }
}
