//! Recursive-descent parser producing an [`Expression`] tree.
//!
//! Precedence, loosest first: `|`, `&`, comparisons, `+ -`, `* /`, unary
//! `-`. Binary operators associate to the left. A chain of comparisons such
//! as `1 < b < 3` is read as `1 < b & b < 3`.

use crate::table::Value;

use super::lexer::{tokenize, Token, TokenKind};
use super::{BinaryOperator, Expression, ParseError};

/// Deepest expression tree the parser will build. Evaluation walks the tree
/// recursively, so this bounds its stack use.
pub(crate) const MAX_DEPTH: usize = 256;

pub(crate) fn parse(source: &str) -> Result<Expression, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::new(0, "empty expression"));
    }

    let mut parser = Parser {
        tokens,
        position: 0,
        end: source.len(),
        depth: 0,
    };
    let (expression, _) = parser.or_expr()?;
    match parser.peek() {
        None => Ok(expression),
        Some(token) => Err(ParseError::new(
            token.offset,
            format!("unexpected '{}'", token.kind.describe()),
        )),
    }
}

/// A parsed subtree and its height.
type Parsed = (Expression, usize);

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    end: usize,
    /// Open parentheses and minus signs currently being parsed.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Offset of the next token, or the end of the source.
    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    /// Consume the next token if `select` maps it to an operator, returning
    /// the operator and its offset.
    fn take_operator(
        &mut self,
        select: fn(&TokenKind) -> Option<BinaryOperator>,
    ) -> Option<(BinaryOperator, usize)> {
        let token = self.peek()?;
        let op = select(&token.kind)?;
        let offset = token.offset;
        self.position += 1;
        Some((op, offset))
    }

    /// Height of a node over children of the given heights.
    fn node_height(offset: usize, children: usize) -> Result<usize, ParseError> {
        let height = children + 1;
        if height > MAX_DEPTH {
            return Err(ParseError::new(offset, "expression nested too deeply"));
        }
        Ok(height)
    }

    fn join(offset: usize, op: BinaryOperator, left: Parsed, right: Parsed) -> Result<Parsed, ParseError> {
        let height = Self::node_height(offset, left.1.max(right.1))?;
        Ok((Expression::binary(op, left.0, right.0), height))
    }

    fn or_expr(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.and_expr()?;
        while let Some((op, offset)) = self.take_operator(|k| match k {
            TokenKind::Pipe => Some(BinaryOperator::Or),
            _ => None,
        }) {
            let right = self.and_expr()?;
            left = Self::join(offset, op, left, right)?;
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.comparison()?;
        while let Some((op, offset)) = self.take_operator(|k| match k {
            TokenKind::Amp => Some(BinaryOperator::And),
            _ => None,
        }) {
            let right = self.comparison()?;
            left = Self::join(offset, op, left, right)?;
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Parsed, ParseError> {
        let first = self.additive()?;
        let mut operand = first.clone();
        let mut chain: Option<Parsed> = None;

        while let Some((op, offset)) = self.take_operator(comparison_operator) {
            let right = self.additive()?;
            let link = Self::join(offset, op, operand, right.clone())?;
            chain = Some(match chain {
                None => link,
                Some(previous) => Self::join(offset, BinaryOperator::And, previous, link)?,
            });
            operand = right;
        }

        Ok(chain.unwrap_or(first))
    }

    fn additive(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.multiplicative()?;
        while let Some((op, offset)) = self.take_operator(|k| match k {
            TokenKind::Plus => Some(BinaryOperator::Add),
            TokenKind::Minus => Some(BinaryOperator::Subtract),
            _ => None,
        }) {
            let right = self.multiplicative()?;
            left = Self::join(offset, op, left, right)?;
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.unary()?;
        while let Some((op, offset)) = self.take_operator(|k| match k {
            TokenKind::Star => Some(BinaryOperator::Multiply),
            TokenKind::Slash => Some(BinaryOperator::Divide),
            _ => None,
        }) {
            let right = self.unary()?;
            left = Self::join(offset, op, left, right)?;
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Parsed, ParseError> {
        if matches!(self.peek(), Some(Token { kind: TokenKind::Minus, .. })) {
            let offset = self.offset();
            self.position += 1;
            let (operand, height) = self.descend(offset, Self::unary)?;
            return Ok(match operand {
                Expression::Literal(Value::Integer(i)) => match i.checked_neg() {
                    Some(n) => (Expression::Literal(Value::Integer(n)), height),
                    None => (
                        Expression::Negate(Box::new(Expression::Literal(Value::Integer(i)))),
                        Self::node_height(offset, height)?,
                    ),
                },
                Expression::Literal(Value::Real(r)) => (Expression::Literal(Value::Real(-r)), height),
                other => (Expression::Negate(Box::new(other)), Self::node_height(offset, height)?),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Parsed, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::new(self.end, "expression ends unexpectedly"));
        };

        let leaf = |expression: Expression| -> Result<Parsed, ParseError> { Ok((expression, 1)) };
        match token.kind {
            TokenKind::Integer(i) => leaf(Expression::Literal(Value::Integer(i))),
            TokenKind::Real(r) => leaf(Expression::Literal(Value::Real(r))),
            TokenKind::Text(s) => leaf(Expression::Literal(Value::Text(s))),
            TokenKind::Ident(name) => leaf(Expression::Column(name)),
            TokenKind::LParen => {
                let inner = self.descend(token.offset, Self::or_expr)?;
                match self.advance() {
                    Some(Token { kind: TokenKind::RParen, .. }) => Ok(inner),
                    Some(other) => Err(ParseError::new(
                        other.offset,
                        format!("expected ')' but found '{}'", other.kind.describe()),
                    )),
                    None => Err(ParseError::new(self.end, "missing ')'")),
                }
            }
            other => Err(ParseError::new(
                token.offset,
                format!("unexpected '{}'", other.describe()),
            )),
        }
    }

    /// Run `parse` one level deeper, refusing to recurse past [`MAX_DEPTH`].
    fn descend(
        &mut self,
        offset: usize,
        parse: fn(&mut Self) -> Result<Parsed, ParseError>,
    ) -> Result<Parsed, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(offset, "expression nested too deeply"));
        }
        self.depth += 1;
        let parsed = parse(self);
        self.depth -= 1;
        parsed
    }
}

fn comparison_operator(kind: &TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Lt => Some(BinaryOperator::Lt),
        TokenKind::Gt => Some(BinaryOperator::Gt),
        TokenKind::Le => Some(BinaryOperator::Le),
        TokenKind::Ge => Some(BinaryOperator::Ge),
        TokenKind::EqEq => Some(BinaryOperator::Eq),
        TokenKind::NotEq => Some(BinaryOperator::Ne),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Expression {
        Expression::Column(name.to_string())
    }

    fn int(i: i64) -> Expression {
        Expression::Literal(Value::Integer(i))
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let expr = parse("1 + 2 * a").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                BinaryOperator::Add,
                int(1),
                Expression::binary(BinaryOperator::Multiply, int(2), col("a")),
            )
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let expr = parse("a - b - c").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                BinaryOperator::Subtract,
                Expression::binary(BinaryOperator::Subtract, col("a"), col("b")),
                col("c"),
            )
        );
    }

    #[test]
    fn test_comparison_binds_tighter_than_boolean() {
        let expr = parse("a > 1 | b < 2 & c == 3").unwrap();
        let Expression::Binary { op, right, .. } = &expr else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOperator::Or);
        assert!(matches!(**right, Expression::Binary { op: BinaryOperator::And, .. }));
    }

    #[test]
    fn test_chained_comparison_expands_to_and() {
        let expr = parse("1 < b < 3").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                BinaryOperator::And,
                Expression::binary(BinaryOperator::Lt, int(1), col("b")),
                Expression::binary(BinaryOperator::Lt, col("b"), int(3)),
            )
        );
    }

    #[test]
    fn test_negative_literal_folds() {
        assert_eq!(parse("-5").unwrap(), int(-5));
        assert_eq!(
            parse("-a").unwrap(),
            Expression::Negate(Box::new(col("a")))
        );
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let source = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
        let err = parse(&source).unwrap_err();
        assert_eq!(err.message, "expression nested too deeply");
        assert_eq!(err.position, MAX_DEPTH);

        let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&shallow).unwrap(), int(1));
    }

    #[test]
    fn test_long_chains_are_rejected() {
        let sum = vec!["a"; 50_000].join(" + ");
        assert_eq!(parse(&sum).unwrap_err().message, "expression nested too deeply");

        let right_nested = format!("{}a{}", "a + (".repeat(5_000), ")".repeat(5_000));
        assert!(parse(&right_nested).is_err());

        let negations = format!("{}a", "-".repeat(50_000));
        assert!(parse(&negations).is_err());

        let short = vec!["a"; 100].join(" + ");
        assert!(parse(&short).is_ok());
    }

    #[test]
    fn test_errors_carry_offsets() {
        assert_eq!(parse("").unwrap_err().position, 0);
        assert_eq!(parse("a +").unwrap_err().position, 3);
        assert_eq!(parse("(a + 1").unwrap_err().position, 6);
        assert_eq!(parse("a b").unwrap_err().position, 2);
    }
}
