//! Recursive-descent parser for the expression language.
//!
//! Precedence, lowest first:
//!
//! | level | syntax                          |
//! |-------|---------------------------------|
//! | 1     | `x if cond else y`              |
//! | 2     | `or`, `\|\|`                    |
//! | 3     | `and`, `&&`                     |
//! | 4     | `not`, `!`                      |
//! | 5     | `== != < <= > >=` (chainable)   |
//! | 6     | `+ -`                           |
//! | 7     | `* / // %`                      |
//! | 8     | unary `- +`                     |
//! | 9     | `**` (right associative)        |
//! | 10    | calls, `.attr`, `[index]`       |

use super::ast::{BinaryOp, CompareOp, Expr, UnaryOp};
use super::error::EvalError;
use super::lexer::{Lexer, SpannedToken, Token};
use super::value::Value;

/// Maximum nesting of parenthesised or prefix sub-expressions.
pub const MAX_NESTING: usize = 64;

/// Parse `input` into an expression tree.
pub fn parse(input: &str) -> Result<Expr, EvalError> {
    let tokens = Lexer::new(input).lex()?;
    let mut parser = Parser { tokens, index: 0, nesting: 0 };
    let expr = parser.parse_expression()?;
    parser.expect(&Token::Eof, "end of expression")?;
    Ok(expr)
}

struct Parser<'a> {
    tokens: Vec<SpannedToken<'a>>,
    index: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn parse_expression(&mut self) -> Result<Expr, EvalError> {
        self.descend()?;
        let result = self.parse_conditional();
        self.nesting -= 1;
        result
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            self.nesting -= 1;
            return Err(EvalError::NestingTooDeep(MAX_NESTING));
        }
        Ok(())
    }

    fn parse_conditional(&mut self) -> Result<Expr, EvalError> {
        let then = self.parse_or()?;
        if !self.matches(&Token::If) {
            return Ok(then);
        }
        let cond = self.parse_or()?;
        self.expect(&Token::Else, "'else'")?;
        let otherwise = self.parse_expression()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_and()?;
        while self.matches(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_not()?;
        while self.matches(&Token::And) {
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, EvalError> {
        if self.matches(&Token::Not) {
            self.descend()?;
            let operand = self.parse_not();
            self.nesting -= 1;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        let first = self.parse_additive()?;
        let mut rest = Vec::new();
        while let Some(op) = self.compare_op() {
            self.advance();
            rest.push((op, self.parse_additive()?));
        }
        if rest.is_empty() { Ok(first) } else { Ok(Expr::Compare(Box::new(first), rest)) }
    }

    fn compare_op(&self) -> Option<CompareOp> {
        match self.current().token {
            Token::EqEq => Some(CompareOp::Eq),
            Token::NotEq => Some(CompareOp::NotEq),
            Token::Lt => Some(CompareOp::Lt),
            Token::Le => Some(CompareOp::Le),
            Token::Gt => Some(CompareOp::Gt),
            Token::Ge => Some(CompareOp::Ge),
            _ => None,
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.current().token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current().token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::DoubleSlash => BinaryOp::FloorDiv,
                Token::Percent => BinaryOp::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.current().token {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.advance();
        self.descend()?;
        let operand = self.parse_unary();
        self.nesting -= 1;
        Ok(Expr::Unary(op, Box::new(operand?)))
    }

    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        let base = self.parse_postfix()?;
        if !self.matches(&Token::DoubleStar) {
            return Ok(base);
        }
        // `2 ** -1` is legal: the exponent is a unary expression.
        self.descend()?;
        let exponent = self.parse_unary();
        self.nesting -= 1;
        Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent?)))
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.matches(&Token::LParen) {
                let args = self.parse_arguments()?;
                expr = Expr::Call(Box::new(expr), args);
            } else if self.matches(&Token::Dot) {
                let name = self.expect_ident("attribute name")?;
                expr = Expr::Attr(Box::new(expr), name);
            } else if self.matches(&Token::LBracket) {
                let index = self.parse_expression()?;
                self.expect(&Token::RBracket, "']'")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if self.matches(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.matches(&Token::Comma) {
                // trailing comma
                if self.matches(&Token::RParen) {
                    return Ok(args);
                }
                continue;
            }
            self.expect(&Token::RParen, "',' or ')'")?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let SpannedToken { token, position } = self.current().clone();
        let expr = match token {
            Token::Int(i) => Expr::Literal(Value::Int(i)),
            Token::Float(f) => Expr::Literal(Value::Float(f)),
            Token::Str(s) => {
                self.advance();
                // adjacent literals concatenate
                let mut text = s;
                while let Token::Str(next) = &self.current().token {
                    text.push_str(next);
                    self.advance();
                }
                return Ok(Expr::Literal(Value::Str(text)));
            }
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::None => Expr::Literal(Value::None),
            Token::Ident(name) => Expr::Name(name.to_string()),
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen, "')'")?;
                return Ok(inner);
            }
            other => {
                return Err(EvalError::syntax(
                    format!("unexpected {}, expected an operand", other.describe()),
                    position,
                ));
            }
        };
        self.advance();
        Ok(expr)
    }

    fn current(&self) -> &SpannedToken<'a> {
        // The token stream always ends with Eof and `advance` never moves past it.
        &self.tokens[self.index]
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn matches(&mut self, token: &Token<'_>) -> bool {
        if &self.current().token == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token<'_>, expected: &str) -> Result<(), EvalError> {
        if self.matches(token) {
            return Ok(());
        }
        let current = self.current();
        Err(EvalError::syntax(
            format!("unexpected {}, expected {expected}", current.token.describe()),
            current.position,
        ))
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String, EvalError> {
        let current = self.current().clone();
        if let Token::Ident(name) = current.token {
            self.advance();
            return Ok(name.to_string());
        }
        Err(EvalError::syntax(
            format!("unexpected {}, expected {expected}", current.token.describe()),
            current.position,
        ))
    }
}
