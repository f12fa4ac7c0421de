//! Tokenizer for the expression language.

use super::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'a> {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(&'a str),
    True,
    False,
    None,
    And,
    Or,
    Not,
    If,
    Else,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Eof,
}

impl Token<'_> {
    /// Human-readable token text for syntax errors.
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Int(i) => i.to_string(),
            Token::Float(f) => f.to_string(),
            Token::Str(s) => format!("{s:?}"),
            Token::Ident(s) => (*s).to_string(),
            Token::Eof => "end of input".to_string(),
            other => format!("{other:?}"),
        }
    }
}

/// Token paired with its byte offset.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SpannedToken<'a> {
    pub token: Token<'a>,
    pub position: usize,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) const fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    pub(crate) fn lex(mut self) -> Result<Vec<SpannedToken<'a>>, EvalError> {
        let mut tokens = Vec::new();
        let input = self.input;
        let bytes = input.as_bytes();

        while let Some(&ch) = bytes.get(self.offset) {
            let start = self.offset;
            let token = match ch {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.offset += 1;
                    continue;
                }
                b'(' => self.single(Token::LParen),
                b')' => self.single(Token::RParen),
                b'[' => self.single(Token::LBracket),
                b']' => self.single(Token::RBracket),
                b',' => self.single(Token::Comma),
                b'+' => self.single(Token::Plus),
                b'-' => self.single(Token::Minus),
                b'%' => self.single(Token::Percent),
                b'*' => self.one_or_two(b'*', Token::Star, Token::DoubleStar),
                b'/' => self.one_or_two(b'/', Token::Slash, Token::DoubleSlash),
                b'<' => self.one_or_two(b'=', Token::Lt, Token::Le),
                b'>' => self.one_or_two(b'=', Token::Gt, Token::Ge),
                b'!' => self.one_or_two(b'=', Token::Not, Token::NotEq),
                b'=' => self.pair(b'=', Token::EqEq, "==")?,
                b'&' => self.pair(b'&', Token::And, "&&")?,
                b'|' => self.pair(b'|', Token::Or, "||")?,
                b'"' | b'\'' => self.string(ch)?,
                b'.' if self.peek(1).is_some_and(|b| b.is_ascii_digit()) => self.number()?,
                b'.' => self.single(Token::Dot),
                b'0'..=b'9' => self.number()?,
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                    self.consume_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                    keyword_or_ident(&input[start..self.offset])
                }
                _ => {
                    let found = input[start..].chars().next().unwrap_or('?');
                    return Err(EvalError::syntax(format!("unexpected character '{found}'"), start));
                }
            };
            tokens.push(SpannedToken { token, position: start });
        }

        if tokens.is_empty() {
            return Err(EvalError::syntax("empty expression", 0));
        }
        tokens.push(SpannedToken { token: Token::Eof, position: self.offset });
        Ok(tokens)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.input.as_bytes().get(self.offset + ahead).copied()
    }

    fn single(&mut self, token: Token<'a>) -> Token<'a> {
        self.offset += 1;
        token
    }

    /// `first` alone, or `second` when followed by `next`.
    fn one_or_two(&mut self, next: u8, first: Token<'a>, second: Token<'a>) -> Token<'a> {
        if self.peek(1) == Some(next) {
            self.offset += 2;
            second
        } else {
            self.offset += 1;
            first
        }
    }

    /// Two-character operator whose first character is meaningless alone.
    fn pair(&mut self, next: u8, token: Token<'a>, text: &str) -> Result<Token<'a>, EvalError> {
        if self.peek(1) == Some(next) {
            self.offset += 2;
            Ok(token)
        } else {
            Err(EvalError::syntax(format!("expected '{text}'"), self.offset))
        }
    }

    fn consume_while<F>(&mut self, condition: F)
    where
        F: Fn(u8) -> bool,
    {
        while let Some(b) = self.peek(0) {
            if condition(b) {
                self.offset += 1;
            } else {
                break;
            }
        }
    }

    fn number(&mut self) -> Result<Token<'a>, EvalError> {
        let start = self.offset;
        let mut is_float = false;
        self.consume_while(|b| b.is_ascii_digit() || b == b'_');

        let attribute_follows = self.peek(1).is_some_and(|b| b.is_ascii_alphabetic() || b == b'_');
        if self.peek(0) == Some(b'.') && !attribute_follows {
            is_float = true;
            self.offset += 1;
            self.consume_while(|b| b.is_ascii_digit() || b == b'_');
        }

        if matches!(self.peek(0), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek(1), Some(b'+' | b'-')));
            if self.peek(1 + sign).is_some_and(|b| b.is_ascii_digit()) {
                is_float = true;
                self.offset += 1 + sign;
                self.consume_while(|b| b.is_ascii_digit());
            }
        }

        let text: String = self.input[start..self.offset].chars().filter(|&c| c != '_').collect();
        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| EvalError::syntax(format!("invalid number '{text}'"), start))
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| EvalError::syntax(format!("invalid integer '{text}'"), start))
        }
    }

    fn string(&mut self, quote: u8) -> Result<Token<'a>, EvalError> {
        let input = self.input;
        let start = self.offset;
        self.offset += 1;
        let mut out = String::new();
        let mut chars = input[self.offset..].char_indices();

        while let Some((i, c)) = chars.next() {
            match c {
                c if c as u32 == u32::from(quote) => {
                    self.offset += i + 1;
                    return Ok(Token::Str(out));
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, '0')) => out.push('\0'),
                    Some((_, e @ ('\\' | '\'' | '"'))) => out.push(e),
                    Some((_, other)) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => break,
                },
                c => out.push(c),
            }
        }
        Err(EvalError::syntax("unterminated string literal", start))
    }
}

fn keyword_or_ident(slice: &str) -> Token<'_> {
    match slice {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "if" => Token::If,
        "else" => Token::Else,
        "True" => Token::True,
        "False" => Token::False,
        "None" => Token::None,
        _ => Token::Ident(slice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token<'_>> {
        Lexer::new(input).lex().unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn lexes_arithmetic() {
        assert_eq!(
            kinds("n*100 // 3"),
            vec![
                Token::Ident("n"),
                Token::Star,
                Token::Int(100),
                Token::DoubleSlash,
                Token::Int(3),
                Token::Eof
            ]
        );
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(kinds("3.5")[0], Token::Float(3.5));
        assert_eq!(kinds(".5")[0], Token::Float(0.5));
        assert_eq!(kinds("1e3")[0], Token::Float(1000.0));
        assert_eq!(kinds("1_000")[0], Token::Int(1000));
    }

    #[test]
    fn integer_followed_by_attribute_is_not_a_float() {
        assert_eq!(kinds("1.real")[..3], [Token::Int(1), Token::Dot, Token::Ident("real")]);
    }

    #[test]
    fn lexes_strings_with_escapes() {
        assert_eq!(kinds(r#""a\"b""#)[0], Token::Str("a\"b".into()));
        assert_eq!(kinds("'it''s'")[..2], [Token::Str("it".into()), Token::Str("s".into())]);
    }

    #[test]
    fn symbolic_and_word_operators_agree() {
        assert_eq!(kinds("a && b")[1], Token::And);
        assert_eq!(kinds("a and b")[1], Token::And);
        assert_eq!(kinds("!a")[0], Token::Not);
        assert_eq!(kinds("a != b")[1], Token::NotEq);
    }

    #[test]
    fn rejects_single_equals() {
        let err = Lexer::new("a = 1").lex().unwrap_err();
        assert_eq!(err.category(), "Syntax");
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(Lexer::new("'abc").lex().is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(Lexer::new("   ").lex().is_err());
    }
}
