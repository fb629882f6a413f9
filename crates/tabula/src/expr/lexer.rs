//! Tokenizer for formula and filter expressions.

use super::ParseError;

/// A lexical token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Integer(i64),
    Real(f64),
    Text(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    Amp,
    Pipe,
    LParen,
    RParen,
}

impl TokenKind {
    /// How the token reads in error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Integer(i) => i.to_string(),
            TokenKind::Real(r) => r.to_string(),
            TokenKind::Text(s) => format!("'{}'", s),
            TokenKind::Ident(s) => s.clone(),
            TokenKind::Plus => "+".to_string(),
            TokenKind::Minus => "-".to_string(),
            TokenKind::Star => "*".to_string(),
            TokenKind::Slash => "/".to_string(),
            TokenKind::Lt => "<".to_string(),
            TokenKind::Gt => ">".to_string(),
            TokenKind::Le => "<=".to_string(),
            TokenKind::Ge => ">=".to_string(),
            TokenKind::EqEq => "==".to_string(),
            TokenKind::NotEq => "!=".to_string(),
            TokenKind::Amp => "&".to_string(),
            TokenKind::Pipe => "|".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
        }
    }
}

/// Split an expression into tokens.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = match ch {
            '0'..='9' | '.' => {
                let mut end = offset;
                let mut seen_dot = false;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                        seen_dot |= c == '.';
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                number(&source[offset..end], offset)?
            }
            '\'' | '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some((_, escaped)) => text.push(escaped),
                            None => break,
                        },
                        c if c == ch => {
                            closed = true;
                            break;
                        }
                        c => text.push(c),
                    }
                }
                if !closed {
                    return Err(ParseError::new(offset, "unterminated string literal"));
                }
                TokenKind::Text(text)
            }
            '`' => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '`' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(ParseError::new(offset, "unterminated quoted column name"));
                }
                if name.is_empty() {
                    return Err(ParseError::new(offset, "empty quoted column name"));
                }
                TokenKind::Ident(name)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(name)
            }
            _ => {
                chars.next();
                let next = chars.peek().map(|&(_, c)| c);
                let (kind, wide) = match (ch, next) {
                    ('<', Some('=')) => (TokenKind::Le, true),
                    ('>', Some('=')) => (TokenKind::Ge, true),
                    ('=', Some('=')) => (TokenKind::EqEq, true),
                    ('!', Some('=')) => (TokenKind::NotEq, true),
                    ('<', _) => (TokenKind::Lt, false),
                    ('>', _) => (TokenKind::Gt, false),
                    ('+', _) => (TokenKind::Plus, false),
                    ('-', _) => (TokenKind::Minus, false),
                    ('*', _) => (TokenKind::Star, false),
                    ('/', _) => (TokenKind::Slash, false),
                    ('&', _) => (TokenKind::Amp, false),
                    ('|', _) => (TokenKind::Pipe, false),
                    ('(', _) => (TokenKind::LParen, false),
                    (')', _) => (TokenKind::RParen, false),
                    ('=', _) => {
                        return Err(ParseError::new(offset, "use '==' to compare values"));
                    }
                    (other, _) => {
                        return Err(ParseError::new(
                            offset,
                            format!("unexpected character '{}'", other),
                        ));
                    }
                };
                if wide {
                    chars.next();
                }
                tokens.push(Token { kind, offset });
                continue;
            }
        };

        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

fn number(text: &str, offset: usize) -> Result<TokenKind, ParseError> {
    if text == "." {
        return Err(ParseError::new(offset, "unexpected character '.'"));
    }
    if text.contains('.') {
        return text
            .parse::<f64>()
            .map(TokenKind::Real)
            .map_err(|_| ParseError::new(offset, format!("invalid number '{}'", text)));
    }
    text.parse::<i64>()
        .map(TokenKind::Integer)
        .map_err(|_| ParseError::new(offset, format!("integer '{}' is out of range", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators_and_literals() {
        assert_eq!(
            kinds("a <= 2.5 & b != 'x'"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Le,
                TokenKind::Real(2.5),
                TokenKind::Amp,
                TokenKind::Ident("b".to_string()),
                TokenKind::NotEq,
                TokenKind::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_quoted_names_and_escapes() {
        assert_eq!(
            kinds(r#"`name[80]` == "say \"hi\"""#),
            vec![
                TokenKind::Ident("name[80]".to_string()),
                TokenKind::EqEq,
                TokenKind::Text("say \"hi\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_single_equals_is_rejected() {
        let err = tokenize("a = 1").unwrap_err();
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("'abc").is_err());
        assert!(tokenize("`abc").is_err());
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        assert!(tokenize("99999999999999999999").is_err());
    }
}
