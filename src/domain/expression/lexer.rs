//! Tokenizer for the expression language

use super::error::ExpressionError;

/// Kinds of tokens produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Numeric literal, kept as source text until the parser decides its type
    Number(String),
    /// String literal with escapes already applied
    String(String),
    /// Identifier or keyword
    Name(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

/// A token along with its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Split an expression into tokens, always terminated by [`TokenKind::Eof`]
pub fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_ascii_digit() {
            let mut text = String::new();
            let mut seen_dot = false;

            while let Some(&(_, c)) = chars.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    chars.next();
                } else if c == '.' && !seen_dot {
                    // `1.` followed by a non-digit is a path access, not a decimal
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some(&(_, next)) if next.is_ascii_digit() => {
                            seen_dot = true;
                            text.push(c);
                            chars.next();
                        }
                        _ => break,
                    }
                } else {
                    break;
                }
            }

            tokens.push(Token::new(TokenKind::Number(text), offset));
            continue;
        }

        if is_name_start(ch) {
            let mut text = String::new();

            while let Some(&(_, c)) = chars.peek() {
                if is_name_part(c) {
                    text.push(c);
                    chars.next();
                } else {
                    break;
                }
            }

            tokens.push(Token::new(TokenKind::Name(text), offset));
            continue;
        }

        chars.next();

        let kind = match ch {
            '"' => TokenKind::String(read_string(&mut chars, offset)?),
            '`' => TokenKind::Name(read_quoted_name(&mut chars, offset)?),
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '/' => TokenKind::Slash,
            '=' => TokenKind::Eq,
            '*' => {
                if matches!(chars.peek(), Some(&(_, '*'))) {
                    chars.next();
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '!' => {
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    TokenKind::NotEq
                } else {
                    return Err(ExpressionError::parse(offset, "expected '=' after '!'"));
                }
            }
            '<' => {
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            other => {
                return Err(ExpressionError::parse(
                    offset,
                    format!("unexpected character '{}'", other),
                ));
            }
        };

        tokens.push(Token::new(kind, offset));
    }

    tokens.push(Token::new(TokenKind::Eof, source.len()));
    Ok(tokens)
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '?' || ch == '$'
}

fn is_name_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '?' || ch == '$'
}

type CharStream<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn read_string(chars: &mut CharStream<'_>, start: usize) -> Result<String, ExpressionError> {
    let mut text = String::new();

    while let Some((offset, c)) = chars.next() {
        match c {
            '"' => return Ok(text),
            '\\' => match chars.next() {
                Some((_, '"')) => text.push('"'),
                Some((_, '\\')) => text.push('\\'),
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, 'r')) => text.push('\r'),
                Some((_, other)) => {
                    return Err(ExpressionError::parse(
                        offset,
                        format!("unknown escape sequence '\\{}'", other),
                    ));
                }
                None => break,
            },
            _ => text.push(c),
        }
    }

    Err(ExpressionError::parse(start, "unterminated string literal"))
}

fn read_quoted_name(chars: &mut CharStream<'_>, start: usize) -> Result<String, ExpressionError> {
    let mut text = String::new();

    for (_, c) in chars.by_ref() {
        if c == '`' {
            if text.is_empty() {
                return Err(ExpressionError::parse(start, "empty quoted name"));
            }
            return Ok(text);
        }
        text.push(c);
    }

    Err(ExpressionError::parse(start, "unterminated quoted name"))
}
