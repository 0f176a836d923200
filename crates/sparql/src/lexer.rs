//! Tokenizer for the query language surface this crate parses.
//!
//! A hand-written lexer producing a flat token stream, fed to the
//! recursive-descent parser in [`crate::parser`]. Keeping lexing and
//! parsing as separate passes (rather than a single combined scanner)
//! mirrors how the expression-heavy grammar reads most clearly: the
//! parser never has to think about whitespace, comments, or how a
//! literal's quoting was spelled.

use std::fmt;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `SELECT`, `WHERE`, `OPTIONAL`, ... — matched case-insensitively.
    Keyword(String),
    /// `?x` or `$x` (the `$` form is accepted as a synonym for `?`).
    Variable(String),
    /// `<https://example.org/foo>`
    IriRef(String),
    /// A prefixed name split into its parts, e.g. `rdf:type` -> `("rdf", "type")`.
    PrefixedName(String, String),
    /// `_:label`, a blank-node label.
    BlankNodeLabel(String),
    /// A quoted string literal's content (quotes stripped, escapes resolved).
    StringLiteral(String),
    /// An integer or decimal numeric literal's lexical form.
    Numeric(String),
    /// `true` / `false`.
    BooleanLiteral(bool),
    /// `@en`, `@en-US`
    LangTag(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `^^`
    CaretCaret,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `!`
    Bang,
    /// `?` used as a path modifier (zero-or-one), distinct from `Variable`.
    Question,
    /// `=`
    Equals,
    /// `!=`
    NotEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEquals,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// End of input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A tokenizer error, tagged with the byte offset it occurred at.
#[derive(Debug, thiserror::Error)]
#[error("lex error at byte {offset}: {message}")]
pub struct LexError {
    /// Byte offset into the source text.
    pub offset: usize,
    /// Human-readable description.
    pub message: String,
}

/// Converts source text into a `Vec<Token>`.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
}

const KEYWORDS: &[&str] = &[
    "SELECT", "CONSTRUCT", "ASK", "DESCRIBE", "WHERE", "OPTIONAL", "UNION", "FILTER", "BIND",
    "AS", "ORDER", "BY", "ASC", "DESC", "LIMIT", "OFFSET", "DISTINCT", "REDUCED", "PREFIX",
    "BASE", "A", "NOT", "EXISTS", "IN", "IF", "BOUND", "FROM", "NAMED", "SERVICE",
    "STR", "UCASE", "LCASE", "STRLEN", "CONTAINS", "REGEX", "ISIRI", "ISLITERAL",
];

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
        }
    }

    /// Tokenize the entire source, ending with a trailing [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// The character after the one [`Self::peek_char`] would return, without
    /// consuming either. Used to distinguish `_:label` from a bare `_` name.
    fn peek_second_char(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (idx, c) = self.chars.next()?;
        self.pos = idx + c.len_utf8();
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let Some(c) = self.peek_char() else {
            return Ok(Token::Eof);
        };

        match c {
            '(' => { self.advance(); Ok(Token::LParen) }
            ')' => { self.advance(); Ok(Token::RParen) }
            '{' => { self.advance(); Ok(Token::LBrace) }
            '}' => { self.advance(); Ok(Token::RBrace) }
            '.' => { self.advance(); Ok(Token::Dot) }
            ',' => { self.advance(); Ok(Token::Comma) }
            ';' => { self.advance(); Ok(Token::Semicolon) }
            '*' => { self.advance(); Ok(Token::Star) }
            '/' => { self.advance(); Ok(Token::Slash) }
            '|' => {
                self.advance();
                if self.peek_char() == Some('|') {
                    self.advance();
                    Ok(Token::OrOr)
                } else {
                    Ok(Token::Pipe)
                }
            }
            '^' => {
                self.advance();
                if self.peek_char() == Some('^') {
                    self.advance();
                    Ok(Token::CaretCaret)
                } else {
                    Ok(Token::Caret)
                }
            }
            '+' => { self.advance(); Ok(Token::Plus) }
            '-' => { self.advance(); Ok(Token::Minus) }
            '?' => {
                self.advance();
                match self.peek_char() {
                    Some(c) if is_name_start(c) => self.lex_variable(),
                    _ => Ok(Token::Question),
                }
            }
            '$' => {
                self.advance();
                self.lex_variable()
            }
            '_' if self.peek_second_char() == Some(':') => {
                self.advance();
                self.advance();
                self.lex_blank_node_label()
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Ok(Token::NotEquals)
                } else {
                    Ok(Token::Bang)
                }
            }
            '=' => { self.advance(); Ok(Token::Equals) }
            '<' => {
                self.advance();
                match self.peek_char() {
                    Some('=') => { self.advance(); Ok(Token::LessEquals) }
                    _ => self.lex_iri_ref(),
                }
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Ok(Token::GreaterEquals)
                } else {
                    Ok(Token::GreaterThan)
                }
            }
            '&' => {
                self.advance();
                if self.peek_char() == Some('&') {
                    self.advance();
                    Ok(Token::AndAnd)
                } else {
                    Err(self.error("expected '&&'"))
                }
            }
            '"' | '\'' => self.lex_string(),
            '@' => {
                self.advance();
                self.lex_lang_tag()
            }
            c if c.is_ascii_digit() => self.lex_number(),
            c if is_name_start(c) => self.lex_name_or_keyword(),
            ':' => self.lex_prefixed_name(String::new()),
            other => Err(self.error(format!("unexpected character '{other}'"))),
        }
    }

    fn lex_variable(&mut self) -> Result<Token, LexError> {
        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if is_name_char(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("empty variable name"));
        }
        Ok(Token::Variable(name))
    }

    fn lex_iri_ref(&mut self) -> Result<Token, LexError> {
        let mut iri = String::new();
        loop {
            match self.advance() {
                Some('>') => break,
                Some(c) => iri.push(c),
                None => return Err(self.error("unterminated IRI reference")),
            }
        }
        Ok(Token::IriRef(iri))
    }

    fn lex_string(&mut self) -> Result<Token, LexError> {
        let quote = self.advance().unwrap();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(c) => value.push(c),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
        Ok(Token::StringLiteral(value))
    }

    fn lex_number(&mut self) -> Result<Token, LexError> {
        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '+' || c == '-' {
                if (c == '+' || c == '-') && !s.ends_with(['e', 'E']) {
                    break;
                }
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Ok(Token::Numeric(s))
    }

    fn lex_lang_tag(&mut self) -> Result<Token, LexError> {
        let mut tag = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '-' {
                tag.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if tag.is_empty() {
            return Err(self.error("empty language tag"));
        }
        Ok(Token::LangTag(tag))
    }

    fn lex_name_or_keyword(&mut self) -> Result<Token, LexError> {
        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if is_name_char(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.peek_char() == Some(':') {
            self.advance();
            return self.lex_prefixed_name(name);
        }
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "TRUE" => Ok(Token::BooleanLiteral(true)),
            "FALSE" => Ok(Token::BooleanLiteral(false)),
            k if KEYWORDS.contains(&k) => Ok(Token::Keyword(k.to_string())),
            _ => Err(self.error(format!("unrecognized identifier '{name}'"))),
        }
    }

    /// Lex a blank-node label's local part, after the leading `_:` has
    /// already been consumed.
    fn lex_blank_node_label(&mut self) -> Result<Token, LexError> {
        let mut label = String::new();
        while let Some(c) = self.peek_char() {
            if is_name_char(c) {
                label.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if label.is_empty() {
            return Err(self.error("empty blank node label"));
        }
        Ok(Token::BlankNodeLabel(label))
    }

    fn lex_prefixed_name(&mut self, prefix: String) -> Result<Token, LexError> {
        let mut local = String::new();
        while let Some(c) = self.peek_char() {
            if is_name_char(c) {
                local.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Ok(Token::PrefixedName(prefix, local))
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_simple_select() {
        let tokens = Lexer::new("SELECT ?x WHERE { ?x a ?y }").tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Keyword("SELECT".into()),
                Token::Variable("x".into()),
                Token::Keyword("WHERE".into()),
                Token::LBrace,
                Token::Variable("x".into()),
                Token::Keyword("A".into()),
                Token::Variable("y".into()),
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_iri_and_prefixed_name() {
        let tokens = Lexer::new("<https://example.org/s> ex:Type").tokenize().unwrap();
        assert_eq!(tokens[0], Token::IriRef("https://example.org/s".into()));
        assert_eq!(tokens[1], Token::PrefixedName("ex".into(), "Type".into()));
    }

    #[test]
    fn tokenizes_property_path_operators() {
        let tokens = Lexer::new("^a/b|c+ d* e?").tokenize().unwrap();
        assert!(tokens.contains(&Token::Caret));
        assert!(tokens.contains(&Token::Slash));
        assert!(tokens.contains(&Token::Pipe));
        assert!(tokens.contains(&Token::Plus));
        assert!(tokens.contains(&Token::Star));
        assert!(tokens.contains(&Token::Question));
    }

    #[test]
    fn tokenizes_string_with_escapes() {
        let tokens = Lexer::new(r#""a\nb""#).tokenize().unwrap();
        assert_eq!(tokens[0], Token::StringLiteral("a\nb".into()));
    }

    #[test]
    fn tokenizes_blank_node_label() {
        let tokens = Lexer::new("_:b1 _:x").tokenize().unwrap();
        assert_eq!(tokens[0], Token::BlankNodeLabel("b1".into()));
        assert_eq!(tokens[1], Token::BlankNodeLabel("x".into()));
    }

    #[test]
    fn bare_underscore_without_colon_is_not_a_blank_node_label() {
        let err = Lexer::new("_foo").tokenize().unwrap_err();
        assert!(err.message.contains("unrecognized identifier"));
    }
}
