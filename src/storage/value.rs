//! Structured values embedded in save files
//!
//! Quest targets, quest rewards and scene lists are stored as small literal
//! expressions inside an otherwise line-oriented file:
//!
//! - Maps: `{"野狼": 5, "action": "explore_cave_deep"}`
//! - Lists: `["洞穴地图", "古代金币"]`
//! - Strings: double or single quoted, with `\n`, `\t`, `\\`, `\"`, `\'` escapes
//! - Integers: optionally signed
//! - Keywords: `true`, `false`, `none` (any case)
//!
//! Input is tokenized and parsed; nothing is ever evaluated.
use std::collections::BTreeMap;
use std::fmt;

use crate::game::errors::GameError;

/// Deeper nesting than this is rejected instead of recursing further.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// A list of strings, as used for scene and item lists.
    pub fn strings<'a>(items: impl IntoIterator<Item = &'a str>) -> Self {
        Value::List(items.into_iter().map(|s| Value::Str(s.to_string())).collect())
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("none"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write_quoted(f, s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ": {}", value)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Int(i64),
    Word(String),
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Str(s) => write!(f, "string \"{}\"", s),
            Token::Int(n) => write!(f, "number {}", n),
            Token::Word(w) => write!(f, "word '{}'", w),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

fn decode_error(offset: usize, reason: impl Into<String>) -> GameError {
    GameError::StructuredFieldDecode {
        offset,
        reason: reason.into(),
    }
}

/// Splits a value expression into tokens, remembering each token's character offset.
struct Tokenizer {
    input: Vec<char>,
    position: usize,
}

impl Tokenizer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        self.position += 1;
        ch
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String, GameError> {
        let start = self.position;
        self.advance();
        let mut result = String::new();

        while let Some(ch) = self.advance() {
            if ch == quote {
                return Ok(result);
            }
            if ch == '\\' {
                match self.advance() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    Some(escaped) => result.push(escaped),
                    None => break,
                }
            } else {
                result.push(ch);
            }
        }

        Err(decode_error(start, "unterminated string literal"))
    }

    fn read_number(&mut self) -> Result<i64, GameError> {
        let start = self.position;
        let mut digits = String::new();
        if self.current() == Some('-') || self.current() == Some('+') {
            digits.push(self.advance().unwrap_or('+'));
        }
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        digits
            .parse()
            .map_err(|_| decode_error(start, format!("invalid integer '{}'", digits)))
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    fn next_token(&mut self) -> Result<(Token, usize), GameError> {
        self.skip_whitespace();
        let offset = self.position;
        let single = |tokenizer: &mut Self, token: Token| -> Result<(Token, usize), GameError> {
            tokenizer.advance();
            Ok((token, offset))
        };

        match self.current() {
            None => Ok((Token::Eof, offset)),
            Some('{') => single(self, Token::LeftBrace),
            Some('}') => single(self, Token::RightBrace),
            Some('[') => single(self, Token::LeftBracket),
            Some(']') => single(self, Token::RightBracket),
            Some(':') => single(self, Token::Colon),
            Some(',') => single(self, Token::Comma),
            Some(q @ ('"' | '\'')) => Ok((Token::Str(self.read_string(q)?), offset)),
            Some(ch) if ch.is_ascii_digit() || ch == '-' || ch == '+' => {
                Ok((Token::Int(self.read_number()?), offset))
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => Ok((Token::Word(self.read_word()), offset)),
            Some(ch) => Err(decode_error(offset, format!("unexpected character '{}'", ch))),
        }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, GameError> {
        let mut tokens = Vec::new();
        loop {
            let (token, offset) = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push((token, offset));
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Recursive-descent parser over the token stream.
struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
    end: usize,
}

impl Parser {
    fn new(tokens: Vec<(Token, usize)>, end: usize) -> Self {
        Self {
            tokens,
            position: 0,
            end,
        }
    }

    fn current(&self) -> (&Token, usize) {
        match self.tokens.get(self.position) {
            Some((token, offset)) => (token, *offset),
            None => (&Token::Eof, self.end),
        }
    }

    fn advance(&mut self) -> (Token, usize) {
        let (token, offset) = self.current();
        let taken = (token.clone(), offset);
        self.position += 1;
        taken
    }

    fn expect(&mut self, expected: Token) -> Result<(), GameError> {
        let (token, offset) = self.advance();
        if token == expected {
            Ok(())
        } else {
            Err(decode_error(offset, format!("expected {}, found {}", expected, token)))
        }
    }

    fn parse_document(&mut self) -> Result<Value, GameError> {
        let value = self.parse_value(0)?;
        let (token, offset) = self.current();
        if *token != Token::Eof {
            return Err(decode_error(offset, format!("unexpected trailing {}", token)));
        }
        Ok(value)
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, GameError> {
        let (token, offset) = self.advance();
        if depth > MAX_DEPTH {
            return Err(decode_error(offset, "nesting too deep"));
        }
        match token {
            Token::Str(s) => Ok(Value::Str(s)),
            Token::Int(n) => Ok(Value::Int(n)),
            Token::Word(word) => match word.to_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                "none" | "null" => Ok(Value::None),
                _ => Err(decode_error(offset, format!("unknown word '{}'", word))),
            },
            Token::LeftBracket => self.parse_list(depth),
            Token::LeftBrace => self.parse_map(depth),
            other => Err(decode_error(offset, format!("expected a value, found {}", other))),
        }
    }

    fn parse_list(&mut self, depth: usize) -> Result<Value, GameError> {
        let mut items = Vec::new();
        if *self.current().0 == Token::RightBracket {
            self.advance();
            return Ok(Value::List(items));
        }
        loop {
            items.push(self.parse_value(depth + 1)?);
            let (token, offset) = self.advance();
            match token {
                Token::Comma if *self.current().0 == Token::RightBracket => {
                    self.advance();
                    break;
                }
                Token::Comma => continue,
                Token::RightBracket => break,
                other => {
                    return Err(decode_error(offset, format!("expected , or ], found {}", other)))
                }
            }
        }
        Ok(Value::List(items))
    }

    fn parse_map(&mut self, depth: usize) -> Result<Value, GameError> {
        let mut map = BTreeMap::new();
        if *self.current().0 == Token::RightBrace {
            self.advance();
            return Ok(Value::Map(map));
        }
        loop {
            let (key, offset) = self.advance();
            let Token::Str(key) = key else {
                return Err(decode_error(offset, format!("expected a string key, found {}", key)));
            };
            self.expect(Token::Colon)?;
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);
            let (token, offset) = self.advance();
            match token {
                Token::Comma if *self.current().0 == Token::RightBrace => {
                    self.advance();
                    break;
                }
                Token::Comma => continue,
                Token::RightBrace => break,
                other => {
                    return Err(decode_error(offset, format!("expected , or }}, found {}", other)))
                }
            }
        }
        Ok(Value::Map(map))
    }
}

/// Parse one complete value. Trailing input is an error.
pub fn parse_value(input: &str) -> Result<Value, GameError> {
    let end = input.chars().count();
    let tokens = Tokenizer::new(input).tokenize()?;
    Parser::new(tokens, end).parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, Value)]) -> Value {
        Value::Map(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[test]
    fn parses_quest_blobs_in_both_quote_styles() {
        let expected = map(&[("野狼", Value::Int(5))]);
        assert_eq!(parse_value("{\"野狼\": 5}").unwrap(), expected);
        assert_eq!(parse_value("{'野狼': 5}").unwrap(), expected);

        let reward = parse_value("{'exp': 200, 'gold': 100, 'items': ['洞穴地图']}").unwrap();
        let reward = reward.as_map().unwrap();
        assert_eq!(reward["exp"].as_int(), Some(200));
        assert_eq!(reward["items"].as_list().unwrap()[0].as_str(), Some("洞穴地图"));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(parse_value("None").unwrap(), Value::None);
        assert_eq!(parse_value("TRUE").unwrap(), Value::Bool(true));
        assert_eq!(parse_value("[false, -3, +4]").unwrap(), Value::List(vec![
            Value::Bool(false),
            Value::Int(-3),
            Value::Int(4),
        ]));
    }

    #[test]
    fn escapes_survive_display_and_parse() {
        let tricky = Value::Str("a \"quoted\" \\ line\nnext\t'x'".into());
        let text = tricky.to_string();
        assert_eq!(parse_value(&text).unwrap(), tricky);
    }

    #[test]
    fn trailing_commas_and_empty_containers() {
        assert_eq!(parse_value("[]").unwrap(), Value::List(vec![]));
        assert_eq!(parse_value("{ }").unwrap(), Value::Map(BTreeMap::new()));
        assert_eq!(parse_value("[1, 2,]").unwrap().as_list().unwrap().len(), 2);
    }

    #[test]
    fn never_evaluates_code() {
        for input in [
            "__import__('os').system('rm -rf /')",
            "open('x')",
            "{1: 2}",
            "[1 2]",
            "{\"a\" 1}",
            "'unterminated",
            "99999999999999999999",
            "[1] 2",
            "",
        ] {
            match parse_value(input) {
                Err(GameError::StructuredFieldDecode { .. }) => {}
                other => panic!("{:?} should not decode, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn error_offsets_point_at_the_problem() {
        match parse_value("{\"a\": 1, \"b\" 2}") {
            Err(GameError::StructuredFieldDecode { offset, .. }) => assert_eq!(offset, 13),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}{}", "[".repeat(100), "]".repeat(100));
        assert!(parse_value(&deep).is_err());
        let shallow = format!("{}{}", "[".repeat(10), "]".repeat(10));
        assert!(parse_value(&shallow).is_ok());
    }
}
