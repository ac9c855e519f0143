//! Parser for the departure monitor widget response.
//!
//! The widget answers with a literal list of 3-element records, e.g.
//!
//! ```text
//! [["3","Wilder Mann","5"],["76","Pillnitz",""]]
//! ```
//!
//! Records may be written as lists or tuples, strings may use single or
//! double quotes, and trailing commas are tolerated. The third field is the
//! number of minutes until departure; an empty string means "now".

use std::iter::Peekable;
use std::str::CharIndices;

use crate::domain::Departure;

/// Error returned when a response body is not a well-formed departure list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),

    #[error("trailing characters at offset {0}")]
    TrailingCharacters(usize),

    #[error("expected a list of records")]
    NotAList,

    #[error("record {index}: expected a sequence")]
    NotARecord { index: usize },

    #[error("record {index}: expected 3 fields, found {found}")]
    FieldCount { index: usize, found: usize },

    #[error("record {index}: field {field} is not a string")]
    NotAString { index: usize, field: usize },

    #[error("record {index}: invalid minutes value {value:?}")]
    InvalidMinutes { index: usize, value: String },
}

/// A parsed literal.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Literal {
    Str(String),
    Seq(Vec<Literal>),
}

/// Parse a widget response body into departures, in upstream order.
pub fn parse_departures(body: &str) -> Result<Vec<Departure>, ParseError> {
    let records = match LiteralParser::new(body).parse()? {
        Literal::Seq(records) => records,
        Literal::Str(_) => return Err(ParseError::NotAList),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| to_departure(index, record))
        .collect()
}

/// Parse the minutes field. Empty means zero.
fn parse_minutes(index: usize, value: &str) -> Result<u32, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    trimmed.parse().map_err(|_| ParseError::InvalidMinutes {
        index,
        value: value.to_string(),
    })
}

fn to_departure(index: usize, record: Literal) -> Result<Departure, ParseError> {
    let fields = match record {
        Literal::Seq(fields) => fields,
        Literal::Str(_) => return Err(ParseError::NotARecord { index }),
    };

    let [route, destination, minutes]: [Literal; 3] =
        fields.try_into().map_err(|fields: Vec<Literal>| ParseError::FieldCount {
            index,
            found: fields.len(),
        })?;

    let route = expect_str(index, 0, route)?;
    let destination = expect_str(index, 1, destination)?;
    let minutes = parse_minutes(index, &expect_str(index, 2, minutes)?)?;

    Ok(Departure {
        route,
        destination,
        minutes,
    })
}

fn expect_str(index: usize, field: usize, literal: Literal) -> Result<String, ParseError> {
    match literal {
        Literal::Str(s) => Ok(s),
        Literal::Seq(_) => Err(ParseError::NotAString { index, field }),
    }
}

/// Recursive-descent parser over nested sequences of quoted strings.
struct LiteralParser<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> LiteralParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> Result<Literal, ParseError> {
        let value = self.value()?;
        self.skip_whitespace();
        match self.chars.peek() {
            None => Ok(value),
            Some(&(offset, _)) => Err(ParseError::TrailingCharacters(offset)),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn next(&mut self) -> Result<(usize, char), ParseError> {
        self.chars.next().ok_or(ParseError::UnexpectedEnd)
    }

    fn value(&mut self) -> Result<Literal, ParseError> {
        self.skip_whitespace();
        match self.next()? {
            (_, '[') => self.sequence(']'),
            (_, '(') => self.sequence(')'),
            (_, quote @ ('\'' | '"')) => self.string(quote).map(Literal::Str),
            (offset, found) => Err(ParseError::UnexpectedChar { found, offset }),
        }
    }

    /// Parse the items of a sequence after its opening bracket.
    fn sequence(&mut self, close: char) -> Result<Literal, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.chars.next_if(|&(_, c)| c == close).is_some() {
                return Ok(Literal::Seq(items));
            }

            items.push(self.value()?);

            self.skip_whitespace();
            match self.next()? {
                (_, ',') => {}
                (_, c) if c == close => return Ok(Literal::Seq(items)),
                (offset, found) => return Err(ParseError::UnexpectedChar { found, offset }),
            }
        }
    }

    /// Parse the body of a quoted string after its opening quote.
    fn string(&mut self, quote: char) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.next()? {
                (_, c) if c == quote => return Ok(out),
                (offset, '\\') => self.escape(offset, &mut out)?,
                (_, c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, offset: usize, out: &mut String) -> Result<(), ParseError> {
        let (_, c) = self.next()?;
        match c {
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0C'),
            'v' => out.push('\x0B'),
            // Escaped line break: a continuation, contributes nothing.
            '\n' => {}
            '0'..='7' => out.push(self.octal_char(offset, c)?),
            'x' => out.push(self.hex_char(offset, 2)?),
            'u' => out.push(self.hex_char(offset, 4)?),
            'U' => out.push(self.hex_char(offset, 8)?),
            // Unknown escapes are kept verbatim.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_char(&mut self, offset: usize, digits: usize) -> Result<char, ParseError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let (_, c) = self.next()?;
            let digit = c.to_digit(16).ok_or(ParseError::InvalidEscape(offset))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or(ParseError::InvalidEscape(offset))
    }

    /// One to three octal digits, the first of which was already consumed.
    fn octal_char(&mut self, offset: usize, first: char) -> Result<char, ParseError> {
        let mut code = first.to_digit(8).ok_or(ParseError::InvalidEscape(offset))?;
        for _ in 0..2 {
            match self.chars.peek().and_then(|&(_, c)| c.to_digit(8)) {
                Some(digit) => {
                    code = code * 8 + digit;
                    self.chars.next();
                }
                None => break,
            }
        }
        char::from_u32(code).ok_or(ParseError::InvalidEscape(offset))
    }
}
