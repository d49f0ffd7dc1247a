//! Reader for the Scheme subset used by `gafrc` files.
//!
//! Only reading happens here. Evaluation of the few forms gEDA projects
//! actually use lives with the library path configuration.

use std::fmt;

use crate::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sexpr {
    Symbol(String),
    String(String),
    List(Vec<Sexpr>),
}

impl Sexpr {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Sexpr]> {
        match self {
            Sexpr::List(items) => Some(items),
            _ => None,
        }
    }

    /// Head symbol and arguments of a form such as `(define x 1)`.
    pub fn as_form(&self) -> Option<(&str, &[Sexpr])> {
        let (head, args) = self.as_list()?.split_first()?;
        Some((head.as_symbol()?, args))
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Symbol(s) => write!(f, "{s}"),
            Sexpr::String(s) => write!(f, "{s:?}"),
            Sexpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

struct Reader<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            pos: 0,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn bump(&mut self) -> Option<char> {
        let (at, ch) = self.chars.next()?;
        self.pos = at + ch.len_utf8();
        Some(ch)
    }

    fn skip_blank(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == ';' {
                while let Some(ch) = self.bump() {
                    if ch == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Next expression, or `None` at end of input.
    fn read(&mut self) -> Result<Option<Sexpr>, ParseError> {
        self.skip_blank();
        let Some(ch) = self.peek() else {
            return Ok(None);
        };

        let expr = match ch {
            '(' => {
                self.bump();
                self.read_list()?
            }
            ')' => return Err(ParseError::UnbalancedClose(self.pos)),
            '\'' => {
                self.bump();
                let quoted = self.read()?.ok_or(ParseError::UnclosedList)?;
                Sexpr::List(vec![Sexpr::Symbol("quote".to_string()), quoted])
            }
            '"' => {
                self.bump();
                self.read_string()?
            }
            _ => self.read_symbol(),
        };
        Ok(Some(expr))
    }

    fn read_list(&mut self) -> Result<Sexpr, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_blank();
            match self.peek() {
                None => return Err(ParseError::UnclosedList),
                Some(')') => {
                    self.bump();
                    return Ok(Sexpr::List(items));
                }
                Some(_) => {
                    let item = self.read()?.ok_or(ParseError::UnclosedList)?;
                    items.push(item);
                }
            }
        }
    }

    fn read_string(&mut self) -> Result<Sexpr, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump().ok_or(ParseError::UnterminatedString)? {
                '"' => return Ok(Sexpr::String(out)),
                '\\' => match self.bump().ok_or(ParseError::UnterminatedString)? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    other => out.push(other),
                },
                ch => out.push(ch),
            }
        }
    }

    fn read_symbol(&mut self) -> Sexpr {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | '"' | ';') {
                break;
            }
            self.bump();
        }
        Sexpr::Symbol(self.input[start..self.pos].to_string())
    }
}

/// Read every top-level expression of `input`.
pub fn parse_all(input: &str) -> Result<Vec<Sexpr>, ParseError> {
    log::trace!("Reading scheme expressions from {} bytes", input.len());
    let mut reader = Reader::new(input);
    let mut exprs = Vec::new();
    while let Some(expr) = reader.read()? {
        exprs.push(expr);
    }
    log::trace!("Read {} scheme expressions", exprs.len());
    Ok(exprs)
}
