//! Transformation-parameter files.
//!
//! Elastix parameter files hold one `(Key value value ...)` entry per line.
//! String values are double quoted, numbers are bare and `//` starts a
//! comment. [`ParameterMap`] keeps the original text of every line it does
//! not modify, so untouched entries and comments are written back byte for
//! byte. Files written with CRLF line endings keep them, including on
//! entries that are added or modified.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;

/// Parse or edit failure in a parameter file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterFileError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("invalid parameter key {0:?}")]
    InvalidKey(String),

    #[error("invalid value {value:?} for parameter {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    /// Blank or comment-only line.
    Other(String),
    Entry {
        key: String,
        values: Vec<String>,
        /// Source text, dropped once the entry is modified.
        raw: Option<String>,
    },
}

/// Ordered key to value-tuple mapping backed by the file's lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMap {
    lines: Vec<Line>,
    trailing_newline: bool,
    line_ending: &'static str,
}

impl Default for ParameterMap {
    fn default() -> Self {
        Self { lines: Vec::new(), trailing_newline: true, line_ending: "\n" }
    }
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse parameter file text.
    pub fn parse(text: &str) -> std::result::Result<Self, ParameterFileError> {
        if text.is_empty() {
            return Ok(Self::new());
        }

        // A file with any CRLF terminator is written back with CRLF throughout.
        let line_ending = if text.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);

        let mut lines = Vec::new();
        for (idx, raw) in body.split('\n').enumerate() {
            let raw = if line_ending == "\r\n" { raw.strip_suffix('\r').unwrap_or(raw) } else { raw };
            lines.push(parse_line(raw, idx + 1)?);
        }

        Ok(Self { lines, trailing_newline, line_ending })
    }

    /// Read and parse the file at `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameter file {}", path.display()))?;
        let map = Self::parse(&text)
            .with_context(|| format!("Failed to parse parameter file {}", path.display()))?;
        tracing::debug!("read {} parameters from {}", map.len(), path.display());
        Ok(map)
    }

    /// Write the map to `path`, replacing any existing file.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_string())
            .with_context(|| format!("Failed to write parameter file {}", path.display()))?;
        Ok(())
    }

    /// Values of `key`. If a key occurs more than once the last entry wins.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.position(key).and_then(|idx| match &self.lines[idx] {
            Line::Entry { values, .. } => Some(values.as_slice()),
            Line::Other(_) => None,
        })
    }

    /// First value of `key`.
    pub fn get_scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Replace the values of `key`, appending a new entry if it is absent.
    pub fn set<I, V>(&mut self, key: &str, values: I) -> std::result::Result<(), ParameterFileError>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        validate_key(key)?;
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if let Some(value) = values.iter().find(|v| v.contains('"') || v.contains('\n')) {
            return Err(ParameterFileError::InvalidValue { key: key.to_string(), value: value.clone() });
        }

        match self.position(key) {
            Some(idx) => {
                self.lines[idx] = Line::Entry { key: key.to_string(), values, raw: None };
            }
            None => {
                self.lines.push(Line::Entry { key: key.to_string(), values, raw: None });
            }
        }
        Ok(())
    }

    /// Set `key` to the one-element tuple `(value,)`.
    pub fn set_scalar(&mut self, key: &str, value: impl Into<String>) -> std::result::Result<(), ParameterFileError> {
        self.set(key, [value.into()])
    }

    /// Remove every entry of `key`, returning the values of the last one.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let mut removed = None;
        self.lines.retain(|line| match line {
            Line::Entry { key: k, values, .. } if k == key => {
                removed = Some(values.clone());
                false
            }
            _ => true,
        });
        removed
    }

    /// Keys in file order; repeated keys are listed once per entry.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, .. } => Some(key.as_str()),
            Line::Other(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.keys().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.lines
            .iter()
            .rposition(|line| matches!(line, Line::Entry { key: k, .. } if k == key))
    }
}

impl FromStr for ParameterMap {
    type Err = ParameterFileError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ParameterMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                f.write_str(self.line_ending)?;
            }
            match line {
                Line::Other(raw) | Line::Entry { raw: Some(raw), .. } => f.write_str(raw)?,
                Line::Entry { key, values, raw: None } => write_entry(f, key, values)?,
            }
        }
        if self.trailing_newline && !self.lines.is_empty() {
            f.write_str(self.line_ending)?;
        }
        Ok(())
    }
}

/// Set each `(field, value)` pair as a one-element tuple, in order, and
/// write the result to `output` or back to `input`. Returns the path
/// written.
pub fn modify_parameters<K, V>(fields: &[(K, V)], input: impl AsRef<Path>, output: Option<&Path>) -> Result<PathBuf>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let input = input.as_ref();
    let mut map = ParameterMap::read(input)?;
    for (field, value) in fields {
        map.set_scalar(field.as_ref(), value.as_ref())?;
    }

    let output = output.unwrap_or(input);
    map.write(output)?;
    tracing::info!("wrote {} modified parameters to {}", fields.len(), output.display());
    Ok(output.to_path_buf())
}

fn write_entry(f: &mut fmt::Formatter<'_>, key: &str, values: &[String]) -> fmt::Result {
    write!(f, "({key}")?;
    for value in values {
        if is_numeric(value) {
            write!(f, " {value}")?;
        } else {
            write!(f, " \"{value}\"")?;
        }
    }
    f.write_str(")")
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && value.parse::<f64>().is_ok()
}

fn validate_key(key: &str) -> std::result::Result<(), ParameterFileError> {
    let valid = !key.is_empty()
        && key.chars().all(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '"'))
        && !key.starts_with("//");
    if valid { Ok(()) } else { Err(ParameterFileError::InvalidKey(key.to_string())) }
}

fn parse_line(raw: &str, line: usize) -> std::result::Result<Line, ParameterFileError> {
    let malformed = |reason: &str| ParameterFileError::Malformed { line, reason: reason.to_string() };

    let content = raw.trim();
    if content.is_empty() || content.starts_with("//") {
        return Ok(Line::Other(raw.to_string()));
    }

    let inner = content.strip_prefix('(').ok_or_else(|| malformed("expected '('"))?;
    let tokens = tokenize(inner).map_err(|reason| malformed(&reason))?;

    let mut tokens = tokens.into_iter();
    let key = match tokens.next() {
        Some(Token::Bare(key)) => key,
        Some(Token::Quoted(_)) => return Err(malformed("parameter key must not be quoted")),
        None => return Err(malformed("missing parameter key")),
    };
    let values = tokens
        .map(|token| match token {
            Token::Bare(v) | Token::Quoted(v) => v,
        })
        .collect();

    Ok(Line::Entry { key, values, raw: Some(raw.to_string()) })
}

enum Token {
    Bare(String),
    Quoted(String),
}

// Tokenizes everything after the opening parenthesis up to the closing one.
// Only whitespace or a comment may follow it.
fn tokenize(inner: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = inner.char_indices().peekable();

    while let Some(&(idx, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ')' => {
                let rest = inner[idx + 1..].trim();
                if rest.is_empty() || rest.starts_with("//") {
                    return Ok(tokens);
                }
                return Err(format!("unexpected text after ')': {rest}"));
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, ch)) => value.push(ch),
                        None => return Err("unterminated string".to_string()),
                    }
                }
                tokens.push(Token::Quoted(value));
            }
            _ => {
                let mut value = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if ch.is_whitespace() || ch == ')' || ch == '"' {
                        break;
                    }
                    value.push(ch);
                    chars.next();
                }
                tokens.push(Token::Bare(value));
            }
        }
    }

    Err("missing ')'".to_string())
}
