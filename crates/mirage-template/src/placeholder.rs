//! Parsing `{{namespace.generator(args)}}` placeholders out of strings.

use crate::generators::Generator;
use mirage_core::TemplateError;
use mirage_deps::regex::Regex;
use std::sync::LazyLock;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Expression inside the braces: a dotted name with an optional argument list
static CALL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    const CALL_PATTERN: &str =
        r"^\s*([A-Za-z][A-Za-z0-9_]*(?:\.[A-Za-z][A-Za-z0-9_]*)?)\s*(?:\(([^()]*)\))?\s*$";
    match Regex::new(CALL_PATTERN) {
        Ok(regex) => regex,
        Err(err) => panic!("Placeholder regex is invalid: {err}"),
    }
});

/// One generator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCall {
    /// Resolved generator
    pub generator: Generator,
    /// Arguments as written, trimmed
    pub args: Vec<String>,
}

/// A piece of a templated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Text copied through unchanged
    Literal(String),
    /// A placeholder to be replaced
    Call(GeneratorCall),
}

/// Whether `text` contains a placeholder opener at all.
pub fn has_placeholder(text: &str) -> bool {
    text.contains(OPEN)
}

/// Split `text` into literal runs and generator calls.
///
/// # Errors
/// Returns `MalformedPlaceholder` for an unclosed `{{` or an expression that is
/// not a generator call, and `UnknownGenerator` for names outside the catalogue.
pub fn parse(text: &str) -> Result<Vec<Piece>, TemplateError> {
    let mut pieces = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            pieces.push(Piece::Literal(rest[..start].to_owned()));
        }
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            return Err(TemplateError::MalformedPlaceholder(text.to_owned()));
        };
        pieces.push(Piece::Call(parse_call(&after_open[..end], text)?));
        rest = &after_open[end + CLOSE.len()..];
    }

    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest.to_owned()));
    }
    Ok(pieces)
}

fn parse_call(expression: &str, whole: &str) -> Result<GeneratorCall, TemplateError> {
    let captures = CALL_REGEX
        .captures(expression)
        .ok_or_else(|| TemplateError::MalformedPlaceholder(whole.to_owned()))?;
    let name = captures.get(1).map_or("", |found| found.as_str());
    let generator =
        Generator::lookup(name).ok_or_else(|| TemplateError::UnknownGenerator(name.to_owned()))?;
    let args: Vec<String> = captures
        .get(2)
        .map(|found| found.as_str().trim())
        .filter(|list| !list.is_empty())
        .map(|list| list.split(',').map(|arg| arg.trim().to_owned()).collect())
        .unwrap_or_default();

    Ok(GeneratorCall { generator, args })
}
