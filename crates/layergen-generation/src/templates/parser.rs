//! Template syntax parser
//!
//! Splits template text into literal spans, placeholder tokens, and
//! repeated-block regions.
//!
//! Placeholders are UPPER_SNAKE_CASE tokens drawn from a vocabulary (the
//! entity tokens plus any shared-context keys). Because generated identifiers
//! are frequently glued to a token (`MODEL_NAMEController`,
//! `IMODEL_NAMEService`), matching is vocabulary-driven and longest-first
//! rather than boundary-based.
//!
//! A repeated-block region is delimited by marker lines:
//!
//! ```text
//! BLOCK_BEGIN:lazy_declarations
//!     private readonly Lazy<ISAFE_MODEL_NAMERepository> _LOWER_START_NAME;
//! BLOCK_END:lazy_declarations
//! ```
//!
//! The begin marker accepts an optional separator, `BLOCK_BEGIN:name:SEP=, `,
//! with `\n`, `\t`, and `\\` escapes; the default separator is a newline.

use std::collections::BTreeSet;

use crate::error::TemplateError;
use crate::templates::substitutor;

const BLOCK_BEGIN: &str = "BLOCK_BEGIN:";
const BLOCK_END: &str = "BLOCK_END:";

/// Represents a parsed template element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    /// Plain text content
    Literal(String),
    /// Placeholder token, e.g. `MODEL_NAME`
    Placeholder(String),
    /// Repeated-block region, rendered once per entity of a schema group
    Block {
        /// Region name
        name: String,
        /// Separator joining the per-entity renderings
        separator: String,
        /// Body rendered for each entity
        body: Vec<TemplateNode>,
    },
}

/// Parsed template structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    /// Template elements in source order
    pub nodes: Vec<TemplateNode>,
    /// All placeholder tokens found (including inside blocks)
    pub placeholder_names: BTreeSet<String>,
    /// Block region names in source order
    pub block_names: Vec<String>,
}

/// The set of placeholder tokens a parse recognizes
///
/// Tokens are tried longest-first so `SAFE_MODEL_NAME` wins over the
/// `MODEL_NAME` it contains.
#[derive(Debug, Clone)]
pub struct TokenVocabulary {
    tokens: Vec<String>,
}

impl TokenVocabulary {
    /// The four entity tokens every template may use
    pub fn builtin() -> Self {
        Self::from_tokens(substitutor::ENTITY_TOKENS.iter().map(|t| t.to_string()))
    }

    /// Builtin entity tokens plus shared-context keys
    pub fn with_context_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = substitutor::ENTITY_TOKENS
            .iter()
            .map(|t| t.to_string())
            .collect();
        tokens.extend(keys.into_iter().map(Into::into));
        Self::from_tokens(tokens)
    }

    fn from_tokens(tokens: impl IntoIterator<Item = String>) -> Self {
        let mut tokens: Vec<String> = tokens.into_iter().collect();
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        tokens.dedup();
        Self { tokens }
    }

    /// Longest token matching at the start of `text`, if any
    ///
    /// A token followed by `_` and another upper segment is an extended marker
    /// (`MODEL_NAME_EXTRA`), not a token with a glued suffix; it stays literal
    /// so rendering rejects the whole thing instead of splitting it.
    fn match_at(&self, text: &str) -> Option<&str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .find(|token| text.starts_with(token) && !continues_marker(&text[token.len()..]))
    }
}

/// Whether text begins with `_` plus an upper/digit marker segment
fn continues_marker(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('_')
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Template parser
pub struct TemplateParser;

impl TemplateParser {
    /// Parse template content with the builtin entity vocabulary
    pub fn parse(content: &str) -> Result<ParsedTemplate, TemplateError> {
        Self::parse_with_vocabulary(content, &TokenVocabulary::builtin())
    }

    /// Parse template content against a vocabulary
    ///
    /// Block structure is validated here (unclosed or mismatched regions are
    /// rejected); tokens outside the vocabulary stay in literal spans and are
    /// caught at substitution time.
    pub fn parse_with_vocabulary(
        content: &str,
        vocabulary: &TokenVocabulary,
    ) -> Result<ParsedTemplate, TemplateError> {
        let mut nodes = Vec::new();
        let mut placeholder_names = BTreeSet::new();
        let mut block_names = Vec::new();
        let mut text_buffer = String::new();

        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index];
            let trimmed = line.trim();

            if let Some(rest) = trimmed.strip_prefix(BLOCK_BEGIN) {
                flush_text(&mut text_buffer, vocabulary, &mut nodes, &mut placeholder_names);

                let begin_line = index + 1;
                let (name, separator) = parse_begin_marker(rest, begin_line)?;
                let (body_text, next_index) = collect_block_body(&lines, index + 1, &name)?;
                let body = parse_block_body(&body_text, vocabulary, &name, begin_line)?;

                for node in &body {
                    if let TemplateNode::Placeholder(token) = node {
                        placeholder_names.insert(token.clone());
                    }
                }
                block_names.push(name.clone());
                nodes.push(TemplateNode::Block {
                    name,
                    separator,
                    body,
                });
                index = next_index;
            } else if let Some(rest) = trimmed.strip_prefix(BLOCK_END) {
                return Err(TemplateError::InvalidBlock {
                    name: rest.trim().to_string(),
                    line: index + 1,
                    message: "end marker without a matching begin".to_string(),
                });
            } else {
                text_buffer.push_str(line);
                index += 1;
            }
        }

        flush_text(&mut text_buffer, vocabulary, &mut nodes, &mut placeholder_names);

        Ok(ParsedTemplate {
            nodes,
            placeholder_names,
            block_names,
        })
    }
}

/// Split accumulated literal text into literal/placeholder nodes
fn flush_text(
    buffer: &mut String,
    vocabulary: &TokenVocabulary,
    nodes: &mut Vec<TemplateNode>,
    placeholder_names: &mut BTreeSet<String>,
) {
    if buffer.is_empty() {
        return;
    }
    for node in scan_tokens(buffer, vocabulary) {
        if let TemplateNode::Placeholder(token) = &node {
            placeholder_names.insert(token.clone());
        }
        nodes.push(node);
    }
    buffer.clear();
}

/// Scan text for vocabulary tokens, longest match first at each position
fn scan_tokens(text: &str, vocabulary: &TokenVocabulary) -> Vec<TemplateNode> {
    let mut nodes = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(token) = vocabulary.match_at(rest) {
            if !literal.is_empty() {
                nodes.push(TemplateNode::Literal(std::mem::take(&mut literal)));
            }
            nodes.push(TemplateNode::Placeholder(token.to_string()));
            rest = &rest[token.len()..];
        } else {
            let ch = rest.chars().next().expect("rest is non-empty");
            literal.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }

    if !literal.is_empty() {
        nodes.push(TemplateNode::Literal(literal));
    }
    nodes
}

/// Parse the remainder of a begin marker: `name` or `name:SEP=...`
fn parse_begin_marker(rest: &str, line: usize) -> Result<(String, String), TemplateError> {
    let (name, separator) = match rest.split_once(":SEP=") {
        Some((name, sep)) => (name.trim(), unescape_separator(sep)),
        None => (rest.trim(), "\n".to_string()),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(TemplateError::InvalidBlock {
            name: name.to_string(),
            line,
            message: "block name must be a non-empty identifier".to_string(),
        });
    }

    Ok((name.to_string(), separator))
}

fn unescape_separator(raw: &str) -> String {
    let mut out = String::new();
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Collect raw body lines until the matching end marker
///
/// Returns the body text (without the final line break) and the index of the
/// line after the end marker.
fn collect_block_body(
    lines: &[&str],
    start: usize,
    name: &str,
) -> Result<(String, usize), TemplateError> {
    let mut body = String::new();
    let mut index = start;

    while index < lines.len() {
        let trimmed = lines[index].trim();
        if let Some(rest) = trimmed.strip_prefix(BLOCK_END) {
            if rest.trim() == name {
                let body = body
                    .strip_suffix('\n')
                    .map(|s| s.to_string())
                    .unwrap_or(body);
                return Ok((body, index + 1));
            }
            return Err(TemplateError::InvalidBlock {
                name: name.to_string(),
                line: index + 1,
                message: format!("expected BLOCK_END:{name}, found BLOCK_END:{}", rest.trim()),
            });
        }
        body.push_str(lines[index]);
        index += 1;
    }

    Err(TemplateError::InvalidBlock {
        name: name.to_string(),
        line: start,
        message: "missing end marker".to_string(),
    })
}

/// Parse a block body; nested blocks are rejected
fn parse_block_body(
    body: &str,
    vocabulary: &TokenVocabulary,
    name: &str,
    line: usize,
) -> Result<Vec<TemplateNode>, TemplateError> {
    if body.lines().any(|l| l.trim().starts_with(BLOCK_BEGIN)) {
        return Err(TemplateError::InvalidBlock {
            name: name.to_string(),
            line,
            message: "nested blocks are not supported".to_string(),
        });
    }
    Ok(scan_tokens(body, vocabulary))
}
