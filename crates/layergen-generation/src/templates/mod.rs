//! Template parsing and rendering
//!
//! Templates are parsed once into a typed structure of literal spans,
//! placeholder tokens, and repeated-block regions; rendering walks that
//! structure instead of searching raw text, so literal content can never be
//! mistaken for a marker halfway through a run.

pub mod expander;
pub mod parser;
pub mod substitutor;

pub use expander::BlockExpander;
pub use parser::{ParsedTemplate, TemplateNode, TemplateParser, TokenVocabulary};
pub use substitutor::{PlaceholderSubstitutor, SharedContext};
