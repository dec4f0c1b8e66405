//! Repeated-block expansion for aggregator templates
//!
//! Manager-style templates carry one line per entity in several regions
//! (declarations, constructor wiring, accessors). Every region iterates the
//! owning group's entities in declared order, so line *k* across regions
//! always refers to the same entity.

use tracing::warn;

use crate::error::TemplateError;
use crate::naming::NameSet;
use crate::templates::parser::{ParsedTemplate, TemplateNode};
use crate::templates::substitutor::{
    ensure_no_markers, PlaceholderSubstitutor, SharedContext, TOKEN_SCHEMA_NAME,
};

/// Expands per-entity repeated regions inside aggregator templates
pub struct BlockExpander<'a> {
    /// Name sets for the group's entities, in declared order
    entities: &'a [NameSet],
    /// Owning schema group name, bound to SCHEMA_NAME outside regions
    schema: &'a str,
    context: &'a SharedContext,
}

impl<'a> BlockExpander<'a> {
    /// Create an expander over one schema group
    ///
    /// `entities` must be in the group's declared order.
    pub fn new(entities: &'a [NameSet], schema: &'a str, context: &'a SharedContext) -> Self {
        Self {
            entities,
            schema,
            context,
        }
    }

    /// Render an aggregator template
    ///
    /// Each region's body is rendered once per entity and joined with the
    /// region separator. Outside regions only SCHEMA_NAME and shared-context
    /// tokens resolve; an entity token there has no single entity to bind to
    /// and is an error. An empty group produces empty regions (the template
    /// frame still renders); this is logged, not an error.
    pub fn expand(&self, template: &ParsedTemplate) -> Result<String, TemplateError> {
        let mut output = String::new();

        for node in &template.nodes {
            match node {
                TemplateNode::Literal(text) => {
                    ensure_no_markers(text)?;
                    output.push_str(text);
                }
                TemplateNode::Placeholder(token) => {
                    output.push_str(self.resolve_group_token(token)?);
                }
                TemplateNode::Block {
                    name,
                    separator,
                    body,
                } => {
                    let expanded = self.expand_block(name, separator, body)?;
                    output.push_str(&expanded);
                }
            }
        }

        Ok(output)
    }

    fn resolve_group_token(&self, token: &str) -> Result<&str, TemplateError> {
        if token == TOKEN_SCHEMA_NAME {
            return Ok(self.schema);
        }
        self.context
            .get(token)
            .ok_or_else(|| TemplateError::UnresolvedPlaceholder {
                token: token.to_string(),
            })
    }

    fn expand_block(
        &self,
        name: &str,
        separator: &str,
        body: &[TemplateNode],
    ) -> Result<String, TemplateError> {
        if self.entities.is_empty() {
            warn!(block = name, schema = self.schema, "expanding repeated block over empty group");
            return Ok(String::new());
        }

        let mut lines = Vec::with_capacity(self.entities.len());
        for names in self.entities {
            let substitutor = PlaceholderSubstitutor::new(names, self.context);
            lines.push(substitutor.render_nodes(body)?);
        }

        // The marker lines occupied whole lines, so the expansion does too.
        let mut expanded = lines.join(separator);
        expanded.push('\n');
        Ok(expanded)
    }
}
