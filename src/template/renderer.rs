//! Template renderer module.
//!
//! Renders parsed template nodes with the given context.

use super::parser::Node;
use super::{html_escape, EscapeMode, Result, TemplateContext, TemplateError, Value};

/// Template renderer.
pub struct Renderer<'a> {
    context: &'a TemplateContext,
    escape: EscapeMode,
}

impl<'a> Renderer<'a> {
    /// Create a new renderer with the given context and escape mode.
    pub fn new(context: &'a TemplateContext, escape: EscapeMode) -> Self {
        Self { context, escape }
    }

    /// Render a list of nodes to a string.
    pub fn render(&self, nodes: &[Node]) -> Result<String> {
        let mut output = String::new();
        for node in nodes {
            self.render_node(node, &mut output)?;
        }
        Ok(output)
    }

    fn render_node(&self, node: &Node, out: &mut String) -> Result<()> {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable(name) => {
                let value = self.lookup(name);
                match self.escape {
                    EscapeMode::Html => out.push_str(&html_escape(&value)),
                    EscapeMode::None => out.push_str(&value),
                }
            }
            Node::Raw(name) => out.push_str(&self.lookup(name)),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let branch = if self.is_truthy(condition) {
                    then_branch
                } else {
                    else_branch
                };
                out.push_str(&self.render(branch)?);
            }
            Node::Unless { condition, body } => {
                if !self.is_truthy(condition) {
                    out.push_str(&self.render(body)?);
                }
            }
            Node::Each { variable, body } => self.render_each(variable, body, out)?,
        }
        Ok(())
    }

    /// Missing variables render as the empty string, like Handlebars.
    fn lookup(&self, name: &str) -> String {
        self.context
            .get(name)
            .map(|v| v.to_display_string())
            .unwrap_or_default()
    }

    fn is_truthy(&self, name: &str) -> bool {
        self.context
            .get(name)
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    /// Each item is bound to `this`; object fields are also reachable directly.
    fn render_each(&self, variable: &str, body: &[Node], out: &mut String) -> Result<()> {
        let list = match self.context.get(variable) {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => return Ok(()),
            Some(_) => {
                return Err(TemplateError::Render(format!("'{variable}' is not a list")));
            }
        };

        for item in list {
            let mut child_context = self.context.child();
            child_context.set("this", item.clone());
            if let Value::Object(obj) = item {
                for (key, value) in obj {
                    child_context.set(key.clone(), value.clone());
                }
            }

            out.push_str(&Renderer::new(&child_context, self.escape).render(body)?);
        }

        Ok(())
    }
}
