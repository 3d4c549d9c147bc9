//! Template engine module for Boerse.
//!
//! Provides a Handlebars-style template engine used for HTML pages,
//! notification mails and the RSS feed.
//!
//! # Features
//!
//! - Variable expansion: `{{variable}}` (escaped in HTML mode)
//! - Raw expansion: `{{{variable}}}` (never escaped)
//! - Conditionals: `{{#if condition}}...{{else}}...{{/if}}`
//! - Negation: `{{#unless condition}}...{{/unless}}`
//! - Loops: `{{#each items}}...{{/each}}`, items bound to `this`
//!
//! # Example
//!
//! ```
//! use boerse::template::{EscapeMode, TemplateContext, TemplateEngine, Value};
//!
//! let mut engine = TemplateEngine::new(EscapeMode::Html);
//! engine.load("greeting", "Hello, {{name}}!").unwrap();
//!
//! let mut context = TemplateContext::new();
//! context.set("name", Value::string("<World>"));
//!
//! let result = engine.render("greeting", &context).unwrap();
//! assert_eq!(result, "Hello, &lt;World&gt;!");
//! ```

mod parser;
mod renderer;

use std::collections::HashMap;

use thiserror::Error;

pub use parser::{Node, Parser};
pub use renderer::Renderer;

/// Template-related errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Template not found.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Render error.
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// How `{{variable}}` output is escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    /// Escape `& < > " '` (HTML and XML output).
    #[default]
    Html,
    /// Emit values verbatim (plain-text mails).
    None,
}

/// Escape text for HTML or XML content and attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A value that can be used in templates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A string value.
    String(String),
    /// A numeric value.
    Number(i64),
    /// A boolean value.
    Bool(bool),
    /// A list of values.
    List(Vec<Value>),
    /// An object (key-value pairs).
    Object(HashMap<String, Value>),
    /// A null/empty value.
    Null,
}

impl Value {
    /// Convert the value to a string for display.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(_) => "[list]".to_string(),
            Value::Object(_) => "[object]".to_string(),
            Value::Null => "".to_string(),
        }
    }

    /// Check if the value is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::List(l) => !l.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Null => false,
        }
    }

    /// Get a nested value by dot-separated path.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;

        for part in path.split('.') {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::List(list) => {
                    let index: usize = part.parse().ok()?;
                    current = list.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    /// Create a Value from a string.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Create a list Value.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(items)
    }

    /// Start building an object Value.
    pub fn object() -> ObjectBuilder {
        ObjectBuilder::default()
    }
}

/// Builder for object values.
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    map: HashMap<String, Value>,
}

impl ObjectBuilder {
    /// Add a field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map.insert(key.into(), value.into());
        self
    }

    /// Finish the object.
    pub fn build(self) -> Value {
        Value::Object(self.map)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Context for template rendering.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, Value>,
}

impl TemplateContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable in the context.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Builder-style `set`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a variable; `a.b.c` walks into objects and lists.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.variables.get(name) {
            return Some(value);
        }

        let (root, rest) = name.split_once('.')?;
        self.variables.get(root)?.get_path(rest)
    }

    /// Create a child context inheriting all variables.
    pub fn child(&self) -> Self {
        self.clone()
    }
}

/// Template engine for parsing and rendering named templates.
#[derive(Debug, Default)]
pub struct TemplateEngine {
    templates: HashMap<String, Vec<Node>>,
    escape: EscapeMode,
}

impl TemplateEngine {
    /// Create a new template engine with the given escape mode.
    pub fn new(escape: EscapeMode) -> Self {
        Self {
            templates: HashMap::new(),
            escape,
        }
    }

    /// Parse and store a template.
    pub fn load(&mut self, name: impl Into<String>, content: &str) -> Result<()> {
        let name = name.into();
        let nodes = Parser::new(content)
            .parse()
            .map_err(|e| TemplateError::Parse(format!("{name}: {e}")))?;
        self.templates.insert(name, nodes);
        Ok(())
    }

    /// Parse and store several templates.
    pub fn load_all(&mut self, sources: &[(&str, &str)]) -> Result<()> {
        for (name, content) in sources {
            self.load(*name, content)?;
        }
        Ok(())
    }

    /// Render a template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let nodes = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        Renderer::new(context, self.escape).render(nodes)
    }

    /// Check if a template is loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Escape mode of this engine.
    pub fn escape_mode(&self) -> EscapeMode {
        self.escape
    }
}
