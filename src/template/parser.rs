//! Template parser module.
//!
//! Turns a template string into a tree of [`Node`]s. Supported tags:
//! `{{name}}`, `{{{name}}}`, `{{#if name}}..{{else}}..{{/if}}`,
//! `{{#unless name}}..{{/unless}}` and `{{#each name}}..{{/each}}`.

use super::{Result, TemplateError};

/// A node in the template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text.
    Text(String),

    /// Escaped value: `{{posting.title}}`
    Variable(String),

    /// Unescaped value: `{{{text_html}}}`
    Raw(String),

    /// `{{#if name}}...{{else}}...{{/if}}`
    If {
        condition: String,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },

    /// `{{#each name}}...{{/each}}`
    Each { variable: String, body: Vec<Node> },

    /// `{{#unless name}}...{{/unless}}`
    Unless { condition: String, body: Vec<Node> },
}

/// Template parser.
pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Parse the whole input.
    pub fn parse(mut self) -> Result<Vec<Node>> {
        let nodes = self.parse_until(None)?;
        if self.pos < self.input.len() {
            return Err(self.error("Unexpected closing tag"));
        }
        Ok(nodes)
    }

    /// Parse nodes until `{{/block}}` (or `{{else}}` inside an if) or end of input.
    fn parse_until(&mut self, block: Option<&str>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();

        while !self.at_end() {
            if self.rest().starts_with("{{/") {
                break;
            }
            if block == Some("if") && self.at_else() {
                break;
            }

            if self.rest().starts_with("{{") {
                nodes.push(self.parse_tag()?);
            } else {
                let end = self.rest().find("{{").unwrap_or(self.rest().len());
                nodes.push(Node::Text(self.rest()[..end].to_string()));
                self.pos += end;
            }
        }

        Ok(nodes)
    }

    fn parse_tag(&mut self) -> Result<Node> {
        if self.eat("{{{") {
            let name = self.tag_name()?;
            self.expect("}}}")?;
            return Ok(Node::Raw(name));
        }

        self.expect("{{")?;
        self.skip_whitespace();

        if self.eat("#") {
            return self.parse_block();
        }

        let name = self.tag_name()?;
        self.expect("}}")?;
        Ok(Node::Variable(name))
    }

    fn parse_block(&mut self) -> Result<Node> {
        let keyword = self.identifier()?;
        self.skip_whitespace();
        let name = self.tag_name()?;
        self.expect("}}")?;

        match keyword.as_str() {
            "if" => {
                let then_branch = self.parse_until(Some("if"))?;
                let else_branch = if self.at_else() {
                    self.expect("{{")?;
                    self.skip_whitespace();
                    self.expect("else")?;
                    self.skip_whitespace();
                    self.expect("}}")?;
                    self.parse_until(Some("if"))?
                } else {
                    Vec::new()
                };
                self.close("if")?;
                Ok(Node::If {
                    condition: name,
                    then_branch,
                    else_branch,
                })
            }
            "unless" => {
                let body = self.parse_until(Some("unless"))?;
                self.close("unless")?;
                Ok(Node::Unless {
                    condition: name,
                    body,
                })
            }
            "each" => {
                let body = self.parse_until(Some("each"))?;
                self.close("each")?;
                Ok(Node::Each {
                    variable: name,
                    body,
                })
            }
            other => Err(self.error(&format!("Unknown block tag: {other}"))),
        }
    }

    /// Consume `{{/block}}`.
    fn close(&mut self, block: &str) -> Result<()> {
        if self.at_end() {
            return Err(self.error(&format!("Unclosed {{{{#{block}}}}}")));
        }
        self.expect("{{/")?;
        self.skip_whitespace();
        let found = self.identifier()?;
        if found != block {
            return Err(self.error(&format!("Expected {{{{/{block}}}}}, found {{{{/{found}}}}}")));
        }
        self.expect("}}")
    }

    /// Identifier followed by optional whitespace.
    fn tag_name(&mut self) -> Result<String> {
        self.skip_whitespace();
        let name = self.identifier()?;
        self.skip_whitespace();
        Ok(name)
    }

    /// Variable name with dot notation (`posting.title`, `this`).
    fn identifier(&mut self) -> Result<String> {
        let len = self
            .rest()
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '-')))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("Expected identifier"));
        }
        let ident = self.rest()[..len].to_string();
        self.pos += len;
        Ok(ident)
    }

    fn at_else(&self) -> bool {
        let rest = self.rest();
        rest.strip_prefix("{{")
            .map(|r| r.trim_start())
            .and_then(|r| r.strip_prefix("else"))
            .map(|r| r.trim_start().starts_with("}}"))
            .unwrap_or(false)
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> Result<()> {
        if self.eat(s) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected '{s}'")))
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, message: &str) -> TemplateError {
        let line = self.input[..self.pos].matches('\n').count() + 1;
        let near: String = self.rest().chars().take(12).collect();
        TemplateError::Parse(format!("{message} at line {line} near '{near}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<Node> {
        Parser::new(input).parse().unwrap()
    }

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    fn var(s: &str) -> Node {
        Node::Variable(s.to_string())
    }

    #[test]
    fn test_parse_subject_line() {
        assert_eq!(
            parse("Bitte bestätigen: {{title}}\n"),
            vec![text("Bitte bestätigen: "), var("title"), text("\n")]
        );
    }

    #[test]
    fn test_parse_dotted_and_padded_names() {
        assert_eq!(
            parse("{{ posting.title }}/{{posting.uuid}}"),
            vec![var("posting.title"), text("/"), var("posting.uuid")]
        );
    }

    #[test]
    fn test_parse_raw() {
        assert_eq!(
            parse("<div>{{{ text_html }}}</div>"),
            vec![
                text("<div>"),
                Node::Raw("text_html".to_string()),
                text("</div>")
            ]
        );
    }

    #[test]
    fn test_parse_if_else() {
        assert_eq!(
            parse("{{#if postings}}Liste{{ else }}Leer{{/if}}"),
            vec![Node::If {
                condition: "postings".to_string(),
                then_branch: vec![text("Liste")],
                else_branch: vec![text("Leer")],
            }]
        );
    }

    #[test]
    fn test_parse_unless_inside_each() {
        assert_eq!(
            parse("{{#each postings}}{{#unless deleted}}{{title}}{{/unless}}{{/each}}"),
            vec![Node::Each {
                variable: "postings".to_string(),
                body: vec![Node::Unless {
                    condition: "deleted".to_string(),
                    body: vec![var("title")],
                }],
            }]
        );
    }

    #[test]
    fn test_parse_else_belongs_to_inner_if() {
        let nodes = parse("{{#if a}}{{#if b}}1{{else}}2{{/if}}{{/if}}");
        let Node::If {
            then_branch,
            else_branch,
            ..
        } = &nodes[0]
        else {
            panic!("expected if");
        };
        assert!(else_branch.is_empty());
        assert_eq!(
            then_branch[0],
            Node::If {
                condition: "b".to_string(),
                then_branch: vec![text("1")],
                else_branch: vec![text("2")],
            }
        );
    }

    #[test]
    fn test_parse_page_templates() {
        for source in [
            include_str!("../../templates/pages/layout.html"),
            include_str!("../../templates/pages/form.html"),
            include_str!("../../templates/pages/feed.xml"),
        ] {
            assert!(Parser::new(source).parse().is_ok());
        }
    }

    #[test]
    fn test_parse_errors() {
        for input in [
            "{{title",
            "{{{title}}",
            "{{#if verified}}offen",
            "{{#if a}}x{{/each}}",
            "{{#with posting}}x{{/with}}",
            "x{{/if}}",
            "{{}}",
        ] {
            assert!(
                matches!(Parser::new(input).parse(), Err(TemplateError::Parse(_))),
                "{input} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_error_reports_line() {
        let Err(TemplateError::Parse(message)) = Parser::new("a\nb\n{{#each}}").parse() else {
            panic!("expected parse error");
        };
        assert!(message.contains("line 3"), "{message}");
    }
}
