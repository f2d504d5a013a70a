//! Page templates for gigboard.
//!
//! Templates use `{{ path.to.value }}` for escaped output and `{% ... %}` tags
//! for `if`/`else`, `for x in list`, `block`, `extends` and `tailwind`. A page
//! that extends a layout only contributes its blocks; everything else comes
//! from the layout.
//!
//! Handlers usually build the context from a view struct with `context_from`.

use crate::error::{Error, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Debug tracing of tokens and trees, off unless `set_display_logs(true)`.
static DISPLAY_LOGS: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(false));

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{\{.*?\}\}|\{%.*?%\})").expect("valid token regex"));

pub fn set_display_logs(enabled: bool) {
    DISPLAY_LOGS.store(enabled, Ordering::Relaxed);
}

macro_rules! tdebug {
    ($($arg:tt)+) => {
        if DISPLAY_LOGS.load(Ordering::Relaxed) {
            debug!($($arg)+);
        }
    }
}

/// A value reachable from a template variable.
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateValue {
    Null,
    String(String),
    Bool(bool),
    Int(i64),
    Number(f64),
    List(Vec<TemplateValue>),
    Object(HashMap<String, TemplateValue>),
}

impl TemplateValue {
    /// Text printed for `{{ value }}`, before escaping.
    pub fn as_string(&self) -> String {
        match self {
            TemplateValue::String(s) => s.clone(),
            TemplateValue::Bool(b) => b.to_string(),
            TemplateValue::Int(n) => n.to_string(),
            TemplateValue::Number(n) => n.to_string(),
            TemplateValue::Null | TemplateValue::List(_) | TemplateValue::Object(_) => {
                String::new()
            }
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            TemplateValue::Null => false,
            TemplateValue::String(s) => !s.is_empty(),
            TemplateValue::Bool(b) => *b,
            TemplateValue::Int(n) => *n != 0,
            TemplateValue::Number(n) => *n != 0.0,
            TemplateValue::List(items) => !items.is_empty(),
            TemplateValue::Object(map) => !map.is_empty(),
        }
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<serde_json::Value> for TemplateValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => TemplateValue::Null,
            Value::Bool(b) => TemplateValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => TemplateValue::Int(i),
                None => TemplateValue::Number(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => TemplateValue::String(s),
            Value::Array(items) => {
                TemplateValue::List(items.into_iter().map(TemplateValue::from).collect())
            }
            Value::Object(map) => TemplateValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, TemplateValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::String(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::String(s)
    }
}

impl From<bool> for TemplateValue {
    fn from(b: bool) -> Self {
        TemplateValue::Bool(b)
    }
}

/// Build a context from a serializable value whose top level is a struct or map.
pub fn context_from<T: Serialize>(value: &T) -> Result<HashMap<String, TemplateValue>> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, TemplateValue::from(v)))
            .collect()),
        Ok(_) => Err(Error::Template(
            "template context must serialize to an object".to_string(),
        )),
        Err(e) => Err(Error::Template(format!("context serialization failed: {e}"))),
    }
}

/// Escapes `& < > " '` so output is safe in bodies and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub enum Token {
    Text(String),
    Variable(String),
    Tag(String),
}

#[derive(Debug, Clone)]
pub enum Node {
    Text(String),
    Variable(String),
    If {
        condition: String,
        then_body: Vec<Node>,
        else_body: Vec<Node>,
    },
    For {
        var_name: String,
        list_name: String,
        body: Vec<Node>,
    },
    Block {
        name: String,
        body: Vec<Node>,
    },
    /// Path of the layout, relative to the template directory.
    Extends(String),
    Tailwind,
}

pub fn tokenize_template(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut last_end = 0;
    for mat in TOKEN_RE.find_iter(content) {
        if mat.start() > last_end {
            tokens.push(Token::Text(content[last_end..mat.start()].to_string()));
        }
        let m = mat.as_str();
        let inner = m[2..m.len() - 2].trim().to_string();
        if m.starts_with("{{") {
            tdebug!("tokenize: variable {}", inner);
            tokens.push(Token::Variable(inner));
        } else {
            tdebug!("tokenize: tag {}", inner);
            tokens.push(Token::Tag(inner));
        }
        last_end = mat.end();
    }
    if last_end < content.len() {
        tokens.push(Token::Text(content[last_end..].to_string()));
    }
    tokens
}

pub fn parse_tokens(tokens: &[Token]) -> Vec<Node> {
    let mut idx = 0;
    parse_nodes(tokens, &mut idx, &[])
}

/// Parses until one of `end_tags` (left unconsumed) or the end of input.
fn parse_nodes(tokens: &[Token], idx: &mut usize, end_tags: &[&str]) -> Vec<Node> {
    let mut nodes = Vec::new();
    while let Some(token) = tokens.get(*idx) {
        match token {
            Token::Text(t) => nodes.push(Node::Text(t.clone())),
            Token::Variable(v) => nodes.push(Node::Variable(v.clone())),
            Token::Tag(tag) => {
                let tag = tag.trim();
                if end_tags.contains(&tag) {
                    break;
                }
                *idx += 1;
                match parse_tag(tag, tokens, idx) {
                    Some(node) => nodes.push(node),
                    None => tdebug!("parse: ignoring tag {}", tag),
                }
                continue;
            }
        }
        *idx += 1;
    }
    nodes
}

/// Builds the node for `tag`, whose token is already consumed. Block tags
/// also consume their body and closing tag.
fn parse_tag(tag: &str, tokens: &[Token], idx: &mut usize) -> Option<Node> {
    let (keyword, rest) = tag.split_once(' ').unwrap_or((tag, ""));
    let rest = rest.trim();
    let node = match keyword {
        "extends" => Node::Extends(rest.trim_matches('"').to_string()),
        "tailwind" => Node::Tailwind,
        "block" => Node::Block {
            name: rest.to_string(),
            body: parse_body(tokens, idx, "endblock"),
        },
        "if" => {
            let then_body = parse_nodes(tokens, idx, &["else", "endif"]);
            let else_body = match tokens.get(*idx) {
                Some(Token::Tag(t)) if t.trim() == "else" => {
                    *idx += 1;
                    parse_nodes(tokens, idx, &["endif"])
                }
                _ => Vec::new(),
            };
            *idx += 1;
            Node::If {
                condition: rest.to_string(),
                then_body,
                else_body,
            }
        }
        "for" => match rest.split_whitespace().collect::<Vec<_>>()[..] {
            [var_name, "in", list_name] => Node::For {
                var_name: var_name.to_string(),
                list_name: list_name.to_string(),
                body: parse_body(tokens, idx, "endfor"),
            },
            _ => return None,
        },
        _ => return None,
    };
    Some(node)
}

fn parse_body(tokens: &[Token], idx: &mut usize, end_tag: &str) -> Vec<Node> {
    let body = parse_nodes(tokens, idx, &[end_tag]);
    *idx += 1;
    body
}

/// Looks up `a.b.c`; only objects can be walked into.
fn resolve_variable<'a>(
    name: &str,
    context: &'a HashMap<String, TemplateValue>,
) -> Option<&'a TemplateValue> {
    let mut keys = name.split('.');
    let mut current = context.get(keys.next()?)?;
    for key in keys {
        match current {
            TemplateValue::Object(map) => current = map.get(key)?,
            _ => return None,
        }
    }
    Some(current)
}

/// `cond` or `not cond`; missing variables are false.
fn eval_condition(condition: &str, context: &HashMap<String, TemplateValue>) -> bool {
    match condition.strip_prefix("not ") {
        Some(inner) => !eval_condition(inner.trim(), context),
        None => resolve_variable(condition, context)
            .map(TemplateValue::is_truthy)
            .unwrap_or(false),
    }
}

/// Swaps each named block of the layout for the page's block of that name.
fn merge_blocks(nodes: &[Node], page_blocks: &HashMap<String, Vec<Node>>) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Block { name, body } => Node::Block {
                name: name.clone(),
                body: match page_blocks.get(name) {
                    Some(replacement) => replacement.clone(),
                    None => merge_blocks(body, page_blocks),
                },
            },
            Node::If {
                condition,
                then_body,
                else_body,
            } => Node::If {
                condition: condition.clone(),
                then_body: merge_blocks(then_body, page_blocks),
                else_body: merge_blocks(else_body, page_blocks),
            },
            Node::For {
                var_name,
                list_name,
                body,
            } => Node::For {
                var_name: var_name.clone(),
                list_name: list_name.clone(),
                body: merge_blocks(body, page_blocks),
            },
            other => other.clone(),
        })
        .collect()
}

pub fn render_nodes(nodes: &[Node], context: &HashMap<String, TemplateValue>) -> String {
    let mut out = String::new();
    render_into(&mut out, nodes, context);
    out
}

fn render_into(out: &mut String, nodes: &[Node], context: &HashMap<String, TemplateValue>) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Variable(name) => {
                if let Some(val) = resolve_variable(name, context) {
                    out.push_str(&escape_html(&val.as_string()));
                }
            }
            Node::If {
                condition,
                then_body,
                else_body,
            } => {
                let branch = if eval_condition(condition, context) {
                    then_body
                } else {
                    else_body
                };
                render_into(out, branch, context);
            }
            Node::For {
                var_name,
                list_name,
                body,
            } => {
                if let Some(TemplateValue::List(items)) = resolve_variable(list_name, context) {
                    let mut scope = context.clone();
                    for item in items {
                        scope.insert(var_name.clone(), item.clone());
                        render_into(out, body, &scope);
                    }
                }
            }
            Node::Block { body, .. } => render_into(out, body, context),
            Node::Extends(_) => {}
            Node::Tailwind => {
                out.push_str(r#"<script src="https://cdn.tailwindcss.com"></script>"#);
            }
        }
    }
}

fn load(dir: &Path, name: &str) -> Result<String> {
    std::fs::read_to_string(dir.join(name))
        .map_err(|e| Error::Template(format!("template '{}' not found: {}", name, e)))
}

/// Renders `template_name` from `dir`, inside its layout when it has an
/// `{% extends %}` tag.
pub fn render_template(
    dir: impl AsRef<Path>,
    template_name: &str,
    context: &HashMap<String, TemplateValue>,
) -> Result<String> {
    let dir = dir.as_ref();
    let page = parse_tokens(&tokenize_template(&load(dir, template_name)?));
    tdebug!("{} parsed: {:?}", template_name, page);

    let mut layout = None;
    let mut blocks = HashMap::new();
    for node in &page {
        match node {
            Node::Extends(path) => layout = Some(path.clone()),
            Node::Block { name, body } => {
                blocks.insert(name.clone(), body.clone());
            }
            _ => {}
        }
    }

    let merged = match layout {
        Some(path) => {
            let base = parse_tokens(&tokenize_template(&load(dir, &path)?));
            merge_blocks(&base, &blocks)
        }
        None => page,
    };
    Ok(render_nodes(&merged, context))
}
