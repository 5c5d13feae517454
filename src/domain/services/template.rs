//! Template engine
//!
//! A small Jinja-flavoured language used for composition entries and
//! component content:
//!
//! - `{{ path }}` and `{{ path | filter(arg) }}` interpolation
//! - `{% if cond %}…{% elif cond %}…{% else %}…{% endif %}`
//! - `{% for item in path %}…{% endfor %}` with `loop.index`, `loop.index0`,
//!   `loop.first`, `loop.last`, `loop.length`
//! - `{# comments #}`
//! - `{%-` / `-%}` (and the `{{`/`}}` equivalents) strip adjacent whitespace
//!
//! Undefined paths render as empty text and are falsy. They are reported in
//! [`Rendered::undefined`] instead of failing the render.

use std::collections::BTreeSet;

use serde_json::{json, Map, Number, Value};

use crate::error::PalResult;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct TemplateError {
    pub line: usize,
    pub message: String,
}

impl TemplateError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Resolves `alias.component` references while rendering.
pub trait ComponentSource {
    /// The rendered component, or `None` when `alias` is not an import alias.
    ///
    /// Placeholders left undefined inside the component are reported as
    /// undefined in the enclosing render.
    fn component(&self, alias: &str, name: &str) -> Option<PalResult<Rendered>>;
}

pub struct RenderContext<'a> {
    vars: &'a Map<String, Value>,
    components: Option<&'a dyn ComponentSource>,
}

impl<'a> RenderContext<'a> {
    pub fn new(vars: &'a Map<String, Value>) -> Self {
        Self {
            vars,
            components: None,
        }
    }

    pub fn with_components(mut self, components: &'a dyn ComponentSource) -> Self {
        self.components = Some(components);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Dotted paths that were referenced but had no value.
    pub undefined: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Output(Expr),
    If {
        branches: Vec<(Cond, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
    For {
        var: String,
        iterable: Expr,
        body: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Expr {
    operand: Operand,
    filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Path(Vec<String>),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Upper,
    Lower,
    Title,
    Trim,
    Length,
    Join(String),
    Default(Value),
    Json,
}

#[derive(Debug, Clone, PartialEq)]
enum Cond {
    Test(Expr),
    Not(Box<Cond>),
    Eq(Expr, Expr),
    Ne(Expr, Expr),
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let segments = lex(source)?;
        let mut parser = Parser {
            segments,
            pos: 0,
        };
        let nodes = parser.parse_root()?;
        Ok(Self { nodes })
    }

    /// True when the template contains no expressions or tags.
    pub fn is_static(&self) -> bool {
        self.nodes.iter().all(|n| matches!(n, Node::Text(_)))
    }

    pub fn render(&self, ctx: &RenderContext<'_>) -> PalResult<Rendered> {
        let mut renderer = Renderer {
            ctx,
            locals: Vec::new(),
            out: String::new(),
            undefined: BTreeSet::new(),
        };
        renderer.render_nodes(&self.nodes)?;
        Ok(Rendered {
            text: renderer.out,
            undefined: renderer.undefined,
        })
    }

    /// Root names of every path the template reads, excluding loop-bound names.
    pub fn referenced_variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut bound = Vec::new();
        collect_nodes(&self.nodes, &mut bound, &mut out);
        out
    }
}

// ── Lexing ────────────────────────────────────────────────────────

#[derive(Debug)]
enum Segment {
    Text(String),
    Output { body: String, line: usize },
    Tag { body: String, line: usize },
}

fn lex(source: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = source;
    let mut offset = 0usize;
    let mut trim_next = false;

    loop {
        let Some(start) = find_opener(rest) else {
            push_text(&mut segments, rest, trim_next, false);
            break;
        };

        let opener = &rest[start..start + 2];
        let close = match opener {
            "{{" => "}}",
            "{%" => "%}",
            _ => "#}",
        };
        let after_open = &rest[start + 2..];
        let trim_before = after_open.starts_with('-');
        push_text(&mut segments, &rest[..start], trim_next, trim_before);

        let line = line_at(source, offset + start);
        let Some(end) = after_open.find(close) else {
            return Err(TemplateError::new(line, format!("unclosed '{}'", opener)));
        };

        let mut body = &after_open[..end];
        if trim_before {
            body = &body[1..];
        }
        trim_next = body.ends_with('-');
        if trim_next {
            body = &body[..body.len() - 1];
        }
        let body = body.trim().to_string();

        match opener {
            "{{" => segments.push(Segment::Output { body, line }),
            "{%" => segments.push(Segment::Tag { body, line }),
            _ => {}
        }

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    Ok(segments)
}

fn find_opener(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    (0..bytes.len().saturating_sub(1))
        .find(|&i| bytes[i] == b'{' && matches!(bytes[i + 1], b'{' | b'%' | b'#'))
}

fn push_text(segments: &mut Vec<Segment>, text: &str, trim_start: bool, trim_end: bool) {
    let mut t = text;
    if trim_start {
        t = t.trim_start();
    }
    if trim_end {
        t = t.trim_end();
    }
    if !t.is_empty() {
        segments.push(Segment::Text(t.to_string()));
    }
}

fn line_at(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

// ── Block parsing ─────────────────────────────────────────────────

struct Stop {
    keyword: String,
    rest: String,
    line: usize,
}

struct Parser {
    segments: Vec<Segment>,
    pos: usize,
}

impl Parser {
    fn parse_root(&mut self) -> Result<Vec<Node>, TemplateError> {
        let (nodes, _) = self.parse_until(&[], 0)?;
        Ok(nodes)
    }

    fn parse_block(
        &mut self,
        stops: &[&str],
        open_line: usize,
    ) -> Result<(Vec<Node>, Stop), TemplateError> {
        match self.parse_until(stops, open_line)? {
            (nodes, Some(stop)) => Ok((nodes, stop)),
            (_, None) => Err(TemplateError::new(
                open_line,
                format!("unclosed block, expected '{}'", stops.join("' or '")),
            )),
        }
    }

    fn parse_until(
        &mut self,
        stops: &[&str],
        open_line: usize,
    ) -> Result<(Vec<Node>, Option<Stop>), TemplateError> {
        let mut nodes = Vec::new();

        while self.pos < self.segments.len() {
            let segment = std::mem::replace(&mut self.segments[self.pos], Segment::Text(String::new()));
            self.pos += 1;

            match segment {
                Segment::Text(text) => nodes.push(Node::Text(text)),
                Segment::Output { body, line } => {
                    let mut p = ExprParser::new(&body, line)?;
                    let expr = p.parse_expr()?;
                    p.expect_end()?;
                    nodes.push(Node::Output(expr));
                }
                Segment::Tag { body, line } => {
                    let (keyword, rest) = split_keyword(&body);
                    match keyword {
                        "if" => nodes.push(self.parse_if(rest, line)?),
                        "for" => nodes.push(self.parse_for(rest, line)?),
                        kw if stops.contains(&kw) => {
                            return Ok((
                                nodes,
                                Some(Stop {
                                    keyword: kw.to_string(),
                                    rest: rest.to_string(),
                                    line,
                                }),
                            ));
                        }
                        "elif" | "else" | "endif" | "endfor" => {
                            return Err(TemplateError::new(
                                line,
                                format!("unexpected '{}'", keyword),
                            ));
                        }
                        "" => return Err(TemplateError::new(line, "empty tag")),
                        other => {
                            return Err(TemplateError::new(line, format!("unknown tag '{}'", other)));
                        }
                    }
                }
            }
        }

        if stops.is_empty() {
            Ok((nodes, None))
        } else {
            Err(TemplateError::new(
                open_line,
                format!("unclosed block, expected '{}'", stops.join("' or '")),
            ))
        }
    }

    fn parse_if(&mut self, cond_src: &str, line: usize) -> Result<Node, TemplateError> {
        let mut branches = Vec::new();
        let mut cond = parse_cond_str(cond_src, line)?;

        loop {
            let (body, stop) = self.parse_block(&["elif", "else", "endif"], line)?;
            branches.push((cond, body));
            match stop.keyword.as_str() {
                "elif" => cond = parse_cond_str(&stop.rest, stop.line)?,
                "else" => {
                    let (otherwise, _) = self.parse_block(&["endif"], line)?;
                    return Ok(Node::If {
                        branches,
                        otherwise,
                    });
                }
                _ => {
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                    })
                }
            }
        }
    }

    fn parse_for(&mut self, header: &str, line: usize) -> Result<Node, TemplateError> {
        let mut p = ExprParser::new(header, line)?;
        let var = match p.next() {
            Some(Token::Ident(name)) if !name.contains('.') && !is_keyword(&name) => name,
            _ => return Err(TemplateError::new(line, "expected loop variable after 'for'")),
        };
        match p.next() {
            Some(Token::Ident(kw)) if kw == "in" => {}
            _ => return Err(TemplateError::new(line, "expected 'in' in for loop")),
        }
        let iterable = p.parse_expr()?;
        p.expect_end()?;

        let (body, _) = self.parse_block(&["endfor"], line)?;
        Ok(Node::For {
            var,
            iterable,
            body,
        })
    }
}

fn split_keyword(body: &str) -> (&str, &str) {
    match body.split_once(char::is_whitespace) {
        Some((kw, rest)) => (kw, rest.trim()),
        None => (body, ""),
    }
}

fn parse_cond_str(src: &str, line: usize) -> Result<Cond, TemplateError> {
    let mut p = ExprParser::new(src, line)?;
    let cond = p.parse_cond()?;
    p.expect_end()?;
    Ok(cond)
}

// ── Expressions ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(Number),
    Pipe,
    LParen,
    RParen,
    Comma,
    EqEq,
    NotEq,
}

fn is_keyword(word: &str) -> bool {
    matches!(word, "not" | "and" | "or" | "in")
}

fn tokenize(input: &str, line: usize) -> Result<Vec<Token>, TemplateError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::EqEq);
                i += 2;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::NotEq);
                i += 2;
            }
            '"' | '\'' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                loop {
                    let Some(&ch) = chars.get(i) else {
                        return Err(TemplateError::new(line, "unterminated string literal"));
                    };
                    if ch == '\\' {
                        match chars.get(i + 1) {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some(&other) => s.push(other),
                            None => {
                                return Err(TemplateError::new(line, "unterminated string literal"))
                            }
                        }
                        i += 2;
                        continue;
                    }
                    i += 1;
                    if ch == quote {
                        break;
                    }
                    s.push(ch);
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                let number = if raw.contains('.') {
                    raw.parse::<f64>().ok().and_then(Number::from_f64)
                } else {
                    raw.parse::<i64>().ok().map(Number::from)
                };
                match number {
                    Some(n) => tokens.push(Token::Num(n)),
                    None => return Err(TemplateError::new(line, format!("invalid number '{}'", raw))),
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || matches!(chars[i], '_' | '.' | '-'))
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(TemplateError::new(
                    line,
                    format!("unexpected character '{}'", other),
                ))
            }
        }
    }

    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
    line: usize,
}

impl ExprParser {
    fn new(src: &str, line: usize) -> Result<Self, TemplateError> {
        Ok(Self {
            tokens: tokenize(src, line)?,
            pos: 0,
            line,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(w)) if w == keyword)
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::new(self.line, message)
    }

    fn expect_end(&self) -> Result<(), TemplateError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected {:?}", token))),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, TemplateError> {
        let operand = self.parse_operand()?;
        let mut filters = Vec::new();
        while matches!(self.peek(), Some(Token::Pipe)) {
            self.next();
            filters.push(self.parse_filter()?);
        }
        Ok(Expr { operand, filters })
    }

    fn parse_operand(&mut self) -> Result<Operand, TemplateError> {
        match self.next() {
            Some(Token::Ident(word)) => match word.as_str() {
                "true" | "True" => Ok(Operand::Literal(Value::Bool(true))),
                "false" | "False" => Ok(Operand::Literal(Value::Bool(false))),
                "none" | "None" | "null" => Ok(Operand::Literal(Value::Null)),
                kw if is_keyword(kw) => Err(self.error(format!("unexpected '{}'", kw))),
                _ => {
                    let segments: Vec<String> = word.split('.').map(str::to_string).collect();
                    if segments.iter().any(|s| s.is_empty()) {
                        return Err(self.error(format!("invalid name '{}'", word)));
                    }
                    Ok(Operand::Path(segments))
                }
            },
            Some(Token::Str(s)) => Ok(Operand::Literal(Value::String(s))),
            Some(Token::Num(n)) => Ok(Operand::Literal(Value::Number(n))),
            Some(other) => Err(self.error(format!("expected a value, found {:?}", other))),
            None => Err(self.error("expected a value")),
        }
    }

    fn parse_literal(&mut self) -> Result<Value, TemplateError> {
        match self.parse_operand()? {
            Operand::Literal(v) => Ok(v),
            Operand::Path(p) => Err(self.error(format!(
                "filter arguments must be literals, found '{}'",
                p.join(".")
            ))),
        }
    }

    fn parse_filter(&mut self) -> Result<Filter, TemplateError> {
        let name = match self.next() {
            Some(Token::Ident(name)) => name,
            _ => return Err(self.error("expected filter name after '|'")),
        };

        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::LParen)) {
            self.next();
            if !matches!(self.peek(), Some(Token::RParen)) {
                loop {
                    args.push(self.parse_literal()?);
                    match self.next() {
                        Some(Token::Comma) => continue,
                        Some(Token::RParen) => break,
                        _ => return Err(self.error("expected ',' or ')' in filter arguments")),
                    }
                }
            } else {
                self.next();
            }
        }

        let mut args = args.into_iter();
        let filter = match name.as_str() {
            "upper" => Filter::Upper,
            "lower" => Filter::Lower,
            "title" => Filter::Title,
            "trim" => Filter::Trim,
            "length" | "count" => Filter::Length,
            "json" | "tojson" => Filter::Json,
            "join" => Filter::Join(args.next().map(|v| value_to_text(&v)).unwrap_or_default()),
            "default" | "d" => Filter::Default(args.next().unwrap_or(Value::String(String::new()))),
            other => return Err(self.error(format!("unknown filter '{}'", other))),
        };
        Ok(filter)
    }

    fn parse_cond(&mut self) -> Result<Cond, TemplateError> {
        let mut left = self.parse_and()?;
        while self.peek_keyword("or") {
            self.next();
            let right = self.parse_and()?;
            left = Cond::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Cond, TemplateError> {
        let mut left = self.parse_not()?;
        while self.peek_keyword("and") {
            self.next();
            let right = self.parse_not()?;
            left = Cond::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Cond, TemplateError> {
        if self.peek_keyword("not") {
            self.next();
            return Ok(Cond::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Cond, TemplateError> {
        if matches!(self.peek(), Some(Token::LParen)) {
            self.next();
            let inner = self.parse_cond()?;
            return match self.next() {
                Some(Token::RParen) => Ok(inner),
                _ => Err(self.error("expected ')'")),
            };
        }

        let left = self.parse_expr()?;
        match self.peek() {
            Some(Token::EqEq) => {
                self.next();
                Ok(Cond::Eq(left, self.parse_expr()?))
            }
            Some(Token::NotEq) => {
                self.next();
                Ok(Cond::Ne(left, self.parse_expr()?))
            }
            _ => Ok(Cond::Test(left)),
        }
    }
}

// ── Rendering ─────────────────────────────────────────────────────

struct Renderer<'r, 'a> {
    ctx: &'r RenderContext<'a>,
    locals: Vec<(String, Value)>,
    out: String,
    undefined: BTreeSet<String>,
}

impl Renderer<'_, '_> {
    fn render_nodes(&mut self, nodes: &[Node]) -> PalResult<()> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.push_str(text),
                Node::Output(expr) => {
                    if let Some(value) = self.eval(expr)? {
                        self.out.push_str(&value_to_text(&value));
                    }
                }
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut taken = false;
                    for (cond, body) in branches {
                        if self.test(cond)? {
                            self.render_nodes(body)?;
                            taken = true;
                            break;
                        }
                    }
                    if !taken {
                        self.render_nodes(otherwise)?;
                    }
                }
                Node::For {
                    var,
                    iterable,
                    body,
                } => {
                    let items = match self.eval(iterable)? {
                        Some(Value::Array(items)) => items,
                        Some(Value::Object(map)) => map.keys().cloned().map(Value::String).collect(),
                        _ => Vec::new(),
                    };
                    let length = items.len();
                    for (index, item) in items.into_iter().enumerate() {
                        self.locals.push((var.clone(), item));
                        self.locals.push((
                            "loop".to_string(),
                            json!({
                                "index": index + 1,
                                "index0": index,
                                "first": index == 0,
                                "last": index + 1 == length,
                                "length": length,
                            }),
                        ));
                        let result = self.render_nodes(body);
                        self.locals.pop();
                        self.locals.pop();
                        result?;
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> PalResult<Option<Value>> {
        let mut value = match &expr.operand {
            Operand::Literal(v) => Some(v.clone()),
            Operand::Path(path) => self.lookup(path)?,
        };
        for filter in &expr.filters {
            value = apply_filter(filter, value);
        }
        if value.is_none() {
            if let Operand::Path(path) = &expr.operand {
                self.undefined.insert(path.join("."));
            }
        }
        Ok(value)
    }

    fn lookup(&mut self, path: &[String]) -> PalResult<Option<Value>> {
        let Some((root, rest)) = path.split_first() else {
            return Ok(None);
        };

        let base = self
            .locals
            .iter()
            .rev()
            .find(|(name, _)| name == root)
            .map(|(_, v)| v)
            .or_else(|| self.ctx.vars.get(root.as_str()));

        if let Some(base) = base {
            return Ok(descend(base, rest).cloned());
        }

        if let ([name], Some(components)) = (rest, self.ctx.components) {
            if let Some(result) = components.component(root, name) {
                let rendered = result?;
                self.undefined.extend(rendered.undefined);
                return Ok(Some(Value::String(rendered.text)));
            }
        }

        Ok(None)
    }

    fn test(&mut self, cond: &Cond) -> PalResult<bool> {
        Ok(match cond {
            Cond::Test(expr) => is_truthy(self.eval(expr)?.as_ref()),
            Cond::Not(inner) => !self.test(inner)?,
            Cond::Eq(a, b) => values_equal(self.eval(a)?, self.eval(b)?),
            Cond::Ne(a, b) => !values_equal(self.eval(a)?, self.eval(b)?),
            Cond::And(a, b) => self.test(a)? && self.test(b)?,
            Cond::Or(a, b) => self.test(a)? || self.test(b)?,
        })
    }
}

fn descend<'v>(value: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn apply_filter(filter: &Filter, value: Option<Value>) -> Option<Value> {
    if let Filter::Default(fallback) = filter {
        return match value {
            None | Some(Value::Null) => Some(fallback.clone()),
            present => present,
        };
    }

    let value = value?;
    Some(match filter {
        Filter::Upper => Value::String(value_to_text(&value).to_uppercase()),
        Filter::Lower => Value::String(value_to_text(&value).to_lowercase()),
        Filter::Trim => Value::String(value_to_text(&value).trim().to_string()),
        Filter::Title => Value::String(title_case(&value_to_text(&value))),
        Filter::Length => {
            let len = match &value {
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                Value::String(s) => s.chars().count(),
                Value::Null => 0,
                other => value_to_text(other).chars().count(),
            };
            Value::from(len)
        }
        Filter::Join(sep) => match &value {
            Value::Array(items) => Value::String(
                items
                    .iter()
                    .map(value_to_text)
                    .collect::<Vec<_>>()
                    .join(sep),
            ),
            other => Value::String(value_to_text(other)),
        },
        Filter::Json => Value::String(value.to_string()),
        Filter::Default(_) => value,
    })
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text form of a value: strings verbatim, null empty, containers as JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

fn values_equal(a: Option<Value>, b: Option<Value>) -> bool {
    let a = a.unwrap_or(Value::Null);
    let b = b.unwrap_or(Value::Null);
    match (&a, &b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

// ── Static analysis ───────────────────────────────────────────────

fn collect_nodes(nodes: &[Node], bound: &mut Vec<String>, out: &mut BTreeSet<String>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Output(expr) => collect_expr(expr, bound, out),
            Node::If {
                branches,
                otherwise,
            } => {
                for (cond, body) in branches {
                    collect_cond(cond, bound, out);
                    collect_nodes(body, bound, out);
                }
                collect_nodes(otherwise, bound, out);
            }
            Node::For {
                var,
                iterable,
                body,
            } => {
                collect_expr(iterable, bound, out);
                bound.push(var.clone());
                bound.push("loop".to_string());
                collect_nodes(body, bound, out);
                bound.pop();
                bound.pop();
            }
        }
    }
}

fn collect_expr(expr: &Expr, bound: &[String], out: &mut BTreeSet<String>) {
    if let Operand::Path(path) = &expr.operand {
        if let Some(root) = path.first() {
            if !bound.contains(root) {
                out.insert(root.clone());
            }
        }
    }
}

fn collect_cond(cond: &Cond, bound: &[String], out: &mut BTreeSet<String>) {
    match cond {
        Cond::Test(e) => collect_expr(e, bound, out),
        Cond::Not(inner) => collect_cond(inner, bound, out),
        Cond::Eq(a, b) | Cond::Ne(a, b) => {
            collect_expr(a, bound, out);
            collect_expr(b, bound, out);
        }
        Cond::And(a, b) | Cond::Or(a, b) => {
            collect_cond(a, bound, out);
            collect_cond(b, bound, out);
        }
    }
}
