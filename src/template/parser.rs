use serde_json::{Number, Value};

use super::error::TemplateError;
use super::lexer::{Segment, Tag, TagKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Output(Expr),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub(crate) call: Call,
    pub(crate) body: Vec<Node>,
    /// The `{{else}}` branch.
    pub(crate) inverse: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Path(PathExpr),
    Call(Box<Call>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub(crate) helper: Helper,
    pub(crate) args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Helper {
    If,
    Unless,
    Each,
    Eq,
    Ne,
    Contains,
    StartsWith,
    Or,
    Array,
    Some(Vec<FieldPredicate>),
}

/// One named constraint of `some`, decided from the argument name at compile time.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldPredicate {
    Equals { field: String, value: Expr },
    StartsWith { field: String, prefix: Expr },
    NotStartsWithAnyOf { field: String, prefixes: Expr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathExpr {
    pub(crate) base: PathBase,
    pub(crate) segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathBase {
    /// Relative to the scope `depth` levels up. Unless `explicit`
    /// (`this.`, `./`, `../`), a missing name falls back to enclosing scopes.
    Scoped { depth: usize, explicit: bool },
    Root,
    /// `@index`, `@key`, `@first`, `@last`.
    Data(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Inline,
    Block,
    Subexpression,
}

/// Build the node tree for an already tokenized template.
pub(crate) fn parse(segments: Vec<Segment>) -> Result<Vec<Node>, TemplateError> {
    let mut parser = Parser {
        segments: segments.into_iter(),
    };
    let (nodes, stop) = parser.parse_nodes()?;
    match stop {
        Stop::End => Ok(nodes),
        Stop::Else { line, .. } => Err(TemplateError::UnexpectedElse { line }),
        Stop::Close { name, line } => Err(TemplateError::UnexpectedClose { name, line }),
    }
}

enum Stop {
    End,
    Else { content: String, line: usize },
    Close { name: String, line: usize },
}

struct Parser {
    segments: std::vec::IntoIter<Segment>,
}

impl Parser {
    fn parse_nodes(&mut self) -> Result<(Vec<Node>, Stop), TemplateError> {
        let mut nodes = Vec::new();
        while let Some(segment) = self.segments.next() {
            let tag = match segment {
                Segment::Text(text) => {
                    if !text.is_empty() {
                        nodes.push(Node::Text(text));
                    }
                    continue;
                }
                Segment::Tag(tag) => tag,
            };
            match tag.kind {
                TagKind::Comment => {}
                TagKind::Expr => nodes.push(Node::Output(parse_statement(&tag)?)),
                TagKind::Open => {
                    let (name, call) = parse_block_call(&tag.content, tag.line)?;
                    nodes.push(Node::Block(self.parse_block(&name, call, tag.line)?));
                }
                TagKind::Else => {
                    return Ok((
                        nodes,
                        Stop::Else {
                            content: tag.content,
                            line: tag.line,
                        },
                    ));
                }
                TagKind::Close => {
                    return Ok((
                        nodes,
                        Stop::Close {
                            name: tag.content,
                            line: tag.line,
                        },
                    ));
                }
            }
        }
        Ok((nodes, Stop::End))
    }

    /// Parse a block body up to its close tag. `name` is the helper of the
    /// outermost block in an `else <helper>` chain, which owns the close tag.
    fn parse_block(&mut self, name: &str, call: Call, line: usize) -> Result<Block, TemplateError> {
        let (body, stop) = self.parse_nodes()?;
        let inverse = match stop {
            Stop::End => return Err(unclosed(name, line)),
            Stop::Close { name: found, line } => {
                expect_close(name, found, line)?;
                Vec::new()
            }
            Stop::Else { content, .. } if content.is_empty() => {
                let (inverse, stop) = self.parse_nodes()?;
                match stop {
                    Stop::End => return Err(unclosed(name, line)),
                    Stop::Else { line, .. } => {
                        return Err(TemplateError::DuplicateElse {
                            name: name.to_string(),
                            line,
                        });
                    }
                    Stop::Close { name: found, line } => expect_close(name, found, line)?,
                }
                inverse
            }
            Stop::Else { content, line } => {
                let (_, chained) = parse_block_call(&content, line)?;
                vec![Node::Block(self.parse_block(name, chained, line)?)]
            }
        };
        Ok(Block {
            call,
            body,
            inverse,
        })
    }
}

fn unclosed(name: &str, line: usize) -> TemplateError {
    TemplateError::UnclosedBlock {
        name: name.to_string(),
        line,
    }
}

fn expect_close(expected: &str, found: String, line: usize) -> Result<(), TemplateError> {
    if expected == found {
        Ok(())
    } else {
        Err(TemplateError::MismatchedClose {
            expected: expected.to_string(),
            found,
            line,
        })
    }
}

/// `{{expr}}`: a single value, or a helper call rendered inline.
fn parse_statement(tag: &Tag) -> Result<Expr, TemplateError> {
    let mut cursor = Cursor::new(lex(&tag.content, tag.line)?, tag.line);
    if let Some(Lexeme::Word(word)) = cursor.peek()
        && is_helper(word)
    {
        let name = word.clone();
        cursor.advance();
        let args = cursor.parse_args(false)?;
        let call = make_call(&name, args, tag.line, Site::Inline)?;
        return Ok(Expr::Call(Box::new(call)));
    }
    let first_word = match cursor.peek() {
        Some(Lexeme::Word(word)) => Some(word.clone()),
        _ => None,
    };
    let mut args = cursor.parse_args(false)?;
    match (args.len(), args.pop()) {
        (1, Some(Arg::Positional(expr))) => Ok(expr),
        (0, _) => Err(syntax("empty tag", tag.line)),
        _ => match first_word {
            Some(name) => Err(TemplateError::UnknownHelper {
                name,
                line: tag.line,
            }),
            None => Err(syntax("expected a single value", tag.line)),
        },
    }
}

/// `{{#helper args}}`: returns the helper name (for matching the close tag)
/// and the call.
fn parse_block_call(content: &str, line: usize) -> Result<(String, Call), TemplateError> {
    let mut cursor = Cursor::new(lex(content, line)?, line);
    let name = match cursor.next() {
        Some(Lexeme::Word(word)) => word,
        Some(_) => return Err(syntax("block must start with a helper name", line)),
        None => return Err(syntax("block has no helper", line)),
    };
    let args = cursor.parse_args(false)?;
    let call = make_call(&name, args, line, Site::Block)?;
    Ok((name, call))
}

fn is_helper(name: &str) -> bool {
    matches!(
        name,
        "if" | "unless" | "each" | "eq" | "ne" | "contains" | "startsWith" | "or" | "array" | "some"
    )
}

fn make_call(name: &str, args: Vec<Arg>, line: usize, site: Site) -> Result<Call, TemplateError> {
    if name == "some" {
        return make_some(args, line);
    }
    let (helper, expected, arity_ok): (Helper, &'static str, fn(usize) -> bool) = match name {
        "if" => (Helper::If, "1", |n| n == 1),
        "unless" => (Helper::Unless, "1", |n| n == 1),
        "each" => (Helper::Each, "1", |n| n == 1),
        "eq" => (Helper::Eq, "2", |n| n == 2),
        "ne" => (Helper::Ne, "2", |n| n == 2),
        "contains" => (Helper::Contains, "2", |n| n == 2),
        "startsWith" => (Helper::StartsWith, "2", |n| n == 2),
        "or" => (Helper::Or, "at least 1", |n| n >= 1),
        "array" => (Helper::Array, "any number of", |_| true),
        _ => {
            return Err(TemplateError::UnknownHelper {
                name: name.to_string(),
                line,
            });
        }
    };
    if matches!(helper, Helper::If | Helper::Unless | Helper::Each) && site != Site::Block {
        return Err(TemplateError::BlockOnly {
            helper: name.to_string(),
            line,
        });
    }
    let mut positional = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Arg::Positional(expr) => positional.push(expr),
            Arg::Named(key, _) => {
                return Err(TemplateError::UnexpectedNamedArgument {
                    helper: name.to_string(),
                    key,
                    line,
                });
            }
        }
    }
    if !arity_ok(positional.len()) {
        return Err(TemplateError::Arity {
            helper: name.to_string(),
            expected,
            found: positional.len(),
            line,
        });
    }
    Ok(Call {
        helper,
        args: positional,
    })
}

fn make_some(args: Vec<Arg>, line: usize) -> Result<Call, TemplateError> {
    let mut positional = Vec::new();
    let mut predicates = Vec::new();
    for arg in args {
        match arg {
            Arg::Positional(expr) => positional.push(expr),
            Arg::Named(key, value) => predicates.push(field_predicate(key, value, line)?),
        }
    }
    if positional.len() != 1 {
        return Err(TemplateError::Arity {
            helper: "some".to_string(),
            expected: "1 positional",
            found: positional.len(),
            line,
        });
    }
    Ok(Call {
        helper: Helper::Some(predicates),
        args: positional,
    })
}

fn field_predicate(key: String, value: Expr, line: usize) -> Result<FieldPredicate, TemplateError> {
    let predicate = if let Some(field) = key.strip_suffix("NotStartsWithAny") {
        FieldPredicate::NotStartsWithAnyOf {
            field: field.to_string(),
            prefixes: value,
        }
    } else if let Some(field) = key.strip_suffix("StartsWith") {
        FieldPredicate::StartsWith {
            field: field.to_string(),
            prefix: value,
        }
    } else {
        FieldPredicate::Equals { field: key, value }
    };
    let field = match &predicate {
        FieldPredicate::Equals { field, .. }
        | FieldPredicate::StartsWith { field, .. }
        | FieldPredicate::NotStartsWithAnyOf { field, .. } => field,
    };
    if field.is_empty() {
        return Err(syntax("`some` constraint names no field", line));
    }
    Ok(predicate)
}

fn syntax(message: &str, line: usize) -> TemplateError {
    TemplateError::Syntax {
        message: message.to_string(),
        line,
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Word(String),
    Str(String),
    LParen,
    RParen,
    Assign,
}

fn lex(content: &str, line: usize) -> Result<Vec<Lexeme>, TemplateError> {
    let mut lexemes = Vec::new();
    let mut chars = content.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                lexemes.push(Lexeme::LParen);
            }
            ')' => {
                chars.next();
                lexemes.push(Lexeme::RParen);
            }
            '=' => {
                chars.next();
                lexemes.push(Lexeme::Assign);
            }
            '"' | '\'' => {
                chars.next();
                let mut s = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some(other) => s.push(other),
                            None => break,
                        },
                        ch if ch == c => {
                            closed = true;
                            break;
                        }
                        ch => s.push(ch),
                    }
                }
                if !closed {
                    return Err(syntax("unterminated string literal", line));
                }
                lexemes.push(Lexeme::Str(s));
            }
            _ => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '(' | ')' | '=' | '"' | '\'') {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                lexemes.push(Lexeme::Word(word));
            }
        }
    }
    Ok(lexemes)
}

enum Arg {
    Positional(Expr),
    Named(String, Expr),
}

struct Cursor {
    lexemes: Vec<Lexeme>,
    pos: usize,
    line: usize,
}

impl Cursor {
    fn new(lexemes: Vec<Lexeme>, line: usize) -> Self {
        Self {
            lexemes,
            pos: 0,
            line,
        }
    }

    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn peek_second(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.pos + 1)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn next(&mut self) -> Option<Lexeme> {
        let lexeme = self.lexemes.get(self.pos).cloned();
        self.advance();
        lexeme
    }

    fn parse_args(&mut self, in_parens: bool) -> Result<Vec<Arg>, TemplateError> {
        let mut args = Vec::new();
        loop {
            match self.peek() {
                None if in_parens => return Err(syntax("missing `)`", self.line)),
                None => break,
                Some(Lexeme::RParen) if in_parens => {
                    self.advance();
                    break;
                }
                Some(Lexeme::RParen) => return Err(syntax("unexpected `)`", self.line)),
                Some(Lexeme::Word(key)) if self.peek_second() == Some(&Lexeme::Assign) => {
                    let key = key.clone();
                    self.pos += 2;
                    let value = self.parse_term()?;
                    args.push(Arg::Named(key, value));
                }
                Some(_) => args.push(Arg::Positional(self.parse_term()?)),
            }
        }
        Ok(args)
    }

    fn parse_term(&mut self) -> Result<Expr, TemplateError> {
        match self.next() {
            Some(Lexeme::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Lexeme::Word(word)) => word_expr(&word, self.line),
            Some(Lexeme::LParen) => {
                let name = match self.next() {
                    Some(Lexeme::Word(word)) => word,
                    _ => return Err(syntax("expected a helper name after `(`", self.line)),
                };
                let args = self.parse_args(true)?;
                let call = make_call(&name, args, self.line, Site::Subexpression)?;
                Ok(Expr::Call(Box::new(call)))
            }
            Some(Lexeme::RParen) => Err(syntax("unexpected `)`", self.line)),
            Some(Lexeme::Assign) => Err(syntax("unexpected `=`", self.line)),
            None => Err(syntax("expected a value", self.line)),
        }
    }
}

fn word_expr(word: &str, line: usize) -> Result<Expr, TemplateError> {
    let literal = match word {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" | "undefined" => Some(Value::Null),
        _ => number_literal(word),
    };
    match literal {
        Some(value) => Ok(Expr::Literal(value)),
        None => parse_path(word, line).map(Expr::Path),
    }
}

fn number_literal(word: &str) -> Option<Value> {
    let digits = word.strip_prefix('-').unwrap_or(word);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(n) = word.parse::<i64>() {
        return Some(Value::Number(n.into()));
    }
    word.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn parse_path(word: &str, line: usize) -> Result<PathExpr, TemplateError> {
    if let Some(rest) = word.strip_prefix('@') {
        if rest == "root" {
            return Ok(PathExpr {
                base: PathBase::Root,
                segments: Vec::new(),
            });
        }
        if let Some(tail) = rest
            .strip_prefix("root.")
            .or_else(|| rest.strip_prefix("root/"))
        {
            return Ok(PathExpr {
                base: PathBase::Root,
                segments: split_segments(tail),
            });
        }
        if rest.is_empty() {
            return Err(syntax("`@` must name a data variable", line));
        }
        return Ok(PathExpr {
            base: PathBase::Data(rest.to_string()),
            segments: Vec::new(),
        });
    }

    let mut rest = word;
    let mut depth = 0;
    let mut explicit = false;
    while let Some(tail) = rest.strip_prefix("../") {
        depth += 1;
        explicit = true;
        rest = tail;
    }
    if rest == ".." {
        depth += 1;
        explicit = true;
        rest = "";
    }
    if rest == "this" || rest == "." {
        explicit = true;
        rest = "";
    } else if let Some(tail) = rest
        .strip_prefix("this.")
        .or_else(|| rest.strip_prefix("this/"))
        .or_else(|| rest.strip_prefix("./"))
    {
        explicit = true;
        rest = tail;
    }
    Ok(PathExpr {
        base: PathBase::Scoped { depth, explicit },
        segments: split_segments(rest),
    })
}

fn split_segments(path: &str) -> Vec<String> {
    path.split(['.', '/'])
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
