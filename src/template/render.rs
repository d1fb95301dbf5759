use serde_json::Value;

use super::helpers::{Predicate, any_element_matches, is_truthy, string_form, values_equal};
use super::parser::{Block, Call, Expr, FieldPredicate, Helper, Node, PathBase, PathExpr};

/// One level of the scope chain. `each` pushes a new scope per element.
struct Scope<'a> {
    value: &'a Value,
    iteration: Option<Iteration<'a>>,
    parent: Option<&'a Scope<'a>>,
}

#[derive(Clone, Copy)]
struct Iteration<'a> {
    index: usize,
    len: usize,
    key: Option<&'a str>,
}

pub(crate) fn render(nodes: &[Node], data: &Value) -> String {
    let root = Scope {
        value: data,
        iteration: None,
        parent: None,
    };
    let mut out = String::new();
    render_nodes(nodes, &root, &mut out);
    out
}

fn render_nodes(nodes: &[Node], scope: &Scope<'_>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output(expr) => out.push_str(&string_form(&eval(expr, scope))),
            Node::Block(block) => render_block(block, scope, out),
        }
    }
}

fn render_block(block: &Block, scope: &Scope<'_>, out: &mut String) {
    let call = &block.call;
    let take_body = match &call.helper {
        Helper::Each => {
            let sequence = eval(&call.args[0], scope);
            if render_each(&sequence, block, scope, out) {
                return;
            }
            false
        }
        Helper::If => is_truthy(&eval(&call.args[0], scope)),
        Helper::Unless => !is_truthy(&eval(&call.args[0], scope)),
        _ => is_truthy(&eval_call(call, scope)),
    };
    let branch = if take_body {
        &block.body
    } else {
        &block.inverse
    };
    render_nodes(branch, scope, out);
}

/// Render the body once per element; false when there was nothing to iterate.
fn render_each(sequence: &Value, block: &Block, scope: &Scope<'_>, out: &mut String) -> bool {
    match sequence {
        Value::Array(items) if !items.is_empty() => {
            for (index, item) in items.iter().enumerate() {
                let child = Scope {
                    value: item,
                    iteration: Some(Iteration {
                        index,
                        len: items.len(),
                        key: None,
                    }),
                    parent: Some(scope),
                };
                render_nodes(&block.body, &child, out);
            }
            true
        }
        Value::Object(map) if !map.is_empty() => {
            for (index, (key, item)) in map.iter().enumerate() {
                let child = Scope {
                    value: item,
                    iteration: Some(Iteration {
                        index,
                        len: map.len(),
                        key: Some(key),
                    }),
                    parent: Some(scope),
                };
                render_nodes(&block.body, &child, out);
            }
            true
        }
        _ => false,
    }
}

fn eval(expr: &Expr, scope: &Scope<'_>) -> Value {
    match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Path(path) => resolve_path(path, scope),
        Expr::Call(call) => eval_call(call, scope),
    }
}

fn eval_call(call: &Call, scope: &Scope<'_>) -> Value {
    let arg = |i: usize| eval(&call.args[i], scope);
    match &call.helper {
        Helper::Eq => Value::Bool(values_equal(&arg(0), &arg(1))),
        Helper::Ne => Value::Bool(!values_equal(&arg(0), &arg(1))),
        Helper::Contains => {
            let (haystack, needle) = (string_form(&arg(0)), string_form(&arg(1)));
            Value::Bool(haystack.contains(&needle))
        }
        Helper::StartsWith => {
            let (text, prefix) = (string_form(&arg(0)), string_form(&arg(1)));
            Value::Bool(text.starts_with(&prefix))
        }
        Helper::Or => Value::Bool(call.args.iter().any(|e| is_truthy(&eval(e, scope)))),
        Helper::Array => Value::Array(call.args.iter().map(|e| eval(e, scope)).collect()),
        Helper::Some(predicates) => {
            let resolved: Vec<Predicate<'_>> = predicates
                .iter()
                .map(|p| resolve_predicate(p, scope))
                .collect();
            Value::Bool(any_element_matches(&arg(0), &resolved))
        }
        // block-only; the parser never places these in value position
        Helper::If | Helper::Unless | Helper::Each => Value::Null,
    }
}

fn resolve_predicate<'p>(predicate: &'p FieldPredicate, scope: &Scope<'_>) -> Predicate<'p> {
    match predicate {
        FieldPredicate::Equals { field, value } => Predicate::Equals {
            field,
            value: eval(value, scope),
        },
        FieldPredicate::StartsWith { field, prefix } => Predicate::StartsWith {
            field,
            prefix: string_form(&eval(prefix, scope)),
        },
        FieldPredicate::NotStartsWithAnyOf { field, prefixes } => Predicate::NotStartsWithAnyOf {
            field,
            prefixes: Predicate::split_prefixes(&eval(prefixes, scope)),
        },
    }
}

fn resolve_path(path: &PathExpr, scope: &Scope<'_>) -> Value {
    match &path.base {
        PathBase::Data(name) => data_variable(name, scope),
        PathBase::Root => {
            let mut root = scope;
            while let Some(parent) = root.parent {
                root = parent;
            }
            lookup_owned(root.value, &path.segments)
        }
        PathBase::Scoped { depth, explicit } => {
            let mut start = scope;
            for _ in 0..*depth {
                match start.parent {
                    Some(parent) => start = parent,
                    None => return Value::Null,
                }
            }
            let Some(first) = path.segments.first() else {
                return start.value.clone();
            };
            if *explicit {
                return lookup_owned(start.value, &path.segments);
            }
            let mut current = Some(start);
            while let Some(s) = current {
                if s.value.get(first.as_str()).is_some() {
                    return lookup_owned(s.value, &path.segments);
                }
                current = s.parent;
            }
            Value::Null
        }
    }
}

fn lookup_owned(value: &Value, segments: &[String]) -> Value {
    lookup(value, segments).cloned().unwrap_or(Value::Null)
}

fn lookup<'v>(value: &'v Value, segments: &[String]) -> Option<&'v Value> {
    segments.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn data_variable(name: &str, scope: &Scope<'_>) -> Value {
    let mut current = Some(scope);
    while let Some(s) = current {
        if let Some(it) = s.iteration {
            return match name {
                "index" => Value::from(it.index),
                "first" => Value::Bool(it.index == 0),
                "last" => Value::Bool(it.index + 1 == it.len),
                "key" => it.key.map_or(Value::Null, Value::from),
                _ => Value::Null,
            };
        }
        current = s.parent;
    }
    Value::Null
}
