use super::error::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagKind {
    Expr,
    Open,
    Else,
    Close,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tag {
    pub(crate) kind: TagKind,
    /// Tag body with the sigil (`#`, `/`, `!`, `else`) and `~` markers removed.
    pub(crate) content: String,
    pub(crate) line: usize,
    strip_before: bool,
    strip_after: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Text(String),
    Tag(Tag),
}

/// Split a template into text and tags, then apply whitespace control.
pub(crate) fn tokenize(src: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut pos = 0;
    while let Some(rel) = src[pos..].find("{{") {
        let start = pos + rel;
        if start > pos {
            segments.push(Segment::Text(src[pos..start].to_string()));
        }
        let (tag, end) = read_tag(src, start)?;
        segments.push(Segment::Tag(tag));
        pos = end;
    }
    if pos < src.len() {
        segments.push(Segment::Text(src[pos..].to_string()));
    }
    strip_standalone_lines(&mut segments);
    apply_tilde(&mut segments);
    Ok(segments)
}

fn read_tag(src: &str, start: usize) -> Result<(Tag, usize), TemplateError> {
    let unterminated = || {
        let (line, column) = position(src, start);
        TemplateError::UnterminatedTag { line, column }
    };
    let line = position(src, start).0;
    let open = &src[start + 2..];

    if let Some(inner) = open.strip_prefix('{') {
        let close = find_close(inner, "}}}").ok_or_else(unterminated)?;
        let mut tag = classify(&inner[..close], line);
        tag.kind = TagKind::Expr;
        return Ok((tag, start + 3 + close + 3));
    }

    let body_offset = usize::from(open.starts_with('~'));
    let body = &open[body_offset..];
    let close = if body.starts_with("!--") {
        find_long_comment_end(open, body_offset)
    } else if body.starts_with('!') {
        open.find("}}")
    } else {
        find_close(open, "}}")
    }
    .ok_or_else(unterminated)?;
    Ok((classify(&open[..close], line), start + 2 + close + 2))
}

/// Offset of the first `close` that is not inside a quoted string literal.
fn find_close(open: &str, close: &str) -> Option<usize> {
    let mut quote = None;
    let mut escaped = false;
    for (idx, ch) in open.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
            }
            None if open[idx..].starts_with(close) => return Some(idx),
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None => {}
        }
    }
    None
}

/// Offset of the `}}` that ends a `{{!-- ... --}}` comment.
fn find_long_comment_end(open: &str, body_offset: usize) -> Option<usize> {
    // shortest complete comment body is `!----`
    let min_len = body_offset + 5;
    let mut from = 0;
    while let Some(rel) = open[from..].find("}}") {
        let idx = from + rel;
        let before = open[..idx].trim_end_matches('~');
        if before.ends_with("--") && before.len() >= min_len {
            return Some(idx);
        }
        from = idx + 2;
    }
    None
}

fn classify(raw: &str, line: usize) -> Tag {
    let strip_before = raw.starts_with('~');
    let strip_after = raw.len() > usize::from(strip_before) && raw.ends_with('~');
    let mut body = raw;
    if strip_before {
        body = &body[1..];
    }
    if strip_after {
        body = &body[..body.len() - 1];
    }
    let body = body.trim();

    let (kind, content) = if let Some(rest) = body.strip_prefix('#') {
        (TagKind::Open, rest)
    } else if let Some(rest) = body.strip_prefix('/') {
        (TagKind::Close, rest)
    } else if let Some(rest) = body.strip_prefix('!') {
        (TagKind::Comment, rest)
    } else if body == "else" || body == "^" {
        (TagKind::Else, "")
    } else if let Some(rest) = body.strip_prefix("else")
        && rest.starts_with(char::is_whitespace)
    {
        (TagKind::Else, rest)
    } else {
        (TagKind::Expr, body)
    };
    Tag {
        kind,
        content: content.trim().to_string(),
        line,
        strip_before,
        strip_after,
    }
}

/// 1-based line and column of byte offset `at`.
fn position(src: &str, at: usize) -> (usize, usize) {
    let before = &src[..at];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |p| p + 1);
    (line, before[line_start..].chars().count() + 1)
}

fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// Block, else and comment tags alone on their line swallow the line's
/// indentation and line break.
fn strip_standalone_lines(segments: &mut [Segment]) {
    let n = segments.len();
    let standalone: Vec<bool> = (0..n)
        .map(|i| {
            let Segment::Tag(tag) = &segments[i] else {
                return false;
            };
            if tag.kind == TagKind::Expr {
                return false;
            }
            let prev_ok = match i.checked_sub(1).map(|p| &segments[p]) {
                None => true,
                Some(Segment::Text(text)) => match text.rfind('\n') {
                    Some(p) => is_blank(&text[p + 1..]),
                    None => i == 1 && is_blank(text),
                },
                Some(Segment::Tag(_)) => false,
            };
            let next_ok = match segments.get(i + 1) {
                None => true,
                Some(Segment::Text(text)) => match text.find('\n') {
                    Some(p) => is_blank(&text[..p]),
                    None => i + 2 == n && is_blank(text),
                },
                Some(Segment::Tag(_)) => false,
            };
            prev_ok && next_ok
        })
        .collect();

    for (i, _) in standalone.iter().enumerate().filter(|(_, s)| **s) {
        if i > 0
            && let Segment::Text(text) = &mut segments[i - 1]
        {
            match text.rfind('\n') {
                Some(p) => text.truncate(p + 1),
                None => text.clear(),
            }
        }
        if let Some(Segment::Text(text)) = segments.get_mut(i + 1) {
            match text.find('\n') {
                Some(p) => {
                    text.drain(..=p);
                }
                None => text.clear(),
            }
        }
    }
}

fn apply_tilde(segments: &mut [Segment]) {
    for i in 0..segments.len() {
        let (before, after) = match &segments[i] {
            Segment::Tag(tag) => (tag.strip_before, tag.strip_after),
            Segment::Text(_) => continue,
        };
        if before
            && i > 0
            && let Segment::Text(text) = &mut segments[i - 1]
        {
            text.truncate(text.trim_end().len());
        }
        if after && let Some(Segment::Text(text)) = segments.get_mut(i + 1) {
            let trimmed = text.len() - text.trim_start().len();
            text.drain(..trimmed);
        }
    }
}
