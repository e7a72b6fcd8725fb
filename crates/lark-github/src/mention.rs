use regex::Regex;

/// Remove text segments where a mention must not count as a trigger.
///
/// Stripped before matching, in order:
/// - fenced code blocks opened and closed by a line starting with ``` or ~~~
///   (an unterminated fence swallows the rest of the body),
/// - Markdown blockquote lines (optional indent followed by `>`),
/// - HTML comments, including comments spanning multiple lines,
/// - inline code spans delimited by backtick pairs within a line; an
///   unpaired trailing backtick leaves the remainder intact.
pub fn strip_quoted_text(body: &str) -> String {
    let without_comments = strip_html_comments(body);
    let mut kept = Vec::new();
    let mut in_fence = false;
    let mut fence_marker = "";
    for line in without_comments.lines() {
        let trimmed = line.trim_start();
        if in_fence {
            if trimmed.starts_with(fence_marker) {
                in_fence = false;
            }
            continue;
        }
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            fence_marker = if trimmed.starts_with("```") { "```" } else { "~~~" };
            in_fence = true;
            continue;
        }
        if trimmed.starts_with('>') {
            continue;
        }
        kept.push(strip_inline_code(line));
    }
    kept.join("\n")
}

fn strip_html_comments(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    loop {
        match rest.find("<!--") {
            Some(start) => {
                out.push_str(&rest[..start]);
                match rest[start..].find("-->") {
                    Some(end) => rest = &rest[start + end + 3..],
                    None => break,
                }
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    out
}

fn strip_inline_code(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut segments = line.split('`');
    if let Some(first) = segments.next() {
        out.push_str(first);
    }
    let mut inside = true;
    let mut pending: Option<&str> = None;
    for segment in segments {
        if inside {
            pending = Some(segment);
        } else {
            out.push_str(segment);
            pending = None;
        }
        inside = !inside;
    }
    // An odd number of backticks means the last "span" never closed; keep it.
    if let Some(unclosed) = pending {
        out.push('`');
        out.push_str(unclosed);
    }
    out
}

/// True when the trigger phrase appears at a word boundary: neither side may
/// touch a username character (`[A-Za-z0-9_-]`), so `@larkspur` and
/// `mail@lark.dev` do not match `@lark`.
pub fn contains_mention(text: &str, trigger_phrase: &str) -> bool {
    let phrase = trigger_phrase.trim();
    if phrase.is_empty() {
        return false;
    }
    let pattern = format!(
        r"(?i)(^|[^A-Za-z0-9_-]){}($|[^A-Za-z0-9_-])",
        regex::escape(phrase)
    );
    match Regex::new(&pattern) {
        Ok(matcher) => matcher.is_match(text),
        Err(_) => false,
    }
}

/// Trigger check over a raw comment/issue/PR body: quoting guard first,
/// word-boundary mention second.
pub fn body_mentions(body: &str, trigger_phrase: &str) -> bool {
    contains_mention(&strip_quoted_text(body), trigger_phrase)
}
