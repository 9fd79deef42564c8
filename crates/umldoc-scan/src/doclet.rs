//! Doc-comment parsing.
//!
//! Recognizes block doc comments (`/** ... */`) and runs of line doc comments
//! (`///`, `//!`), then extracts `@startuml` blocks from them.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use umldoc_diagrams::{AnnotationContext, Binding, END_MARKER, SourceLocation};

/// `@startuml`, an optional declared name, then optional description text.
static START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@startuml(?:\s+(\S+)(?:\s+(.*?))?)?\s*$").unwrap());

/// Any other block tag (`@param`, `@author`, ...).
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^@[A-Za-z]").unwrap());

/// One documentation comment with its position in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doclet {
    /// File the comment was found in.
    pub file: PathBuf,
    /// 1-based line of the comment opener.
    pub line: usize,
    /// Comment text with delimiters and gutters removed, one entry per
    /// physical line starting at `line`.
    pub lines: Vec<String>,
    /// Whether code follows the comment.
    pub bound: bool,
}

/// Parse all doc comments in `text`.
pub fn parse_doclets(text: &str, file: &Path) -> Vec<Doclet> {
    let lines: Vec<&str> = text.lines().collect();
    let mut doclets = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim_start();

        if let Some(rest) = trimmed.strip_prefix("/**")
            && !rest.starts_with('*')
            && !rest.starts_with('/')
        {
            let start = i;
            let (body, tail, end) = read_block(&lines, i, rest);
            i = end + 1;
            let bound = !tail.trim().is_empty() || next_is_code(&lines, i);
            doclets.push(Doclet {
                file: file.to_path_buf(),
                line: start + 1,
                lines: body,
                bound,
            });
            continue;
        }

        if is_line_doc(trimmed) {
            let start = i;
            let mut body = Vec::new();
            while i < lines.len() && is_line_doc(lines[i].trim_start()) {
                body.push(clean_line_doc(lines[i].trim_start()));
                i += 1;
            }
            doclets.push(Doclet {
                file: file.to_path_buf(),
                line: start + 1,
                lines: body,
                bound: next_is_code(&lines, i),
            });
            continue;
        }

        i += 1;
    }

    doclets
}

/// Read a block comment whose opener is on line `start`.
///
/// Returns the cleaned lines, whatever follows `*/` on the closing line and
/// the index of the closing line. An unterminated comment runs to the end of
/// the file.
fn read_block<'a>(lines: &[&'a str], start: usize, first: &'a str) -> (Vec<String>, &'a str, usize) {
    let mut body = Vec::new();
    let mut i = start;
    let mut current = first;
    let mut is_first = true;

    loop {
        let (content, tail) = match current.find("*/") {
            Some(pos) => (&current[..pos], Some(&current[pos + 2..])),
            None => (current, None),
        };
        body.push(if is_first {
            content.trim().to_owned()
        } else {
            clean_block_line(content)
        });
        if let Some(tail) = tail {
            return (body, tail, i);
        }
        if i + 1 >= lines.len() {
            return (body, "", i);
        }
        i += 1;
        current = lines[i];
        is_first = false;
    }
}

fn clean_block_line(line: &str) -> String {
    let line = line.trim_start();
    let line = line.strip_prefix('*').unwrap_or(line);
    let line = line.strip_prefix(' ').unwrap_or(line);
    line.trim_end().to_owned()
}

fn is_line_doc(trimmed: &str) -> bool {
    (trimmed.starts_with("///") && !trimmed.starts_with("////")) || trimmed.starts_with("//!")
}

fn clean_line_doc(trimmed: &str) -> String {
    let line = &trimmed[3..];
    let line = line.strip_prefix(' ').unwrap_or(line);
    line.trim_end().to_owned()
}

/// Whether the first non-blank line from `from` is code rather than a comment.
fn next_is_code(lines: &[&str], from: usize) -> bool {
    lines[from.min(lines.len())..]
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .is_some_and(|l| !l.starts_with("//") && !l.starts_with("/*"))
}

/// Extract every `@startuml` block from `doclet` as an unbound annotation.
///
/// The first word after `@startuml` is the declared name; the rest of that
/// line starts the body. A block runs to the next `@enduml`, the next block
/// tag or the end of the comment. Blank lines around the body are dropped.
pub fn extract_annotations(doclet: &Doclet) -> Vec<AnnotationContext> {
    struct Open<'a> {
        line: usize,
        name: Option<String>,
        body: Vec<&'a str>,
    }

    let close = |open: Open<'_>| AnnotationContext {
        body: trim_blank_lines(&open.body).join("\n"),
        name: open.name,
        location: SourceLocation::new(doclet.file.clone(), open.line),
        binding: Binding::Unbound,
    };

    let mut annotations = Vec::new();
    let mut open: Option<Open<'_>> = None;

    for (offset, line) in doclet.lines.iter().enumerate() {
        let trimmed = line.trim();
        if let Some(caps) = START_RE.captures(trimmed) {
            if let Some(prev) = open.take() {
                annotations.push(close(prev));
            }
            open = Some(Open {
                line: doclet.line + offset,
                name: caps.get(1).map(|m| m.as_str().to_owned()),
                body: caps.get(2).map(|m| m.as_str()).into_iter().collect(),
            });
        } else if trimmed.starts_with(END_MARKER) || TAG_RE.is_match(trimmed) {
            if let Some(prev) = open.take() {
                annotations.push(close(prev));
            }
        } else if let Some(block) = open.as_mut() {
            block.body.push(line);
        }
    }
    if let Some(prev) = open {
        annotations.push(close(prev));
    }

    annotations
}

fn trim_blank_lines<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.trim().is_empty()).map_or(start, |i| i + 1);
    &lines[start..end]
}
