//! Docstring boundary detection.
//!
//! The detector works from fontification metadata, not grammar: it looks for
//! the first `Documentation`-faced byte inside the enclosing top-level form
//! and re-derives the exact quote-to-quote extent of the literal around it.
//! Fontification may split a docstring into several disjoint runs, so the
//! faced byte is only an anchor; the boundaries come from scanning the raw
//! text for unescaped quotes.
//!
//! All functions are pure over an immutable source snapshot. Detection
//! failures of any kind are `None`, never errors: malformed source is
//! expected input.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::fontify::{Face, FaceMap};

/// Half-open byte range of a docstring literal, quotes included.
///
/// `end` points just past the closing quote. Spans index into the snapshot
/// that produced them and must be recomputed after any edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocstringSpan {
    pub start: usize,
    pub end: usize,
}

impl DocstringSpan {
    /// Total length in bytes, quotes included.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Byte range of the content between the quotes.
    pub fn content_range(&self) -> Range<usize> {
        self.start + 1..self.end.saturating_sub(1)
    }
}

/// Opening delimiter of a candidate top-level form: `(` at column zero.
static TOPLEVEL_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\(").unwrap());

/// Paren nesting depth at `offset`, with string and comment interiors not
/// counting toward depth. A `(` in column zero always restarts depth at one,
/// so an unbalanced form does not poison the forms after it.
pub fn depth_at(source: &str, offset: usize) -> usize {
    let bytes = source.as_bytes();
    let offset = offset.min(bytes.len());
    let mut depth: usize = 0;
    let mut i = 0;
    while i < offset {
        match bytes[i] {
            b';' => {
                while i < offset && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' => {
                i += 1;
                while i < offset {
                    match bytes[i] {
                        b'\\' => i += 2,
                        b'"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
            }
            b'(' | b'[' => {
                if bytes[i] == b'(' && (i == 0 || bytes[i - 1] == b'\n') {
                    depth = 1;
                } else {
                    depth += 1;
                }
                i += 1;
            }
            b')' | b']' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            _ => i += 1,
        }
    }
    depth
}

/// Start of the enclosing top-level form: the last column-zero `(` at or
/// before `offset`. This is the classic defun heuristic; indented top-level
/// forms are not recognized.
fn toplevel_form_start(source: &str, offset: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let upto = offset.min(bytes.len().saturating_sub(1));
    (0..=upto)
        .rev()
        .find(|&p| bytes[p] == b'(' && (p == 0 || bytes[p - 1] == b'\n'))
}

/// End of the form opening at `form_start`, found by balanced scanning that
/// skips strings and comments.
///
/// Returns one past the closing paren, or the position of the next
/// column-zero `(` when the form never closes before the next top-level form
/// starts. `None` means the form runs unbalanced to the end of the buffer.
pub fn form_end(source: &str, form_start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut depth: usize = 0;
    let mut i = form_start;
    while i < len {
        match bytes[i] {
            b';' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'"' => {
                i += 1;
                while i < len {
                    match bytes[i] {
                        b'\\' => i += 2,
                        b'"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
            }
            b'(' | b'[' => {
                if i > form_start && bytes[i] == b'(' && bytes[i - 1] == b'\n' {
                    // Next top-level form begins; the current one implicitly
                    // ends here.
                    return Some(i);
                }
                depth += 1;
                i += 1;
            }
            b')' | b']' => {
                depth = depth.saturating_sub(1);
                i += 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// True if the quote at `pos` is escaped: an odd number of consecutive
/// backslashes sits immediately before it.
fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let mut backslashes = 0;
    let mut p = pos;
    while p > 0 && bytes[p - 1] == b'\\' {
        backslashes += 1;
        p -= 1;
    }
    backslashes % 2 == 1
}

/// Nearest unescaped `"` at or before `from`, bounded by `lower` (inclusive).
fn unescaped_quote_backward(bytes: &[u8], from: usize, lower: usize) -> Option<usize> {
    let from = from.min(bytes.len().saturating_sub(1));
    (lower..=from)
        .rev()
        .find(|&p| bytes[p] == b'"' && !is_escaped(bytes, p))
}

/// Nearest unescaped `"` at or after `from`, bounded by `upper` (exclusive).
fn unescaped_quote_forward(bytes: &[u8], from: usize, upper: usize) -> Option<usize> {
    let upper = upper.min(bytes.len());
    (from..upper).find(|&p| bytes[p] == b'"' && !is_escaped(bytes, p))
}

/// Find the docstring of the top-level form enclosing `cursor`.
///
/// The search anchors on the first `Documentation`-faced byte in the form and
/// commits to it: if no unescaped opening quote precedes that byte within the
/// form, the whole search fails even when a later valid literal exists in the
/// same form. A well-formed definition has at most one docstring.
///
/// Precondition: `faces` is up to date for this snapshot of `source`.
pub fn find_docstring_in_form(
    source: &str,
    faces: &FaceMap,
    cursor: usize,
) -> Option<DocstringSpan> {
    let bytes = source.as_bytes();
    if bytes.is_empty() {
        return None;
    }

    // A cursor sitting on a column-zero opening paren counts as inside the
    // form it opens.
    let mut cursor = cursor.min(bytes.len());
    if cursor < bytes.len()
        && bytes[cursor] == b'('
        && (cursor == 0 || bytes[cursor - 1] == b'\n')
    {
        cursor += 1;
    }

    if depth_at(source, cursor) == 0 {
        return None;
    }

    let form_start = toplevel_form_start(source, cursor)?;
    let form_end = form_end(source, form_start).unwrap_or(source.len());
    // Navigation can land on a form that closed before the cursor.
    if cursor < form_start || cursor > form_end {
        return None;
    }

    let anchor = (form_start..form_end).find(|&p| faces.face_at(p) == Face::Documentation)?;

    let start = unescaped_quote_backward(bytes, anchor, form_start)?;
    let closing = unescaped_quote_forward(bytes, start + 1, form_end)?;

    Some(DocstringSpan {
        start,
        end: closing + 1,
    })
}

/// Collect the docstring spans of every top-level form, in document order.
///
/// Candidate forms are lines that open with `(` at column zero; indented
/// top-level forms are skipped. A candidate that fails detection for any
/// reason is skipped and scanning resumes past it, so partial or malformed
/// forms never abort the whole scan.
///
/// Precondition: `faces` is up to date for this snapshot of `source`.
pub fn collect_docstrings(source: &str, faces: &FaceMap) -> Vec<DocstringSpan> {
    let mut spans = Vec::new();
    let mut from = 0;

    while from < source.len() {
        let Some(m) = TOPLEVEL_OPEN.find_at(source, from) else {
            break;
        };
        let form_start = m.start();

        if let Some(span) = find_docstring_in_form(source, faces, form_start) {
            spans.push(span);
        }

        // Advance past the whole form so its interior is not re-scanned.
        // When the form runs unbalanced to the end of the buffer, resume at
        // the next line so the remainder is still examined.
        from = form_end(source, form_start)
            .unwrap_or_else(|| next_line_start(source, form_start))
            .max(form_start + 1);
    }

    spans
}

/// Offset of the line after the one containing `offset`.
fn next_line_start(source: &str, offset: usize) -> usize {
    source[offset..]
        .find('\n')
        .map(|i| offset + i + 1)
        .unwrap_or(source.len())
}
