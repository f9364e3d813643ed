//! Face assignment for Lisp-family source.
//!
//! This is the fontification primitive the boundary detector scans against:
//! every byte of the document gets a [`Face`], and string literals sitting in
//! the docstring position of a definition form get [`Face::Documentation`].
//!
//! Runs are recorded per line, so a multi-line docstring shows up as several
//! disjoint `Documentation` runs. The detector must not assume a docstring is
//! covered by a single contiguous run.

use std::sync::LazyLock;

use regex::Regex;

/// Semantic highlighting category for a byte of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Default,
    Comment,
    String,
    Documentation,
    Keyword,
}

/// A contiguous run of bytes sharing one face.
#[derive(Debug, Clone)]
pub struct FaceRun {
    pub start: usize,
    pub end: usize,
    pub face: Face,
}

/// Face lookup table for a document snapshot.
///
/// Runs are sorted, non-overlapping, and never span a line break for string
/// and documentation text. Bytes not covered by any run are [`Face::Default`].
#[derive(Debug, Clone, Default)]
pub struct FaceMap {
    runs: Vec<FaceRun>,
}

impl FaceMap {
    /// Face at a byte offset.
    pub fn face_at(&self, offset: usize) -> Face {
        let idx = match self.runs.binary_search_by(|run| run.start.cmp(&offset)) {
            Ok(idx) => idx,
            Err(0) => return Face::Default,
            Err(idx) => idx - 1,
        };
        let run = &self.runs[idx];
        if offset < run.end {
            run.face
        } else {
            Face::Default
        }
    }

    /// All runs, in document order.
    pub fn runs(&self) -> &[FaceRun] {
        &self.runs
    }

    fn push(&mut self, start: usize, end: usize, face: Face) {
        if start < end {
            self.runs.push(FaceRun { start, end, face });
        }
    }

    /// Push a run split at line breaks.
    fn push_by_line(&mut self, source: &str, start: usize, end: usize, face: Face) {
        let mut run_start = start;
        for (i, b) in source.as_bytes()[start..end].iter().enumerate() {
            if *b == b'\n' {
                self.push(run_start, start + i, face);
                run_start = start + i + 1;
            }
        }
        self.push(run_start, end, face);
    }
}

/// Head symbols that introduce a definition form carrying a docstring.
static DEFINER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(def(un|macro|subst|var|const|custom|group|face)|define-[a-zA-Z-]+|cl-def(un|macro|generic|method))$")
        .unwrap()
});

/// True if `head` introduces a definition form.
pub fn is_definer(head: &str) -> bool {
    DEFINER_PATTERN.is_match(head)
}

/// Assign a face to every byte of `source`.
///
/// Guarantees on return: each character has an up-to-date face, in particular
/// string literals in docstring position are tagged `Documentation`. Callers
/// that mutate the document must re-fontify before scanning.
pub fn fontify(source: &str) -> FaceMap {
    let mut map = FaceMap::default();
    let bytes = source.as_bytes();
    let len = bytes.len();

    let mut depth: usize = 0;
    // Element bookkeeping for the enclosing top-level form: the head symbol
    // decides whether strings can be docstrings, the element index rules out
    // the name position, and a form documents at most one string.
    let mut head: Option<&str> = None;
    let mut elem: usize = 0;
    let mut doc_seen = false;

    let mut i = 0;
    while i < len {
        match bytes[i] {
            b';' => {
                let start = i;
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
                map.push(start, i, Face::Comment);
            }
            b'"' => {
                let start = i;
                let at_depth = depth;
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
                let end = i.min(len);
                let face = if at_depth == 1
                    && !doc_seen
                    && elem >= 2
                    && head.is_some_and(is_definer)
                {
                    doc_seen = true;
                    Face::Documentation
                } else {
                    Face::String
                };
                map.push_by_line(source, start, end, face);
                if at_depth == 1 {
                    elem += 1;
                }
            }
            b'(' | b'[' => {
                // A paren in column zero always starts a fresh top-level
                // form, even if an earlier form never closed.
                if bytes[i] == b'(' && (i == 0 || bytes[i - 1] == b'\n') {
                    depth = 1;
                } else {
                    depth += 1;
                }
                if depth == 1 {
                    head = None;
                    elem = 0;
                    doc_seen = false;
                }
                i += 1;
            }
            b')' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    elem += 1;
                }
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < len && !is_delimiter(bytes[i]) {
                    i += 1;
                }
                if depth == 1 {
                    if elem == 0 {
                        let symbol = &source[start..i];
                        head = Some(symbol);
                        if is_definer(symbol) {
                            map.push(start, i, Face::Keyword);
                        }
                    }
                    elem += 1;
                }
            }
        }
    }

    map
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b'[' | b']' | b'"' | b';')
}
