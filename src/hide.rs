//! Visual hiding of docstrings.
//!
//! The engine never edits text: hiding a docstring means creating an
//! [`Annotation`] over a sub-range of it, and showing means removing the
//! annotation. The annotation set owned by a [`DocumentState`] *is* the
//! hidden/shown state, one annotation per currently-hidden docstring.

use std::ops::Range;

use crate::detect::{collect_docstrings, find_docstring_in_form, DocstringSpan};
use crate::document::DocumentState;
use crate::settings::HideConfig;

/// How much of a docstring to hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideStyle {
    /// Hide all content; the quotes stay visible.
    Complete,
    /// Keep the first `n` content characters visible.
    Partial(usize),
    /// Keep the first line visible.
    FirstLine,
}

/// A non-destructive visual override over `[range.start, range.end)`.
///
/// `evaporate` marks the annotation safe to auto-discard when the underlying
/// text changes; every annotation this engine creates is marked so, since
/// spans never survive edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub range: Range<usize>,
    /// Trailing decorative string rendered after the hidden range.
    pub marker: Option<String>,
    pub evaporate: bool,
}

/// Result of a point toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The docstring is now hidden. The range is absent when the active
    /// style had nothing to hide for this span.
    Hidden(Option<Range<usize>>),
    /// The docstring is now shown.
    Shown,
    /// No docstring at point.
    NotFound,
}

/// One row of the read-only inspection feed.
#[derive(Debug, Clone)]
pub struct DocstringListing {
    pub span: DocstringSpan,
    /// Content characters, quotes excluded.
    pub char_count: usize,
    pub first_lines: Vec<String>,
    pub last_lines: Vec<String>,
}

/// Sub-range of `span` to hide under `style`, or `None` when there is
/// nothing to hide (empty or inverted ranges never become annotations).
pub fn compute_hide_range(
    source: &str,
    span: &DocstringSpan,
    style: HideStyle,
) -> Option<Range<usize>> {
    if span.len() < 2 {
        return None;
    }
    let range = match style {
        HideStyle::Complete => span.start + 1..span.end - 1,
        HideStyle::Partial(n) => {
            let content_len = span.len() - 2;
            let visible = n.min(content_len);
            if visible == 0 {
                return None;
            }
            span.start + 1 + visible..span.end - 1
        }
        HideStyle::FirstLine => {
            let newline = source[span.content_range()].find('\n')?;
            span.start + 1 + newline..span.end - 1
        }
    };
    if range.start >= range.end {
        return None;
    }
    Some(range)
}

fn make_annotation(range: Range<usize>, config: &HideConfig) -> Annotation {
    Annotation {
        range,
        marker: config.marker.clone(),
        evaporate: true,
    }
}

/// Hide every docstring in the document. Idempotent: any existing
/// annotations are cleared first, so repeated calls never double-annotate.
///
/// Returns the number of docstrings found, which can exceed the number of
/// annotations created when the style leaves nothing to hide for some spans.
pub fn hide_all(doc: &mut DocumentState, config: &HideConfig) -> usize {
    doc.annotations.clear();
    doc.invisibility_enabled = true;
    doc.refontify();

    let spans = collect_docstrings(doc.source(), &doc.faces);
    let found = spans.len();
    for span in &spans {
        if let Some(range) = compute_hide_range(doc.source(), span, config.style) {
            doc.annotations.push(make_annotation(range, config));
        }
    }
    doc.hidden = true;
    found
}

/// Show every docstring. Safe to call when nothing is hidden.
pub fn show_all(doc: &mut DocumentState) {
    doc.annotations.clear();
    doc.invisibility_enabled = false;
    doc.hidden = false;
}

/// Toggle the docstring at `cursor`.
///
/// The decision is purely whether an annotation already exists over the
/// span; the whole-buffer hidden flag is neither read nor written. Hiding
/// enables document invisibility as a side condition so the newly hidden
/// text actually disappears.
pub fn toggle_at_point(doc: &mut DocumentState, cursor: usize, config: &HideConfig) -> ToggleOutcome {
    let Some(span) = find_docstring_in_form(doc.source(), &doc.faces, cursor) else {
        return ToggleOutcome::NotFound;
    };

    // Annotations are only ever created inside spans, and spans never
    // overlap, so containment identifies this span's annotation.
    let existing = doc
        .annotations
        .iter()
        .position(|a| span.start <= a.range.start && a.range.end <= span.end);

    if let Some(idx) = existing {
        doc.annotations.remove(idx);
        return ToggleOutcome::Shown;
    }

    match compute_hide_range(doc.source(), &span, config.style) {
        Some(range) => {
            doc.invisibility_enabled = true;
            doc.annotations.push(make_annotation(range.clone(), config));
            ToggleOutcome::Hidden(Some(range))
        }
        None => ToggleOutcome::Hidden(None),
    }
}

/// Remove every annotation owned by this engine, unconditionally. Invoked on
/// document teardown so annotations never leak into reused storage.
pub fn cleanup(doc: &mut DocumentState) {
    doc.annotations.clear();
}

/// Read-only inspection feed: every docstring with its character count and
/// up to two leading and trailing content lines, in document order.
pub fn list_docstrings(doc: &DocumentState) -> Vec<DocstringListing> {
    collect_docstrings(doc.source(), &doc.faces)
        .into_iter()
        .map(|span| {
            let content = &doc.source()[span.content_range()];
            let lines: Vec<&str> = content.lines().collect();
            let first_lines: Vec<String> =
                lines.iter().take(2).map(|l| l.to_string()).collect();
            let last_lines: Vec<String> = if lines.len() > 2 {
                lines[lines.len().saturating_sub(2).max(2)..]
                    .iter()
                    .map(|l| l.to_string())
                    .collect()
            } else {
                Vec::new()
            };
            DocstringListing {
                span,
                char_count: content.chars().count(),
                first_lines,
                last_lines,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::HideConfig;

    fn span(start: usize, end: usize) -> DocstringSpan {
        DocstringSpan { start, end }
    }

    fn config(style: HideStyle) -> HideConfig {
        HideConfig {
            style,
            marker: None,
        }
    }

    const TWO_FORMS: &str =
        "(defun f ()\n  \"First doc.\"\n  nil)\n\n(defvar x 1\n  \"Second doc.\")\n";

    #[test]
    fn complete_keeps_quotes_visible() {
        let s = span(10, 20);
        assert_eq!(compute_hide_range("", &s, HideStyle::Complete), Some(11..19));
    }

    #[test]
    fn partial_clamps_to_content() {
        // Content length 8; asking for 40 visible chars hides nothing.
        let s = span(0, 10);
        assert_eq!(compute_hide_range("", &s, HideStyle::Partial(40)), None);
    }

    #[test]
    fn partial_hides_tail() {
        let s = span(0, 10);
        assert_eq!(compute_hide_range("", &s, HideStyle::Partial(3)), Some(4..9));
    }

    #[test]
    fn partial_zero_hides_nothing() {
        let s = span(0, 10);
        assert_eq!(compute_hide_range("", &s, HideStyle::Partial(0)), None);
    }

    #[test]
    fn first_line_single_line_hides_nothing() {
        let src = "\"Short.\"";
        let s = span(0, 8);
        assert_eq!(compute_hide_range(src, &s, HideStyle::FirstLine), None);
    }

    #[test]
    fn first_line_hides_from_newline() {
        let src = "\"One.\nTwo.\"";
        let s = span(0, 11);
        // Newline is at content offset 4; hide it through the closing quote.
        assert_eq!(
            compute_hide_range(src, &s, HideStyle::FirstLine),
            Some(5..10)
        );
    }

    #[test]
    fn degenerate_span_hides_nothing() {
        let s = span(5, 6);
        assert_eq!(compute_hide_range("", &s, HideStyle::Complete), None);
    }

    #[test]
    fn hide_all_creates_one_annotation_per_docstring() {
        let mut doc = DocumentState::new(TWO_FORMS.to_string(), 0);
        let found = hide_all(&mut doc, &config(HideStyle::Complete));
        assert_eq!(found, 2);
        assert_eq!(doc.annotations.len(), 2);
        assert!(doc.hidden);
        assert!(doc.invisibility_enabled);
    }

    #[test]
    fn hide_all_is_idempotent() {
        let mut doc = DocumentState::new(TWO_FORMS.to_string(), 0);
        hide_all(&mut doc, &config(HideStyle::Complete));
        let first = doc.annotations.clone();
        hide_all(&mut doc, &config(HideStyle::Complete));
        assert_eq!(doc.annotations, first);
    }

    #[test]
    fn show_all_after_show_all_is_noop() {
        let mut doc = DocumentState::new(TWO_FORMS.to_string(), 0);
        hide_all(&mut doc, &config(HideStyle::Complete));
        show_all(&mut doc);
        assert!(doc.annotations.is_empty());
        assert!(!doc.hidden);
        show_all(&mut doc);
        assert!(doc.annotations.is_empty());
        assert!(!doc.hidden);
    }

    #[test]
    fn hide_all_counts_spans_with_nothing_to_hide() {
        let src = "(defun f ()\n  \"Short.\"\n  nil)\n";
        let mut doc = DocumentState::new(src.to_string(), 0);
        let found = hide_all(&mut doc, &config(HideStyle::FirstLine));
        assert_eq!(found, 1);
        assert!(doc.annotations.is_empty());
    }

    #[test]
    fn toggle_at_point_round_trip() {
        let mut doc = DocumentState::new(TWO_FORMS.to_string(), 0);
        let cfg = config(HideStyle::Complete);

        match toggle_at_point(&mut doc, 3, &cfg) {
            ToggleOutcome::Hidden(Some(_)) => {}
            other => panic!("expected Hidden, got {:?}", other),
        }
        assert_eq!(doc.annotations.len(), 1);

        assert_eq!(toggle_at_point(&mut doc, 3, &cfg), ToggleOutcome::Shown);
        assert!(doc.annotations.is_empty());
    }

    #[test]
    fn toggle_at_point_not_found_outside_form() {
        let mut doc = DocumentState::new(TWO_FORMS.to_string(), 0);
        let blank = TWO_FORMS.find("\n\n").unwrap() + 1;
        assert_eq!(
            toggle_at_point(&mut doc, blank, &config(HideStyle::Complete)),
            ToggleOutcome::NotFound
        );
        assert!(doc.annotations.is_empty());
    }

    #[test]
    fn toggle_at_point_leaves_other_spans_and_flag_alone() {
        let mut doc = DocumentState::new(TWO_FORMS.to_string(), 0);
        let cfg = config(HideStyle::Complete);
        hide_all(&mut doc, &cfg);
        assert_eq!(doc.annotations.len(), 2);
        let hidden_flag = doc.hidden;

        // Show just the first docstring.
        assert_eq!(toggle_at_point(&mut doc, 3, &cfg), ToggleOutcome::Shown);
        assert_eq!(doc.annotations.len(), 1);
        assert_eq!(doc.hidden, hidden_flag);

        // The survivor covers the second docstring.
        let second = TWO_FORMS.find("\"Second doc.\"").unwrap();
        let a = &doc.annotations[0];
        assert!(a.range.start > second);
    }

    #[test]
    fn marker_attached_to_annotations() {
        let mut doc = DocumentState::new(TWO_FORMS.to_string(), 0);
        let cfg = HideConfig {
            style: HideStyle::Complete,
            marker: Some("…".to_string()),
        };
        hide_all(&mut doc, &cfg);
        assert!(doc
            .annotations
            .iter()
            .all(|a| a.marker.as_deref() == Some("…")));
        assert!(doc.annotations.iter().all(|a| a.evaporate));
    }

    #[test]
    fn cleanup_removes_everything() {
        let mut doc = DocumentState::new(TWO_FORMS.to_string(), 0);
        hide_all(&mut doc, &config(HideStyle::Complete));
        cleanup(&mut doc);
        assert!(doc.annotations.is_empty());
    }

    #[test]
    fn listing_reports_counts_and_edge_lines() {
        let src = "(defun f ()\n  \"One.\nTwo.\nThree.\nFour.\"\n  nil)\n";
        let doc = DocumentState::new(src.to_string(), 0);
        let listings = list_docstrings(&doc);
        assert_eq!(listings.len(), 1);
        let l = &listings[0];
        assert_eq!(l.first_lines, vec!["One.", "Two."]);
        assert_eq!(l.last_lines, vec!["Three.", "Four."]);
        assert_eq!(l.char_count, "One.\nTwo.\nThree.\nFour.".chars().count());
    }

    #[test]
    fn listing_short_docstring_has_no_tail() {
        let src = "(defun f () \"Only line.\" nil)\n";
        let doc = DocumentState::new(src.to_string(), 0);
        let listings = list_docstrings(&doc);
        assert_eq!(listings[0].first_lines, vec!["Only line."]);
        assert!(listings[0].last_lines.is_empty());
    }
}
