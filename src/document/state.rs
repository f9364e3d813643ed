//! Document state management for the docstring hiding engine.

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use crate::fontify::{fontify, FaceMap};
use crate::hide::Annotation;

use super::text::LineIndex;

/// State for a single open document.
///
/// The annotation set is the hidden/shown state: one annotation per
/// currently-hidden docstring sub-range. `hidden` tracks only the direction
/// of the last whole-buffer toggle; point toggles never touch it.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Pre-computed line index for position conversion; owns the source.
    pub line_index: LineIndex,
    /// Face assignment for the current snapshot.
    pub faces: FaceMap,
    /// Visual-hiding annotations owned by the engine.
    pub annotations: Vec<Annotation>,
    /// Whether the last whole-buffer operation hid docstrings.
    pub hidden: bool,
    /// Document-wide "documentation text may be hidden" flag.
    pub invisibility_enabled: bool,
    /// Document version from the client.
    pub version: i32,
}

impl DocumentState {
    /// Create state for a fresh snapshot: fontified, nothing hidden.
    pub fn new(source: String, version: i32) -> Self {
        let faces = fontify(&source);
        Self {
            line_index: LineIndex::new(source),
            faces,
            annotations: Vec::new(),
            hidden: false,
            invisibility_enabled: false,
            version,
        }
    }

    /// The raw source text.
    pub fn source(&self) -> &str {
        self.line_index.source()
    }

    /// Recompute faces for the current source. Whole-buffer operations call
    /// this before scanning so detection never runs on stale metadata.
    pub fn refontify(&mut self) {
        self.faces = fontify(self.line_index.source());
    }

    /// Replace the snapshot after a full-sync edit.
    ///
    /// Spans never survive edits, so evaporating annotations are discarded
    /// with the old snapshot and the whole-buffer state resets to shown.
    pub fn update(&mut self, source: String, version: i32) {
        self.faces = fontify(&source);
        self.line_index = LineIndex::new(source);
        self.annotations.retain(|a| !a.evaporate);
        self.hidden = false;
        self.version = version;
    }
}

/// Thread-safe storage for open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, DocumentState>,
}

impl DocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Open a document or replace an existing one's snapshot.
    pub fn open(&self, uri: Url, source: String, version: i32) {
        match self.documents.get_mut(&uri) {
            Some(mut doc) => doc.update(source, version),
            None => {
                self.documents.insert(uri, DocumentState::new(source, version));
            }
        }
    }

    /// Close a document, running `teardown` on its state first.
    pub fn close(&self, uri: &Url, teardown: impl FnOnce(&mut DocumentState)) {
        if let Some(mut doc) = self.documents.get_mut(uri) {
            teardown(&mut doc);
        }
        self.documents.remove(uri);
    }

    /// Run `f` with mutable access to a document's state.
    ///
    /// Returns `None` if the document is not open. The closure runs under
    /// the map's shard lock; operations are synchronous and per-document, so
    /// no cross-document locking is needed.
    pub fn with_mut<R>(&self, uri: &Url, f: impl FnOnce(&mut DocumentState) -> R) -> Option<R> {
        self.documents.get_mut(uri).map(|mut doc| f(&mut doc))
    }

    /// Run `f` with shared access to a document's state.
    pub fn with<R>(&self, uri: &Url, f: impl FnOnce(&DocumentState) -> R) -> Option<R> {
        self.documents.get(uri).map(|doc| f(&doc))
    }
}
