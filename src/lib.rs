//! Docstring hiding language server for Lisp-family source.
//!
//! Detection finds the quote-to-quote extent of docstring literals from
//! fontification metadata; the hiding engine maintains non-destructive
//! annotations over them. Commands arrive via workspace/executeCommand and
//! return the ranges the client should render as invisible.

use std::sync::OnceLock;

use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};

mod detect;
mod document;
mod fontify;
mod hide;
mod lsp;
pub(crate) mod settings;

pub use detect::{collect_docstrings, depth_at, find_docstring_in_form, form_end, DocstringSpan};
pub use document::{DocumentState, DocumentStore, LineIndex};
pub use fontify::{fontify, is_definer, Face, FaceMap, FaceRun};
pub use hide::{
    cleanup, compute_hide_range, hide_all, list_docstrings, show_all, toggle_at_point, Annotation,
    DocstringListing, HideStyle, ToggleOutcome,
};
pub use lsp::{list_result, toggle_all_result, toggle_at_point_result, CommandArgs};
pub use settings::{discover_settings, load_settings, HideConfig, Settings};

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    config: OnceLock<HideConfig>,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            config: OnceLock::new(),
        }
    }

    /// Active hiding configuration, defaulting until initialize ran.
    fn hide_config(&self) -> HideConfig {
        self.config.get().cloned().unwrap_or_default()
    }

    /// Store the new snapshot for a document.
    async fn on_document_change(&self, uri: Url, text: String, version: i32) {
        self.documents.open(uri, text, version);
    }

    async fn warn(&self, message: String) {
        self.client.log_message(MessageType::WARNING, message).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Extract workspace root from params
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|f| f.uri.to_file_path().ok())
            .or_else(|| {
                #[allow(deprecated)]
                params.root_uri.as_ref()?.to_file_path().ok()
            });

        if let Some(root) = workspace_root {
            // Discover settings by walking up the directory tree
            let (settings, _settings_dir) = settings::discover_settings(&root);
            let _ = self.config.set(settings.hide_config());
        } else {
            let _ = self.config.set(HideConfig::default());
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: lsp::all_commands(),
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "docfold language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.on_document_change(
            params.text_document.uri,
            params.text_document.text,
            params.text_document.version,
        )
        .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // We use FULL sync, so there's exactly one change with the full text
        if let Some(change) = params.content_changes.into_iter().next() {
            self.on_document_change(
                params.text_document.uri,
                change.text,
                params.text_document.version,
            )
            .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        // Annotations must not outlive the document.
        self.documents
            .close(&params.text_document.uri, hide::cleanup);
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let Some(args) = CommandArgs::parse(&params.arguments) else {
            self.warn(format!("invalid arguments for {}", params.command))
                .await;
            return Ok(None);
        };
        let config = self.hide_config();

        let result = match params.command.as_str() {
            lsp::TOGGLE_ALL => self.documents.with_mut(&args.uri, |doc| {
                if doc.hidden {
                    let removed = doc.annotations.len();
                    hide::show_all(doc);
                    lsp::toggle_all_result(doc, removed)
                } else {
                    let found = hide::hide_all(doc, &config);
                    lsp::toggle_all_result(doc, found)
                }
            }),
            lsp::TOGGLE_AT_POINT => {
                let Some(position) = args.position else {
                    self.warn(format!("{} requires a position", params.command))
                        .await;
                    return Ok(None);
                };
                self.documents.with_mut(&args.uri, |doc| {
                    let outcome = match doc.line_index.position_to_offset(position) {
                        Some(offset) => hide::toggle_at_point(doc, offset, &config),
                        None => ToggleOutcome::NotFound,
                    };
                    lsp::toggle_at_point_result(&doc.line_index, &outcome)
                })
            }
            lsp::LIST => self.documents.with(&args.uri, |doc| {
                lsp::list_result(&doc.line_index, &hide::list_docstrings(doc))
            }),
            other => {
                self.warn(format!("unknown command: {}", other)).await;
                return Ok(None);
            }
        };

        match result {
            Some(value) => Ok(Some(value)),
            None => {
                self.warn(format!("no document open for {}", args.uri)).await;
                Ok(None)
            }
        }
    }
}

pub fn create_service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::new(Backend::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tower::{Service, ServiceExt};
    use tower_lsp::jsonrpc::Request;

    #[test]
    fn service_can_be_created() {
        let (_service, _socket) = create_service();
    }

    #[tokio::test]
    async fn unknown_command_is_a_no_op() {
        let (mut service, socket) = create_service();
        drop(socket);

        let initialize = Request::build("initialize")
            .id(1)
            .params(json!({"capabilities": {}}))
            .finish();
        service
            .ready()
            .await
            .unwrap()
            .call(initialize)
            .await
            .unwrap();

        let bogus = Request::build("workspace/executeCommand")
            .id(2)
            .params(json!({
                "command": "docfold.frobnicate",
                "arguments": ["file:///tmp/init.el"],
            }))
            .finish();
        let response = service
            .ready()
            .await
            .unwrap()
            .call(bogus)
            .await
            .unwrap()
            .unwrap();

        // Unrecognized commands answer null, never an error response.
        let (_, result) = response.into_parts();
        assert_eq!(result, Ok(Value::Null));
    }
}
