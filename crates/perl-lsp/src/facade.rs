//! LSP facade: routes JSON-RPC requests/notifications onto
//! `perl-workspace-index` and `perl-query-engine`, and drives the
//! workspace scan protocol.
//!
//! [`LspServer`] holds all server-side state (the index, open documents,
//! negotiated settings and capabilities). [`LspServer::handle_message`] is
//! the single entry point: it consumes one [`JsonRpcRequest`] and produces
//! a [`Handled`] value carrying an optional response plus zero or more
//! [`Outgoing`] messages (notifications, or server-initiated requests such
//! as `window/workDoneProgress/create`) for the caller to write out in
//! order.

use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use perl_lsp_protocol::capabilities::{server_capabilities, NegotiatedClientCapabilities};
use perl_lsp_protocol::{errors, methods, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use perl_persistence::PersistedIndex;
use perl_query_engine::completion::{self, CompletionItemKind};
use perl_query_engine::{definition, imports, references, rename, symbols};
use perl_query_engine::{hover as hover_query, QueryError};
use perl_tree::{kinds, Node, ParserHost};
use perl_workspace_index::{AnalysisMode, CachingStrategy, WorkspaceIndex};

use crate::config::Settings;
use crate::convert::{location_to_lsp, lsp_position_to_byte_offset, node_at_position, node_range_to_lsp, range_to_lsp};
use crate::diagnostics::{diagnostic_to_lsp, ProblemsCounter};
use crate::discovery::{discover_files, effective_glob_pattern};
use crate::document::DocumentState;

/// A message written outside the normal request/response cycle: a
/// notification, or a server-initiated request the caller must assign a
/// fresh `id` to track (we don't currently correlate the eventual reply;
/// see `DESIGN.md`).
#[derive(Debug, Clone)]
pub enum Outgoing {
    /// A one-way notification (`$/progress`, `textDocument/publishDiagnostics`, ...).
    Notification {
        /// The JSON-RPC method name.
        method: String,
        /// The notification's params.
        params: Value,
    },
    /// A server-initiated request (`window/workDoneProgress/create`).
    Request {
        /// The id the eventual client response would echo back.
        id: Value,
        /// The JSON-RPC method name.
        method: String,
        /// The request's params.
        params: Value,
    },
}

/// The result of handling one incoming message.
#[derive(Debug, Default)]
pub struct Handled {
    /// The response to write back, if this message was a request.
    pub response: Option<JsonRpcResponse>,
    /// Additional messages to write, in order, after the response (if any).
    pub outgoing: Vec<Outgoing>,
    /// Set once `exit` has been processed — the caller should stop its read loop.
    pub should_exit: bool,
}

impl Handled {
    fn response(response: JsonRpcResponse) -> Self {
        Self { response: Some(response), ..Default::default() }
    }

    fn ok(id: Option<Value>, result: impl Serialize) -> Self {
        Self::response(JsonRpcResponse::success(id, json_or_null(result)))
    }

    fn err(id: Option<Value>, error: JsonRpcError) -> Self {
        Self::response(JsonRpcResponse::error(id, error))
    }

    fn notifications(outgoing: Vec<Outgoing>) -> Self {
        Self { outgoing, ..Default::default() }
    }

    fn none() -> Self {
        Self::default()
    }

    fn exit() -> Self {
        Self { should_exit: true, ..Default::default() }
    }
}

fn json_or_null(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn log_message(message: impl Into<String>) -> Outgoing {
    Outgoing::Notification {
        method: "window/logMessage".to_string(),
        params: serde_json::json!({ "type": 3, "message": message.into() }),
    }
}

fn empty_diagnostics_notification(uri: &str) -> Outgoing {
    Outgoing::Notification {
        method: methods::TEXT_DOCUMENT_PUBLISH_DIAGNOSTICS.to_string(),
        params: serde_json::json!({ "uri": uri, "diagnostics": Vec::<lsp_types::Diagnostic>::new() }),
    }
}

/// Perl Language Server state: the workspace index, open documents, and
/// negotiated settings/capabilities.
pub struct LspServer {
    index: WorkspaceIndex,
    documents: HashMap<String, DocumentState>,
    settings: Settings,
    client_caps: NegotiatedClientCapabilities,
    workspace_root: Option<PathBuf>,
    next_request_id: i64,
}

impl Default for LspServer {
    fn default() -> Self {
        Self::new()
    }
}

impl LspServer {
    /// Construct a server with an empty index and default settings. The
    /// tree-sitter grammar is loaded eagerly here — this is the one
    /// fallible startup step and must complete before any request is
    /// serviced.
    pub fn new() -> Self {
        // The grammar ships with this binary and has loaded successfully in
        // every build this server has shipped; a failure here means the
        // tree-sitter Perl crate itself is broken, not a recoverable
        // per-request condition, so `ParserHost::new` is trusted to succeed.
        #[allow(clippy::unwrap_used, clippy::panic)]
        let parser = ParserHost::new().unwrap_or_else(|e| panic!("failed to load Perl grammar: {e}"));
        Self {
            index: WorkspaceIndex::new(parser, CachingStrategy::Eager),
            documents: HashMap::new(),
            settings: Settings::default(),
            client_caps: NegotiatedClientCapabilities::default(),
            workspace_root: None,
            next_request_id: 0,
        }
    }

    fn next_id(&mut self) -> Value {
        self.next_request_id += 1;
        Value::from(self.next_request_id)
    }

    /// Route one incoming JSON-RPC message to its handler.
    pub fn handle_message(&mut self, request: JsonRpcRequest) -> Handled {
        match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request),
            methods::INITIALIZED => Handled::notifications(self.perform_workspace_scan()),
            methods::SHUTDOWN => Handled::response(JsonRpcResponse::null(request.id)),
            methods::EXIT => Handled::exit(),
            methods::TEXT_DOCUMENT_DID_OPEN => self.handle_did_open(request),
            methods::TEXT_DOCUMENT_DID_CHANGE => self.handle_did_change(request),
            methods::TEXT_DOCUMENT_DID_CLOSE => self.handle_did_close(request),
            methods::TEXT_DOCUMENT_DEFINITION => self.handle_definition(request),
            methods::TEXT_DOCUMENT_REFERENCES => self.handle_references(request),
            methods::TEXT_DOCUMENT_DOCUMENT_HIGHLIGHT => self.handle_document_highlight(request),
            methods::TEXT_DOCUMENT_HOVER => self.handle_hover(request),
            methods::TEXT_DOCUMENT_DOCUMENT_SYMBOL => self.handle_document_symbol(request),
            methods::TEXT_DOCUMENT_PREPARE_RENAME => self.handle_prepare_rename(request),
            methods::TEXT_DOCUMENT_RENAME => self.handle_rename(request),
            methods::TEXT_DOCUMENT_COMPLETION => self.handle_completion(request),
            methods::COMPLETION_ITEM_RESOLVE => self.handle_completion_resolve(request),
            methods::WORKSPACE_SYMBOL => self.handle_workspace_symbol(request),
            methods::WORKSPACE_DID_CHANGE_CONFIGURATION => self.handle_did_change_configuration(request),
            methods::WORKSPACE_DID_CHANGE_WATCHED_FILES => self.handle_did_change_watched_files(request),
            methods::CANCEL_REQUEST => Handled::none(),
            _ => {
                if request.id.is_some() {
                    Handled::err(request.id, errors::method_not_found(&request.method))
                } else {
                    Handled::none()
                }
            }
        }
    }

    fn text_for_uri(&mut self, uri: &str) -> Option<String> {
        if let Some(doc) = self.documents.get(uri) {
            return Some(doc.text());
        }
        self.index.tree_for(uri).ok().map(|t| t.text().to_string())
    }

    fn analyze_and_publish(&mut self, uri: &str, text: &str, mode: AnalysisMode) -> Vec<Outgoing> {
        let max = if self.settings.show_all_errors { usize::MAX } else { self.settings.max_number_of_problems };
        match self.index.analyze(uri, text, mode, true, max) {
            Ok(diagnostics) => {
                let lsp_diagnostics: Vec<lsp_types::Diagnostic> =
                    diagnostics.iter().map(|d| diagnostic_to_lsp(text, d)).collect();
                vec![Outgoing::Notification {
                    method: methods::TEXT_DOCUMENT_PUBLISH_DIAGNOSTICS.to_string(),
                    params: serde_json::json!({ "uri": uri, "diagnostics": lsp_diagnostics }),
                }]
            }
            Err(e) => vec![log_message(format!("failed to analyze {uri}: {e}"))],
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn resolve_workspace_root(init: &lsp_types::InitializeParams) -> Option<PathBuf> {
        if let Some(folders) = &init.workspace_folders {
            if let Some(first) = folders.first() {
                if let Some(path) = perl_uri::uri_to_fs_path(first.uri.as_str()) {
                    return Some(path);
                }
            }
        }
        #[allow(deprecated)]
        init.root_uri.as_ref().and_then(|uri| perl_uri::uri_to_fs_path(uri.as_str()))
    }

    fn handle_initialize(&mut self, request: JsonRpcRequest) -> Handled {
        let params = request.params.clone().unwrap_or(Value::Null);
        let init: lsp_types::InitializeParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };
        self.client_caps = NegotiatedClientCapabilities::negotiate(&init.capabilities);
        self.workspace_root = Self::resolve_workspace_root(&init);

        let result = lsp_types::InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(lsp_types::ServerInfo {
                name: "perl-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        };
        Handled::ok(request.id, result)
    }

    /// The workspace scan protocol: load the persisted index (if any), walk
    /// the workspace under the effective glob pattern, analyze every
    /// discovered file, publish its diagnostics (subject to the
    /// `maxNumberOfProblems` cap), report progress throughout, and save the
    /// index back to the sidecar at the end.
    fn perform_workspace_scan(&mut self) -> Vec<Outgoing> {
        let Some(root) = self.workspace_root.clone() else {
            return Vec::new();
        };

        let mut outgoing = Vec::new();
        let had_sidecar = perl_persistence::sidecar_exists(&root);
        match perl_persistence::load(&root) {
            Ok(persisted) => {
                let (decls, refs) = persisted.into_parts();
                self.index.replace_persisted(decls, refs);
            }
            Err(e) if had_sidecar => outgoing.push(log_message(format!("failed to load persisted index: {e}"))),
            Err(_) => {} // no sidecar yet: starting with an empty index is expected, not worth logging.
        }

        let title = if had_sidecar { "Re-indexing" } else { "Indexing" };
        let token = self.next_id();
        outgoing.push(Outgoing::Request {
            id: self.next_id(),
            method: methods::WINDOW_WORK_DONE_PROGRESS_CREATE.to_string(),
            params: serde_json::json!({ "token": token }),
        });
        outgoing.push(Outgoing::Notification {
            method: methods::DOLLAR_PROGRESS.to_string(),
            params: serde_json::json!({ "token": token, "value": { "kind": "begin", "title": title, "percentage": 0 } }),
        });

        let files = discover_files(&root, &effective_glob_pattern());
        let total = files.len().max(1);
        let mut problems = ProblemsCounter::new(self.settings.max_number_of_problems);

        for (processed, path) in files.iter().enumerate() {
            let Ok(uri) = perl_uri::fs_path_to_uri(path) else {
                outgoing.push(log_message(format!("could not build a URI for {}", path.display())));
                continue;
            };
            let Ok(text) = std::fs::read_to_string(path) else {
                outgoing.push(log_message(format!("could not read {}", path.display())));
                continue;
            };

            let collect = problems.should_collect();
            match self.index.analyze(&uri, &text, AnalysisMode::OnWorkspaceOpen, collect, self.settings.max_number_of_problems) {
                Ok(diagnostics) => {
                    problems.record(diagnostics.len());
                    if collect {
                        let lsp_diagnostics: Vec<lsp_types::Diagnostic> =
                            diagnostics.iter().map(|d| diagnostic_to_lsp(&text, d)).collect();
                        outgoing.push(Outgoing::Notification {
                            method: methods::TEXT_DOCUMENT_PUBLISH_DIAGNOSTICS.to_string(),
                            params: serde_json::json!({ "uri": uri, "diagnostics": lsp_diagnostics }),
                        });
                    }
                }
                Err(e) => outgoing.push(log_message(format!("failed to analyze {uri}: {e}"))),
            }

            let percentage = (((processed + 1) as f64 / total as f64) * 100.0).round() as u32;
            outgoing.push(Outgoing::Notification {
                method: methods::DOLLAR_PROGRESS.to_string(),
                params: serde_json::json!({ "token": token, "value": { "kind": "report", "percentage": percentage } }),
            });
        }

        outgoing.push(Outgoing::Notification {
            method: methods::DOLLAR_PROGRESS.to_string(),
            params: serde_json::json!({ "token": token, "value": { "kind": "end" } }),
        });

        let persisted = PersistedIndex::from_parts(self.index.decls_by_uri().clone(), self.index.refs_by_uri().clone());
        if let Err(e) = perl_persistence::save(&root, &persisted) {
            outgoing.push(log_message(format!("failed to save index: {e}")));
        }

        outgoing
    }

    // ------------------------------------------------------------------
    // Text document synchronization
    // ------------------------------------------------------------------

    fn handle_did_open(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params else { return Handled::none() };
        let params: lsp_types::DidOpenTextDocumentParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(_) => return Handled::none(),
        };
        let uri = params.text_document.uri.to_string();
        let text = params.text_document.text;
        self.documents.insert(uri.clone(), DocumentState::new(&text, params.text_document.version));
        let outgoing = self.analyze_and_publish(&uri, &text, AnalysisMode::OnFileOpen);
        Handled::notifications(outgoing)
    }

    fn handle_did_change(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params else { return Handled::none() };
        let params: lsp_types::DidChangeTextDocumentParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(_) => return Handled::none(),
        };
        let uri = params.text_document.uri.to_string();
        let version = params.text_document.version;

        let text = {
            let Some(doc) = self.documents.get_mut(&uri) else { return Handled::none() };
            for change in params.content_changes {
                match change.range {
                    Some(range) => doc.apply_change(
                        range.start.line as usize,
                        range.start.character as usize,
                        range.end.line as usize,
                        range.end.character as usize,
                        &change.text,
                        version,
                    ),
                    None => doc.replace_all(&change.text, version),
                }
            }
            doc.text()
        };

        let outgoing = self.analyze_and_publish(&uri, &text, AnalysisMode::OnFileOpen);
        Handled::notifications(outgoing)
    }

    fn handle_did_close(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params else { return Handled::none() };
        let params: lsp_types::DidCloseTextDocumentParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(_) => return Handled::none(),
        };
        let uri = params.text_document.uri.to_string();
        self.documents.remove(&uri);
        self.index.close(&uri);
        Handled::notifications(vec![empty_diagnostics_notification(&uri)])
    }

    // ------------------------------------------------------------------
    // Language features
    // ------------------------------------------------------------------

    fn handle_definition(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let params: lsp_types::GotoDefinitionParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };
        let uri = params.text_document_position_params.text_document.uri.to_string();
        let position = params.text_document_position_params.position;

        let tree = match self.index.tree_for(&uri) {
            Ok(t) => t,
            Err(e) => return Handled::err(request.id, errors::internal_error(e.to_string())),
        };
        let node = node_at_position(&tree, tree.text(), position);
        let locations = definition::definition(&tree, node, &uri, &self.index);

        let mut lsp_locations = Vec::new();
        for loc in &locations {
            if let Some(text) = self.text_for_uri(&loc.uri) {
                lsp_locations.push(location_to_lsp(&text, loc));
            }
        }
        Handled::ok(request.id, lsp_types::GotoDefinitionResponse::Array(lsp_locations))
    }

    fn handle_references(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let params: lsp_types::ReferenceParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };
        let uri = params.text_document_position.text_document.uri.to_string();
        let position = params.text_document_position.position;

        let tree = match self.index.tree_for(&uri) {
            Ok(t) => t,
            Err(e) => return Handled::err(request.id, errors::internal_error(e.to_string())),
        };
        let node = node_at_position(&tree, tree.text(), position);
        let locations = references::references(&tree, node, &uri, &self.index, false);

        let mut lsp_locations = Vec::new();
        for loc in &locations {
            if let Some(text) = self.text_for_uri(&loc.uri) {
                lsp_locations.push(location_to_lsp(&text, loc));
            }
        }
        Handled::ok(request.id, lsp_locations)
    }

    fn handle_document_highlight(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let params: lsp_types::DocumentHighlightParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };
        let uri = params.text_document_position_params.text_document.uri.to_string();
        let position = params.text_document_position_params.position;

        let tree = match self.index.tree_for(&uri) {
            Ok(t) => t,
            Err(e) => return Handled::err(request.id, errors::internal_error(e.to_string())),
        };
        let text = tree.text().to_string();
        let node = node_at_position(&tree, &text, position);
        let locations = references::document_highlight(&tree, node, &uri, &self.index);

        let highlights: Vec<lsp_types::DocumentHighlight> = locations
            .iter()
            .map(|loc| lsp_types::DocumentHighlight {
                range: range_to_lsp(&text, loc.range),
                kind: Some(lsp_types::DocumentHighlightKind::TEXT),
            })
            .collect();
        Handled::ok(request.id, highlights)
    }

    fn handle_hover(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let params: lsp_types::HoverParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };
        let uri = params.text_document_position_params.text_document.uri.to_string();
        let position = params.text_document_position_params.position;

        let tree = match self.index.tree_for(&uri) {
            Ok(t) => t,
            Err(e) => return Handled::err(request.id, errors::internal_error(e.to_string())),
        };
        let text = tree.text().to_string();
        let node = node_at_position(&tree, &text, position);

        let Some(contents) = hover_query::hover(&tree, node) else {
            return Handled::ok(request.id, Value::Null);
        };
        let hover = lsp_types::Hover {
            contents: lsp_types::HoverContents::Scalar(lsp_types::MarkedString::String(contents)),
            range: Some(node_range_to_lsp(&text, &node)),
        };
        Handled::ok(request.id, hover)
    }

    fn handle_document_symbol(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let params: lsp_types::DocumentSymbolParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };
        let uri = params.text_document.uri.to_string();
        let Some(text) = self.text_for_uri(&uri) else {
            return Handled::ok(request.id, Value::Null);
        };

        #[allow(deprecated)]
        let symbols: Vec<lsp_types::SymbolInformation> = symbols::document_symbols(&self.index, &uri)
            .into_iter()
            .map(|s| lsp_types::SymbolInformation {
                name: s.name,
                kind: lsp_types::SymbolKind::FUNCTION,
                tags: None,
                deprecated: None,
                location: lsp_types::Location { uri: params.text_document.uri.clone(), range: range_to_lsp(&text, s.range) },
                container_name: None,
            })
            .collect();
        Handled::ok(request.id, lsp_types::DocumentSymbolResponse::Flat(symbols))
    }

    fn handle_workspace_symbol(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let params: lsp_types::WorkspaceSymbolParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };

        let mut out = Vec::new();
        for symbol in symbols::workspace_symbols(&self.index, &params.query) {
            let Some(text) = self.text_for_uri(&symbol.uri) else { continue };
            let Some(uri) = symbol.uri.parse::<lsp_types::Uri>().ok() else { continue };
            #[allow(deprecated)]
            out.push(lsp_types::SymbolInformation {
                name: symbol.name,
                kind: lsp_types::SymbolKind::FUNCTION,
                tags: None,
                deprecated: None,
                location: lsp_types::Location { uri, range: range_to_lsp(&text, symbol.range) },
                container_name: None,
            });
        }
        Handled::ok(request.id, out)
    }

    fn handle_prepare_rename(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let params: lsp_types::TextDocumentPositionParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };
        let uri = params.text_document.uri.to_string();
        let position = params.position;

        let tree = match self.index.tree_for(&uri) {
            Ok(t) => t,
            Err(e) => return Handled::err(request.id, errors::internal_error(e.to_string())),
        };
        let text = tree.text().to_string();
        let node = node_at_position(&tree, &text, position);
        let (range, placeholder) = rename::prepare_rename(&tree, node);
        Handled::ok(
            request.id,
            lsp_types::PrepareRenameResponse::RangeWithPlaceholder { range: range_to_lsp(&text, range), placeholder },
        )
    }

    fn handle_rename(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let params: lsp_types::RenameParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };
        let uri = params.text_document_position.text_document.uri.to_string();
        let position = params.text_document_position.position;

        let tree = match self.index.tree_for(&uri) {
            Ok(t) => t,
            Err(e) => return Handled::err(request.id, errors::internal_error(e.to_string())),
        };
        let text = tree.text().to_string();
        let node = node_at_position(&tree, &text, position);

        let edit = match rename::rename(&tree, node, &uri, &self.index, &params.new_name) {
            Ok(edit) => edit,
            Err(QueryError::InvalidParams(detail)) => return Handled::err(request.id, errors::invalid_params(detail)),
        };

        let mut changes: HashMap<lsp_types::Uri, Vec<lsp_types::TextEdit>> = HashMap::new();
        for (edit_uri, edits) in edit.changes {
            let Some(file_text) = self.text_for_uri(&edit_uri) else { continue };
            let Ok(wire_uri) = edit_uri.parse::<lsp_types::Uri>() else { continue };
            changes.insert(
                wire_uri,
                edits.into_iter().map(|e| lsp_types::TextEdit { range: range_to_lsp(&file_text, e.range), new_text: e.new_text }).collect(),
            );
        }
        Handled::ok(request.id, lsp_types::WorkspaceEdit { changes: Some(changes), ..Default::default() })
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    fn handle_completion(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let params: lsp_types::CompletionParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };
        let uri = params.text_document_position.text_document.uri.to_string();
        let position = params.text_document_position.position;

        let tree = match self.index.tree_for(&uri) {
            Ok(t) => t,
            Err(e) => return Handled::err(request.id, errors::internal_error(e.to_string())),
        };
        let text = tree.text().to_string();
        let offset = lsp_position_to_byte_offset(&text, position);
        let node = node_at_position(&tree, &text, position);

        if completion::is_suppressed_by_preceding_scope_keyword(Some(node)) {
            return Handled::ok(request.id, lsp_types::CompletionResponse::Array(Vec::new()));
        }

        let sigil = offset > 0 && matches!(text[..offset].chars().next_back(), Some('$') | Some('@') | Some('%'));
        let items = if sigil {
            completion::variable_completions(&tree, node)
        } else {
            let typed = typed_prefix(&text, offset);
            let in_use_statement = enclosed_by(node, kinds::USE_NO_STATEMENT);
            completion::identifier_completions(&self.index, &uri, &typed, in_use_statement, self.settings.function_call_style)
        };

        let lsp_items: Vec<lsp_types::CompletionItem> = items.into_iter().map(|item| to_lsp_completion_item(item, &uri)).collect();
        Handled::ok(request.id, lsp_types::CompletionResponse::Array(lsp_items))
    }

    fn handle_completion_resolve(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params.clone() else {
            return Handled::err(request.id, errors::invalid_params("missing params"));
        };
        let mut item: lsp_types::CompletionItem = match serde_json::from_value(params) {
            Ok(i) => i,
            Err(e) => return Handled::err(request.id, errors::invalid_params(e.to_string())),
        };

        if let Some(edit) = self.synthesize_import_for(&item) {
            item.additional_text_edits = Some(vec![edit]);
        }
        Handled::ok(request.id, item)
    }

    fn synthesize_import_for(&mut self, item: &lsp_types::CompletionItem) -> Option<lsp_types::TextEdit> {
        let data = item.data.as_ref()?;
        let qualified = data.get("qualifiedName").and_then(Value::as_str)?;
        let uri = data.get("uri").and_then(Value::as_str)?;
        let (package, function) = qualified.rsplit_once("::")?;

        let tree = self.index.tree_for(uri).ok()?;
        let text = tree.text().to_string();
        let edit = imports::synthesize_import(&tree, package, function)?;
        Some(lsp_types::TextEdit { range: range_to_lsp(&text, edit.range), new_text: edit.new_text })
    }

    // ------------------------------------------------------------------
    // Workspace notifications
    // ------------------------------------------------------------------

    fn handle_did_change_configuration(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params else { return Handled::none() };
        if let Some(settings) = params.get("settings").and_then(|s| s.get("perl")) {
            self.settings.update_from_value(settings);
        }
        Handled::none()
    }

    fn handle_did_change_watched_files(&mut self, request: JsonRpcRequest) -> Handled {
        let Some(params) = request.params else { return Handled::none() };
        let params: lsp_types::DidChangeWatchedFilesParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(_) => return Handled::none(),
        };

        let mut outgoing = Vec::new();
        for change in params.changes {
            let uri = change.uri.to_string();
            // An open document's editor state is authoritative; a filesystem
            // watcher event racing with an unsaved edit is ignored.
            if self.documents.contains_key(&uri) {
                continue;
            }
            if change.typ == lsp_types::FileChangeType::DELETED {
                self.index.close(&uri);
                outgoing.push(empty_diagnostics_notification(&uri));
                continue;
            }
            let Some(path) = perl_uri::uri_to_fs_path(&uri) else { continue };
            let Ok(text) = std::fs::read_to_string(&path) else { continue };
            outgoing.extend(self.analyze_and_publish(&uri, &text, AnalysisMode::OnWorkspaceOpen));
        }
        Handled::notifications(outgoing)
    }
}

/// Scan backward from `offset` over identifier characters (and `:` for a
/// package-qualified prefix) to find the partial word the client is
/// completing.
fn typed_prefix(text: &str, offset: usize) -> String {
    let mut start = offset;
    let bytes = text.as_bytes();
    while start > 0 {
        let byte = bytes[start - 1];
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b':' {
            start -= 1;
        } else {
            break;
        }
    }
    text[start..offset].to_string()
}

fn enclosed_by(node: Node<'_>, kind: &str) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if n.kind() == kind {
            return true;
        }
        current = n.parent();
    }
    false
}

fn to_lsp_completion_item(item: completion::CompletionItem, uri: &str) -> lsp_types::CompletionItem {
    let kind = match item.kind {
        CompletionItemKind::Variable => lsp_types::CompletionItemKind::VARIABLE,
        CompletionItemKind::Package => lsp_types::CompletionItemKind::MODULE,
        CompletionItemKind::Function => lsp_types::CompletionItemKind::FUNCTION,
    };
    let data = item
        .detail
        .as_ref()
        .map(|qualified_name| serde_json::json!({ "qualifiedName": qualified_name, "uri": uri }));
    lsp_types::CompletionItem {
        label: item.label,
        insert_text: Some(item.insert_text),
        kind: Some(kind),
        detail: item.detail,
        data,
        ..Default::default()
    }
}
