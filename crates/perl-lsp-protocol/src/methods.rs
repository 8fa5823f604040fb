//! LSP method name constants for request/notification routing.
//!
//! Centralizes the method identifiers this server actually speaks, so
//! dispatch logic and tests share a single source of truth rather than
//! repeating string literals.

// ============================================================================
// Lifecycle
// ============================================================================

/// Initialize request - first request from client to server.
pub const INITIALIZE: &str = "initialize";
/// Initialized notification - sent after the initialize response.
pub const INITIALIZED: &str = "initialized";
/// Shutdown request - graceful server shutdown.
pub const SHUTDOWN: &str = "shutdown";
/// Exit notification - terminate server process.
pub const EXIT: &str = "exit";

// ============================================================================
// Text Document Synchronization
// ============================================================================

/// Document opened notification.
pub const TEXT_DOCUMENT_DID_OPEN: &str = "textDocument/didOpen";
/// Document changed notification.
pub const TEXT_DOCUMENT_DID_CHANGE: &str = "textDocument/didChange";
/// Document closed notification.
pub const TEXT_DOCUMENT_DID_CLOSE: &str = "textDocument/didClose";
/// Publish diagnostics notification (server to client).
pub const TEXT_DOCUMENT_PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";

// ============================================================================
// Language Features
// ============================================================================

/// Code completion request.
pub const TEXT_DOCUMENT_COMPLETION: &str = "textDocument/completion";
/// Completion item resolve request.
pub const COMPLETION_ITEM_RESOLVE: &str = "completionItem/resolve";
/// Hover information request.
pub const TEXT_DOCUMENT_HOVER: &str = "textDocument/hover";
/// Go to definition request.
pub const TEXT_DOCUMENT_DEFINITION: &str = "textDocument/definition";
/// Find references request.
pub const TEXT_DOCUMENT_REFERENCES: &str = "textDocument/references";
/// Document symbols request.
pub const TEXT_DOCUMENT_DOCUMENT_SYMBOL: &str = "textDocument/documentSymbol";
/// Document highlight request.
pub const TEXT_DOCUMENT_DOCUMENT_HIGHLIGHT: &str = "textDocument/documentHighlight";
/// Prepare rename request.
pub const TEXT_DOCUMENT_PREPARE_RENAME: &str = "textDocument/prepareRename";
/// Rename request.
pub const TEXT_DOCUMENT_RENAME: &str = "textDocument/rename";

// ============================================================================
// Workspace Features
// ============================================================================

/// Workspace symbols request.
pub const WORKSPACE_SYMBOL: &str = "workspace/symbol";
/// Configuration request (server to client).
pub const WORKSPACE_CONFIGURATION: &str = "workspace/configuration";
/// Configuration changed notification.
pub const WORKSPACE_DID_CHANGE_CONFIGURATION: &str = "workspace/didChangeConfiguration";
/// Watched files changed notification.
pub const WORKSPACE_DID_CHANGE_WATCHED_FILES: &str = "workspace/didChangeWatchedFiles";

// ============================================================================
// Window Features
// ============================================================================

/// Work done progress create request (server to client).
pub const WINDOW_WORK_DONE_PROGRESS_CREATE: &str = "window/workDoneProgress/create";
/// Progress notification (bidirectional).
pub const DOLLAR_PROGRESS: &str = "$/progress";

// ============================================================================
// Special Methods
// ============================================================================

/// Cancel request notification.
pub const CANCEL_REQUEST: &str = "$/cancelRequest";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_methods_are_the_lsp_wire_names() {
        assert_eq!(INITIALIZE, "initialize");
        assert_eq!(SHUTDOWN, "shutdown");
        assert_eq!(EXIT, "exit");
    }

    #[test]
    fn text_document_methods_are_the_lsp_wire_names() {
        assert_eq!(TEXT_DOCUMENT_HOVER, "textDocument/hover");
        assert_eq!(TEXT_DOCUMENT_COMPLETION, "textDocument/completion");
        assert_eq!(TEXT_DOCUMENT_DEFINITION, "textDocument/definition");
        assert_eq!(TEXT_DOCUMENT_REFERENCES, "textDocument/references");
    }

    #[test]
    fn workspace_and_window_methods_are_the_lsp_wire_names() {
        assert_eq!(WORKSPACE_SYMBOL, "workspace/symbol");
        assert_eq!(WORKSPACE_CONFIGURATION, "workspace/configuration");
        assert_eq!(WINDOW_WORK_DONE_PROGRESS_CREATE, "window/workDoneProgress/create");
        assert_eq!(CANCEL_REQUEST, "$/cancelRequest");
    }
}
