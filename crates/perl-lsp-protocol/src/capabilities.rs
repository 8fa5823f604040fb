//! Server capability negotiation for the `initialize` handshake.
//!
//! This server advertises: incremental text-document sync, completion
//! (with resolve), definition, hover, references, rename (with prepare),
//! document highlight, document symbol, and workspace symbol. There is no
//! per-build feature gating — every capability here has a corresponding
//! `perl-query-engine` implementation, so there is nothing to flag off.

use lsp_types::*;

/// The trigger characters completion fires on: the three variable sigils
/// plus identifier/package-qualifier punctuation.
const COMPLETION_TRIGGER_CHARACTERS: [&str; 6] = ["$", "@", "%", ".", ":", "::"];

/// Build this server's [`ServerCapabilities`] for the `initialize` response.
pub fn server_capabilities() -> ServerCapabilities {
    let mut caps = ServerCapabilities::default();

    caps.text_document_sync = Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
        open_close: Some(true),
        change: Some(TextDocumentSyncKind::INCREMENTAL),
        will_save: None,
        will_save_wait_until: None,
        save: None,
    }));

    caps.completion_provider = Some(CompletionOptions {
        resolve_provider: Some(true),
        trigger_characters: Some(COMPLETION_TRIGGER_CHARACTERS.iter().map(|s| s.to_string()).collect()),
        all_commit_characters: None,
        work_done_progress_options: WorkDoneProgressOptions::default(),
        completion_item: None,
    });

    caps.definition_provider = Some(OneOf::Left(true));
    caps.hover_provider = Some(HoverProviderCapability::Simple(true));
    caps.references_provider = Some(OneOf::Left(true));
    caps.document_highlight_provider = Some(OneOf::Left(true));
    caps.document_symbol_provider = Some(OneOf::Left(true));
    caps.workspace_symbol_provider = Some(OneOf::Left(true));
    caps.rename_provider = Some(OneOf::Right(RenameOptions {
        prepare_provider: Some(true),
        work_done_progress_options: WorkDoneProgressOptions::default(),
    }));

    caps
}

/// The three client-capability flags the facade negotiates from
/// `initialize`'s `ClientCapabilities`: whether `workspace/configuration`
/// pull is supported, whether workspace folders are supported, and whether
/// `publishDiagnostics.relatedInformation` is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegotiatedClientCapabilities {
    /// The client supports `workspace/configuration` pull requests.
    pub configuration: bool,
    /// The client supports `workspace/workspaceFolders`.
    pub workspace_folders: bool,
    /// The client's `publishDiagnostics` supports `relatedInformation`.
    pub related_information: bool,
}

impl NegotiatedClientCapabilities {
    /// Extract the three flags from the client's declared capabilities.
    pub fn negotiate(caps: &ClientCapabilities) -> Self {
        let configuration = caps.workspace.as_ref().is_some_and(|w| w.configuration.unwrap_or(false));
        let workspace_folders = caps.workspace.as_ref().is_some_and(|w| w.workspace_folders.unwrap_or(false));
        let related_information = caps
            .text_document
            .as_ref()
            .and_then(|t| t.publish_diagnostics.as_ref())
            .is_some_and(|p| p.related_information.unwrap_or(false));
        Self { configuration, workspace_folders, related_information }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_incremental_sync() {
        let caps = server_capabilities();
        match caps.text_document_sync {
            Some(TextDocumentSyncCapability::Options(opts)) => {
                assert_eq!(opts.change, Some(TextDocumentSyncKind::INCREMENTAL));
            }
            _ => panic!("expected incremental sync options"),
        }
    }

    #[test]
    fn completion_advertises_resolve_and_trigger_characters() {
        let caps = server_capabilities();
        let completion = caps.completion_provider.expect("completion provider");
        assert_eq!(completion.resolve_provider, Some(true));
        let triggers = completion.trigger_characters.expect("trigger characters");
        assert!(triggers.contains(&"$".to_string()));
        assert!(triggers.contains(&"::".to_string()));
    }

    #[test]
    fn rename_advertises_prepare_support() {
        let caps = server_capabilities();
        match caps.rename_provider {
            Some(OneOf::Right(opts)) => assert_eq!(opts.prepare_provider, Some(true)),
            _ => panic!("expected rename options with prepare support"),
        }
    }

    #[test]
    fn negotiates_absent_client_capabilities_as_all_false() {
        let negotiated = NegotiatedClientCapabilities::negotiate(&ClientCapabilities::default());
        assert_eq!(negotiated, NegotiatedClientCapabilities::default());
    }

    #[test]
    fn negotiates_configuration_and_workspace_folders_support() {
        let caps = ClientCapabilities {
            workspace: Some(WorkspaceClientCapabilities {
                configuration: Some(true),
                workspace_folders: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let negotiated = NegotiatedClientCapabilities::negotiate(&caps);
        assert!(negotiated.configuration);
        assert!(negotiated.workspace_folders);
        assert!(!negotiated.related_information);
    }
}
