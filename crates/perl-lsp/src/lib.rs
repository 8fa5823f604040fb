//! Language Server Protocol backend for Perl: routes decoded JSON-RPC
//! requests onto [`perl_workspace_index::WorkspaceIndex`] and
//! `perl-query-engine`, and drives the workspace scan protocol.
//!
//! - [`facade`] — [`facade::LspServer`], the entry point: one
//!   `handle_message` call per incoming request or notification, returning
//!   a [`facade::Handled`] the caller writes out in order.
//! - [`config`] — settings negotiated from `workspace/configuration` and the
//!   `GLOB_PATTERN` environment override.
//! - [`document`] — open-document text plus incremental-edit application,
//!   independent of any particular rope implementation's API surface.
//! - [`convert`] — position/range conversion between `lsp-types` wire shapes
//!   and the byte-offset/tree-sitter world the query engine works in.
//! - [`diagnostics`] — syntax-error-to-`lsp_types::Diagnostic` conversion
//!   and the workspace-wide problems counter.
//! - [`discovery`] — workspace file discovery under the effective glob
//!   pattern.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod discovery;
pub mod document;
pub mod facade;

pub use facade::{Handled, LspServer, Outgoing};
