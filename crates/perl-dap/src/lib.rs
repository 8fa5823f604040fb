//! Debug Adapter Protocol server for Perl: owns one `perl -d` child per
//! session, demultiplexes its prompt-delimited replies into a
//! single-flight command/reply protocol, and maps DAP requests onto it.
//!
//! - [`driver`] — the Perl process driver: spawns `perl -d`, serializes
//!   every command behind one lock, and derives `stopped`/`continued`/
//!   `terminated`/`paused` events from prompt transitions.
//! - [`breakpoints`] — the per-source-path breakpoint table, replacing
//!   a file's breakpoints wholesale on every `setBreakpoints`.
//! - [`variables`] — variable-reference handle minting and the "prettify"
//!   rendering rules for scopes, arrays, hashes, and scalar indirections.
//! - [`protocol`] — the DAP request/response/event message shapes this
//!   adapter understands.
//! - [`io`] — Content-Length framing over stdio, shared in shape with
//!   `perl-lsp-transport` but keyed on DAP's `seq` rather than JSON-RPC's
//!   `id`/`method`.
//! - [`facade`] — [`facade::DapFacade`], the entry point that ties the
//!   above together: one `handle_request` per incoming message, plus
//!   `next_driver_event` for out-of-band events.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

pub mod breakpoints;
pub mod driver;
pub mod facade;
pub mod io;
pub mod protocol;
pub mod variables;

pub use breakpoints::BreakpointTable;
pub use driver::{DriverError, DriverEvent, LaunchParams, PerlProcessDriver};
pub use facade::{default_capabilities, DapFacade};
pub use protocol::{Event, Request, Response};
pub use variables::{VariableHandle, VariableStore};
