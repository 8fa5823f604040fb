//! Workspace index: global `URI -> tree/declarations/references`
//! mappings, ownership and invalidation.

#![deny(unsafe_code)]
#![deny(unreachable_pub)]
#![warn(rust_2018_idioms)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

mod cache;
mod index;

pub use cache::CachingStrategy;
pub use index::{AnalysisMode, IndexError, WorkspaceIndex};
