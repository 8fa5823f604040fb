//! Shared test-only assertion helpers.
//!
//! Parser crates in this workspace exercise dozens of small fixture strings
//! per test; a bare `.unwrap()` on a mismatch just says `None`/`Err` with no
//! indication of which fixture or branch produced it. These helpers panic
//! with the fixture's own `Debug` output instead.

#![allow(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use std::fmt::Debug;

/// Unwrap an `Option`, panicking with the surrounding context if it's `None`.
#[track_caller]
pub fn must_some<T>(value: Option<T>) -> T {
    match value {
        Some(v) => v,
        None => panic!("expected Some(_), got None"),
    }
}

/// Unwrap an `Option`, panicking with a caller-supplied message on `None`.
#[track_caller]
pub fn must_some_with<T>(value: Option<T>, context: &str) -> T {
    match value {
        Some(v) => v,
        None => panic!("expected Some(_), got None: {context}"),
    }
}

/// Unwrap a `Result`, panicking with the `Err` value's `Debug` output.
#[track_caller]
pub fn must_ok<T, E: Debug>(value: Result<T, E>) -> T {
    match value {
        Ok(v) => v,
        Err(e) => panic!("expected Ok(_), got Err({e:?})"),
    }
}
