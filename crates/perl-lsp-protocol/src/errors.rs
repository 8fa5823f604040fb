//! Standard JSON-RPC and LSP error codes.
//!
//! These mirror the codes fixed by the JSON-RPC 2.0 spec and the LSP 3.17
//! extensions to it. Handlers should build `JsonRpcError` values using these
//! constants rather than inventing raw numbers inline.

use crate::jsonrpc::JsonRpcError;

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The requested method does not exist or is not available.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameter(s).
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;

/// A request was cancelled by the client via `$/cancelRequest`.
pub const REQUEST_CANCELLED: i32 = -32800;
/// The content of a request got modified in a way it is not valid anymore.
pub const CONTENT_MODIFIED: i32 = -32801;
/// The server received a request before it finished `initialize`.
pub const SERVER_NOT_INITIALIZED: i32 = -32002;
/// The server detected a request after `shutdown` but before `exit`.
pub const UNKNOWN_ERROR_CODE: i32 = -32001;

/// Build an `Invalid params` error for a given method.
pub fn invalid_params(detail: impl Into<String>) -> JsonRpcError {
    JsonRpcError::new(INVALID_PARAMS, detail.into())
}

/// Build a `Method not found` error for a given method name.
pub fn method_not_found(method: &str) -> JsonRpcError {
    JsonRpcError::new(METHOD_NOT_FOUND, format!("method not found: {method}"))
}

/// Build an `Internal error` response carrying a human-readable cause.
pub fn internal_error(detail: impl Into<String>) -> JsonRpcError {
    JsonRpcError::new(INTERNAL_ERROR, detail.into())
}

/// Build a `Server not initialized` error for requests arriving too early.
pub fn server_not_initialized() -> JsonRpcError {
    JsonRpcError::new(SERVER_NOT_INITIALIZED, "server is not initialized")
}

/// Build a `Request cancelled` error for the given request id.
pub fn request_cancelled() -> JsonRpcError {
    JsonRpcError::new(REQUEST_CANCELLED, "request cancelled")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_params_carries_detail() {
        let err = invalid_params("expected a position");
        assert_eq!(err.code, INVALID_PARAMS);
        assert_eq!(err.message, "expected a position");
    }

    #[test]
    fn method_not_found_includes_method_name() {
        let err = method_not_found("textDocument/frobnicate");
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert!(err.message.contains("textDocument/frobnicate"));
    }
}
