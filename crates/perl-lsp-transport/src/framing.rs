//! Content-Length message framing over a byte stream, per the LSP Base
//! Protocol: each message is preceded by a `Content-Length: N\r\n` header
//! (optionally a `Content-Type` header, which this implementation ignores
//! on read and never emits on write), a blank line, then exactly `N` bytes
//! of UTF-8 JSON.

use std::io::{BufRead, Write};

use perl_lsp_protocol::{JsonRpcRequest, JsonRpcResponse};

/// Read one framed message from `reader`.
///
/// Returns `Ok(None)` on a clean EOF before any header line is read (the
/// client closed the stream between messages). A malformed header or a
/// truncated body is an `Err`.
pub fn read_message<R: BufRead>(reader: &mut R) -> std::io::Result<Option<JsonRpcRequest>> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            return if content_length.is_none() {
                Ok(None)
            } else {
                Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "stream closed mid-header"))
            };
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            let value = value.trim();
            content_length = Some(value.parse().map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, format!("bad Content-Length: {value}"))
            })?);
        }
        // Any other header (e.g. Content-Type) is read and discarded.
    }

    let length = content_length
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, "missing Content-Length header"))?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;
    let request: JsonRpcRequest = serde_json::from_slice(&body)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("malformed JSON-RPC body: {e}")))?;
    Ok(Some(request))
}

fn write_framed<W: Write>(writer: &mut W, body: &[u8]) -> std::io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
    writer.write_all(body)?;
    writer.flush()
}

/// Write a response (or request-shaped outgoing message) with Content-Length framing.
pub fn write_message<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> std::io::Result<()> {
    let body = serde_json::to_vec(response)?;
    write_framed(writer, &body)
}

/// Write a server-to-client notification (a JSON-RPC object with a `method`
/// and `params` but no `id`).
pub fn write_notification<W: Write>(
    writer: &mut W,
    method: &str,
    params: serde_json::Value,
) -> std::io::Result<()> {
    let body = serde_json::to_vec(&serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
    }))?;
    write_framed(writer, &body)
}

/// Write a server-initiated request (a JSON-RPC object with an `id` the
/// caller must remember in order to match the eventual response), such as
/// `workspace/configuration` or `window/workDoneProgress/create`.
pub fn write_request<W: Write>(
    writer: &mut W,
    id: serde_json::Value,
    method: &str,
    params: serde_json::Value,
) -> std::io::Result<()> {
    let body = serde_json::to_vec(&serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    }))?;
    write_framed(writer, &body)
}

/// Debug-log an outgoing response to stderr when `PERL_LSP_TRACE_IO` is set.
/// Never writes to stdout, which is reserved for framed protocol traffic.
pub fn log_response(response: &JsonRpcResponse) {
    if std::env::var_os("PERL_LSP_TRACE_IO").is_some() {
        if let Ok(json) = serde_json::to_string(response) {
            eprintln!("--> {json}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn round_trips_a_request() {
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let mut framed = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        framed.extend_from_slice(body);
        let mut reader = BufReader::new(Cursor::new(framed));
        let request = read_message(&mut reader).expect("reads").expect("present");
        assert_eq!(request.method, "initialize");
    }

    #[test]
    fn clean_eof_before_any_header_is_none() {
        let mut reader = BufReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(read_message(&mut reader).expect("reads").is_none());
    }

    #[test]
    fn write_message_emits_content_length_header() {
        let mut out = Vec::new();
        write_message(&mut out, &JsonRpcResponse::null(Some(serde_json::json!(1)))).expect("writes");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("Content-Length: "));
        assert!(text.contains("\r\n\r\n"));
    }

    #[test]
    fn ignores_unknown_headers_like_content_type() {
        let body = br#"{"jsonrpc":"2.0","id":null,"method":"initialized","params":{}}"#;
        let mut framed = format!("Content-Length: {}\r\nContent-Type: application/vscode-jsonrpc\r\n\r\n", body.len())
            .into_bytes();
        framed.extend_from_slice(body);
        let mut reader = BufReader::new(Cursor::new(framed));
        let request = read_message(&mut reader).expect("reads").expect("present");
        assert_eq!(request.method, "initialized");
    }
}
