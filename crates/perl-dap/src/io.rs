//! Content-Length message framing, same base protocol as the LSP side
//! (see `perl-lsp-transport`), adapted to DAP's `seq`-keyed message shapes
//! rather than JSON-RPC's `id`/`method` envelope.

use std::io::{BufRead, Write};

use crate::protocol::Request;

/// Read one framed DAP request. `Ok(None)` on a clean EOF before any header
/// line — the client closed the stream between messages.
pub fn read_message<R: BufRead>(reader: &mut R) -> std::io::Result<Option<Request>> {
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
    }

    let length = content_length
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, "missing Content-Length header"))?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;
    let request: Request = serde_json::from_slice(&body)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("malformed DAP body: {e}")))?;
    Ok(Some(request))
}

fn write_framed<W: Write>(writer: &mut W, body: &[u8]) -> std::io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
    writer.write_all(body)?;
    writer.flush()
}

/// Serialize and write any framed DAP message (response or event).
pub fn write_message<W: Write, T: serde::Serialize>(writer: &mut W, message: &T) -> std::io::Result<()> {
    let body = serde_json::to_vec(message)?;
    write_framed(writer, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn round_trips_a_request() {
        let body = br#"{"seq":1,"type":"request","command":"initialize","arguments":{}}"#;
        let mut framed = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
        framed.extend_from_slice(body);
        let mut reader = BufReader::new(Cursor::new(framed));
        let request = read_message(&mut reader).expect("reads").expect("present");
        assert_eq!(request.command, "initialize");
    }

    #[test]
    fn clean_eof_before_any_header_is_none() {
        let mut reader = BufReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(read_message(&mut reader).expect("reads").is_none());
    }

    #[test]
    fn write_message_emits_content_length_header() {
        let mut out = Vec::new();
        let response = crate::protocol::Response::success(1, "initialize", None);
        write_message(&mut out, &response).expect("writes");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("Content-Length: "));
        assert!(text.contains("\r\n\r\n"));
    }
}
