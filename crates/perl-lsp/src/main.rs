//! `perl-lsp` binary entry point: wires [`perl_lsp::LspServer`] to a framed
//! stdio transport.
//!
//! The read loop blocks on `Content-Length` framed stdin, so it runs on a
//! dedicated thread; the main thread drains the resulting channel and feeds
//! each request to the single-threaded [`perl_lsp::LspServer`], writing its
//! response and any outgoing notifications/requests to stdout in order
//! before handling the next message. This matches the facade's contract
//! that the index is a single-writer resource: nothing here dispatches two
//! requests concurrently.

use std::io::{self, BufReader};
use std::sync::mpsc;

use clap::Parser;
use perl_lsp::{Handled, LspServer, Outgoing};
use perl_lsp_protocol::JsonRpcRequest;
use tracing_subscriber::{fmt, EnvFilter};

/// Perl Language Server, speaking LSP over stdio.
#[derive(Parser, Debug)]
#[command(name = "perl-lsp", version, about, long_about = None)]
struct Args {
    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn write_outgoing(stdout: &mut io::Stdout, message: Outgoing) -> io::Result<()> {
    match message {
        Outgoing::Notification { method, params } => perl_lsp_transport::write_notification(stdout, &method, params),
        Outgoing::Request { id, method, params } => perl_lsp_transport::write_request(stdout, id, &method, params),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    tracing::info!("perl-lsp: Language Server Protocol server starting on stdio");

    let (requests_tx, requests_rx) = mpsc::channel::<JsonRpcRequest>();
    std::thread::spawn(move || {
        let mut reader = BufReader::new(io::stdin());
        loop {
            match perl_lsp_transport::read_message(&mut reader) {
                Ok(Some(request)) => {
                    if requests_tx.send(request).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("malformed LSP request: {e}");
                    break;
                }
            }
        }
    });

    let mut server = LspServer::new();
    let mut stdout = io::stdout();

    for request in requests_rx {
        let Handled { response, outgoing, should_exit } = server.handle_message(request);
        if let Some(response) = response {
            perl_lsp_transport::log_response(&response);
            perl_lsp_transport::write_message(&mut stdout, &response)?;
        }
        for message in outgoing {
            write_outgoing(&mut stdout, message)?;
        }
        if should_exit {
            tracing::info!("received exit, shutting down");
            break;
        }
    }

    Ok(())
}
