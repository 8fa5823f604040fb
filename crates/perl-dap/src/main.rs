//! `perl-dap` binary entry point: wires [`perl_dap::DapFacade`] to a framed
//! stdio transport.
//!
//! Requests arrive on stdin and are read on a dedicated blocking thread (the
//! framing reader blocks on `read_line`/`read_exact`, which would otherwise
//! stall the async runtime); everything else — dispatching each request to
//! the facade and forwarding out-of-band driver events as DAP events — runs
//! on one task so that responses and events are written to stdout in the
//! order they're produced, matching the DAP client's expectation that
//! `seq` increases monotonically per message.

use std::io::{self, BufReader, Write};
use std::sync::atomic::{AtomicI64, Ordering};

use clap::Parser;
use perl_dap::facade::DapFacade;
use perl_dap::protocol::{Event, Response};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

/// Perl Debug Adapter Protocol server, speaking DAP over stdio.
#[derive(Parser, Debug)]
#[command(name = "perl-dap", version, about, long_about = None)]
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

/// Assigns the next outgoing `seq` to a message, mutating its `seq` field
/// in place before it's serialized — DAP requires every server-originated
/// message to carry a unique, increasing sequence number.
struct SeqCounter(AtomicI64);

impl SeqCounter {
    fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

fn write_response(seq: &SeqCounter, mut response: Response) -> io::Result<()> {
    response.seq = seq.next();
    let mut stdout = io::stdout();
    perl_dap::io::write_message(&mut stdout, &response)
}

fn write_event(seq: &SeqCounter, mut event: Event) -> io::Result<()> {
    event.seq = seq.next();
    let mut stdout = io::stdout();
    perl_dap::io::write_message(&mut stdout, &event)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    tracing::info!("perl-dap: Debug Adapter Protocol server starting on stdio");

    let (requests_tx, mut requests_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut reader = BufReader::new(io::stdin());
        loop {
            match perl_dap::io::read_message(&mut reader) {
                Ok(Some(request)) => {
                    if requests_tx.send(request).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("malformed DAP request: {e}");
                    break;
                }
            }
        }
    });

    let seq = SeqCounter::new();
    let mut facade = DapFacade::new();

    loop {
        tokio::select! {
            request = requests_rx.recv() => {
                let Some(request) = request else {
                    tracing::info!("client closed stdin, shutting down");
                    break;
                };
                let is_disconnect = request.command == "disconnect";
                let (response, events) = facade.handle_request(request).await;
                write_response(&seq, response)?;
                for event in events {
                    write_event(&seq, event)?;
                }
                if is_disconnect {
                    break;
                }
            }
            event = facade.next_driver_event(), if facade.has_driver() => {
                let Some(event) = event else {
                    continue;
                };
                write_event(&seq, event)?;
            }
        }
    }

    Ok(())
}
