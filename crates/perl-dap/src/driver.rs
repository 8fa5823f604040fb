//! The Perl process driver: owns one `perl -d <program>` child,
//! single-flight command dispatch keyed on the debugger's ready prompt, and
//! event emission derived from prompt transitions.

use std::collections::HashMap;
use std::process::Stdio;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{mpsc, Mutex};

/// `DB<\d+>\s$` — the regular expression marking the end of a debugger
/// reply. Note the trailing whitespace: the prompt is `DB<1> `, not
/// `DB<1>`.
#[allow(clippy::expect_used)]
static PROMPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"DB<\d+>\s$").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("no program specified for launch")]
    NoProgramSpecified,
    #[error("failed to spawn perl -d: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("i/o error communicating with perl -d: {0}")]
    Io(#[source] std::io::Error),
    #[error("the debugger child process has already exited")]
    ChildExited,
    #[cfg(unix)]
    #[error("failed to signal the debuggee: {0}")]
    Signal(#[source] nix::errno::Errno),
}

/// An event derived from a prompt transition or child-process state change.
#[derive(Debug, Clone)]
pub enum DriverEvent {
    Stopped,
    Continued,
    Terminated(Option<i32>),
    Paused,
}

/// What to do around dispatching a command: whether it resumes execution
/// (emit `continued` before sending) and/or suspends it again (emit
/// `stopped` once the next prompt arrives).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    /// A command with no execution-state side effect (`b`, `T`, `y`, `V`, `x`, …).
    None,
    /// `n` / `s` / `o`: execution resumes briefly then re-stops; only `stopped` fires.
    Step,
    /// `c` / `R`: execution resumes indefinitely until the next stop; both fire.
    Resume,
}

/// Launch parameters for one debugging session.
#[derive(Debug, Clone)]
pub struct LaunchParams {
    pub program: std::path::PathBuf,
    pub cwd: Option<std::path::PathBuf>,
    pub env: HashMap<String, String>,
    pub argv: Vec<String>,
}

/// Owns the `perl -d` child and serializes every public operation behind
/// one lock, so at most one debugger command is ever in flight.
pub struct PerlProcessDriver {
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    replies: Mutex<mpsc::UnboundedReceiver<String>>,
    lock: Mutex<()>,
    events: mpsc::UnboundedSender<DriverEvent>,
    #[cfg_attr(not(unix), allow(dead_code))]
    pid: Option<u32>,
}

impl PerlProcessDriver {
    /// Spawn `perl -d <program> [argv…]` in `cwd` with `env`, and start the
    /// background reader that demultiplexes the stderr stream into
    /// prompt-delimited replies.
    pub fn spawn(params: LaunchParams, events: mpsc::UnboundedSender<DriverEvent>) -> Result<Self, DriverError> {
        if params.program.as_os_str().is_empty() {
            return Err(DriverError::NoProgramSpecified);
        }

        let mut command = tokio::process::Command::new("perl");
        command.arg("-d").arg(&params.program).args(&params.argv);
        if let Some(cwd) = &params.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &params.env {
            command.env(key, value);
        }
        command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // A fresh process group lets `pause()` signal every descendant, not
            // just the immediate child, without also killing this adapter.
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(DriverError::Spawn)?;
        let pid = child.id();
        let io_err = || DriverError::Io(std::io::Error::other("piped stdio handle missing after spawn"));
        let stdin = child.stdin.take().ok_or_else(io_err)?;
        let stderr = child.stderr.take().ok_or_else(io_err)?;
        let mut stdout = child.stdout.take().ok_or_else(io_err)?;

        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        tokio::spawn(read_replies(stderr, reply_tx));
        tokio::spawn(async move {
            // Program output when `$| = 1`; not part of the command/reply
            // protocol, only drained so the child never blocks on a full pipe.
            let mut sink = [0u8; 4096];
            loop {
                match stdout.read(&mut sink).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        });

        Ok(Self { child: Mutex::new(child), stdin: Mutex::new(stdin), replies: Mutex::new(reply_rx), lock: Mutex::new(()), events, pid })
    }

    /// Wait for the child to exit and emit `terminated(code)`. Spawn this
    /// as a background task right after `spawn()`.
    pub async fn watch_for_exit(&self) {
        let status = {
            let mut child = self.child.lock().await;
            child.wait().await
        };
        let code = status.ok().and_then(|s| s.code());
        let _ = self.events.send(DriverEvent::Terminated(code));
    }

    async fn dispatch(&self, command: &str, step_kind: StepKind) -> Result<String, DriverError> {
        let _guard = self.lock.lock().await;
        if step_kind == StepKind::Resume {
            let _ = self.events.send(DriverEvent::Continued);
        }
        {
            let mut stdin = self.stdin.lock().await;
            stdin.write_all(command.as_bytes()).await.map_err(DriverError::Io)?;
            stdin.write_all(b"\n").await.map_err(DriverError::Io)?;
            stdin.flush().await.map_err(DriverError::Io)?;
        }
        let reply = {
            let mut replies = self.replies.lock().await;
            replies.recv().await.ok_or(DriverError::ChildExited)?
        };
        if step_kind != StepKind::None {
            let _ = self.events.send(DriverEvent::Stopped);
        }
        Ok(reply)
    }

    pub async fn auto_flush_stdout(&self) -> Result<String, DriverError> {
        self.dispatch("$| = 1;", StepKind::None).await
    }

    pub async fn set_tty(&self, path: &str) -> Result<String, DriverError> {
        self.dispatch(&format!("o TTY={path}"), StepKind::None).await
    }

    pub async fn trace(&self) -> Result<String, DriverError> {
        self.dispatch("T", StepKind::None).await
    }

    /// `b file:line [cond]`. The reply is returned verbatim — the caller
    /// tests it for `not breakable`.
    pub async fn set_breakpoint(&self, file: &str, line: u32, condition: Option<&str>) -> Result<String, DriverError> {
        let command = match condition {
            Some(cond) => format!("b {file}:{line} {cond}"),
            None => format!("b {file}:{line}"),
        };
        self.dispatch(&command, StepKind::None).await
    }

    pub async fn delete_breakpoints(&self, lines: &[u32]) -> Result<(), DriverError> {
        for line in lines {
            self.dispatch(&format!("B {line}"), StepKind::None).await?;
        }
        Ok(())
    }

    pub async fn continue_(&self) -> Result<String, DriverError> {
        self.dispatch("c", StepKind::Resume).await
    }

    pub async fn next(&self) -> Result<String, DriverError> {
        self.dispatch("n", StepKind::Step).await
    }

    pub async fn single_step(&self) -> Result<String, DriverError> {
        self.dispatch("s", StepKind::Step).await
    }

    pub async fn step_out(&self) -> Result<String, DriverError> {
        self.dispatch("o", StepKind::Step).await
    }

    pub async fn restart(&self) -> Result<String, DriverError> {
        self.dispatch("R", StepKind::Resume).await
    }

    pub async fn get_local_scoped_variables(&self) -> Result<String, DriverError> {
        self.dispatch("y", StepKind::None).await
    }

    pub async fn get_global_scoped_variables(&self) -> Result<String, DriverError> {
        self.dispatch("V", StepKind::None).await
    }

    /// `x expr`, auto-dereferencing a leading `%` to `\%` (hashes must be
    /// passed by reference to `x` to enumerate their pairs).
    pub async fn evaluate(&self, expr: &str) -> Result<String, DriverError> {
        let command = perl_dap_variables::dereference_hash_expr(expr);
        self.dispatch(&format!("x {command}"), StepKind::None).await
    }

    /// Signal the process group with `SIGINT`, falling back to the direct
    /// child if group signalling fails.
    #[cfg(unix)]
    pub fn pause(&self) -> Result<(), DriverError> {
        use nix::sys::signal::{kill, killpg, Signal};
        use nix::unistd::Pid;
        let pid = self.pid.ok_or(DriverError::ChildExited)?;
        let pid = Pid::from_raw(pid as i32);
        if killpg(pid, Signal::SIGINT).is_err() {
            kill(pid, Signal::SIGINT).map_err(DriverError::Signal)?;
        }
        let _ = self.events.send(DriverEvent::Paused);
        Ok(())
    }
}

async fn read_replies(stream: tokio::process::ChildStderr, tx: mpsc::UnboundedSender<String>) {
    let mut reader = stream;
    let mut buffer = String::new();
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buffer.push_str(&String::from_utf8_lossy(&chunk[..n]));
                if PROMPT_RE.is_match(&buffer) {
                    let reply = std::mem::take(&mut buffer);
                    if tx.send(reply).is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// A one-shot handle used only in tests to await the next emitted event
/// without racing the background reader task.
#[cfg(test)]
pub(crate) async fn next_event(rx: &mut mpsc::UnboundedReceiver<DriverEvent>) -> Option<DriverEvent> {
    rx.recv().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_regex_matches_trailing_prompt_with_space() {
        assert!(PROMPT_RE.is_match("some output\nDB<12> "));
        assert!(!PROMPT_RE.is_match("some output\nDB<12>"));
        assert!(!PROMPT_RE.is_match("not a prompt"));
    }

    #[test]
    fn no_program_specified_is_rejected_before_spawning() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let params = LaunchParams { program: std::path::PathBuf::new(), cwd: None, env: HashMap::new(), argv: vec![] };
        let err = PerlProcessDriver::spawn(params, tx).expect_err("empty program path is rejected");
        assert!(matches!(err, DriverError::NoProgramSpecified));
    }
}
