//! The DAP facade: maps DAP requests onto the process driver and the
//! debugger output parsers, maintaining the breakpoint table,
//! variable-reference handles, and the stop-on-entry heuristic.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, Notify};

use perl_dap_stack::{parse_stack_trace, render_frame_name};
use perl_dap_variables::parse_evaluate_reply;

use crate::breakpoints::BreakpointTable;
use crate::driver::{DriverError, DriverEvent, LaunchParams, PerlProcessDriver};
use crate::protocol::{
    Capabilities, ContinueResponseBody, EvaluateArguments, EvaluateResponseBody, Event, ExceptionBreakpointFilter,
    LaunchRequestArguments, ProtocolStackFrame, Request, Response, Scope, ScopesResponseBody, SetBreakpointsArguments,
    SetBreakpointsResponseBody, Source, StackTraceResponseBody, Thread, ThreadsResponseBody, VariablesArguments,
    VariablesResponseBody,
};
use crate::variables::VariableStore;

/// How long `configurationDone` may be waited on before `launch` proceeds
/// anyway.
const CONFIGURATION_DONE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Capabilities advertised in the `initialize` response. Exception-info and
/// step-in-targets are advertised but unsupported in practice — known
/// limitations, not bugs.
pub fn default_capabilities() -> Capabilities {
    Capabilities {
        supports_configuration_done_request: Some(true),
        supports_evaluate_for_hovers: Some(true),
        supports_conditional_breakpoints: Some(true),
        supports_log_points: Some(true),
        supports_completions_request: Some(true),
        completion_trigger_characters: Some(vec![".".to_string(), ":".to_string(), "$".to_string(), "%".to_string(), "@".to_string()]),
        supports_breakpoint_locations_request: Some(true),
        supports_function_breakpoints: Some(true),
        supports_step_in_targets_request: Some(false),
        supports_exception_info_request: Some(true),
        supports_set_variable: Some(true),
        supports_set_expression: Some(true),
        supports_disassemble_request: Some(true),
        supports_stepping_granularity: Some(true),
        supports_instruction_breakpoints: Some(true),
        supports_read_memory_request: Some(true),
        supports_write_memory_request: Some(true),
        support_suspend_debuggee: Some(true),
        support_terminate_debuggee: Some(true),
        supports_delayed_stack_trace_loading: Some(true),
        exception_breakpoint_filters: Some(vec![ExceptionBreakpointFilter {
            filter: "die".to_string(),
            label: "Uncaught Exception".to_string(),
            default: Some(true),
        }]),
    }
}

fn parse_args<T: DeserializeOwned + Default>(request: &Request) -> Result<T, String> {
    match &request.arguments {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| e.to_string()),
        None => Ok(T::default()),
    }
}

fn respond<T: serde::Serialize>(request_seq: i64, command: &str, body: T) -> Response {
    let body = serde_json::to_value(body).ok();
    Response::success(request_seq, command, body)
}

fn respond_empty(request_seq: i64, command: &str) -> Response {
    Response::success(request_seq, command, None)
}

fn respond_err(request_seq: i64, command: &str, err: impl std::fmt::Display) -> Response {
    Response::failure(request_seq, command, err.to_string())
}

/// The error shape for a `launch` whose `program` argument was missing: id
/// 1001, a fixed message text, surfaced both as the response `message` and
/// as a DAP-conventional `body.error`.
fn program_missing_response(request_seq: i64, command: &str) -> Response {
    const MESSAGE: &str = "No program specified to debug.";
    let mut response = Response::failure(request_seq, command, MESSAGE);
    response.body = Some(serde_json::json!({ "error": { "id": 1001, "format": MESSAGE } }));
    response
}

/// Which stepping command a `next`/`stepIn`/`stepOut`/`restart` request maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Next,
    SingleStep,
    StepOut,
    Restart,
}

/// Whether `args.stopOnEntry == false` and the given line isn't a known
/// breakpoint — the condition under which the first `stackTrace` silently
/// resumes the debuggee.
fn should_auto_continue(stop_on_entry: bool, top_frame_is_breakpoint: bool) -> bool {
    !stop_on_entry && !top_frame_is_breakpoint
}

pub struct DapFacade {
    driver: Option<Arc<PerlProcessDriver>>,
    driver_events: Option<mpsc::UnboundedReceiver<DriverEvent>>,
    breakpoints: BreakpointTable,
    variables: VariableStore,
    configuration_done: Arc<Notify>,
    stop_on_entry: bool,
    first_stack_trace_served: bool,
}

impl Default for DapFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DapFacade {
    pub fn new() -> Self {
        Self {
            driver: None,
            driver_events: None,
            breakpoints: BreakpointTable::new(),
            variables: VariableStore::new(),
            configuration_done: Arc::new(Notify::new()),
            stop_on_entry: false,
            first_stack_trace_served: false,
        }
    }

    /// Handle one DAP request, returning its response and any events that
    /// must be sent alongside it (in order, after the response).
    pub async fn handle_request(&mut self, request: Request) -> (Response, Vec<Event>) {
        let seq = request.seq;
        let command = request.command.clone();
        match command.as_str() {
            "initialize" => (respond(seq, &command, default_capabilities()), Vec::new()),
            "configurationDone" => {
                self.configuration_done.notify_waiters();
                (respond_empty(seq, &command), Vec::new())
            }
            "launch" => self.handle_launch(seq, &command, &request).await,
            "setBreakpoints" => self.handle_set_breakpoints(seq, &command, &request).await,
            "setExceptionBreakpoints" => (respond_empty(seq, &command), Vec::new()),
            "threads" => (respond(seq, &command, ThreadsResponseBody { threads: vec![Thread { id: 1, name: "main thread".to_string() }] }), Vec::new()),
            "stackTrace" => self.handle_stack_trace(seq, &command).await,
            "scopes" => (respond(seq, &command, ScopesResponseBody {
                scopes: vec![
                    Scope { name: "Locals & Closure".to_string(), variables_reference: self.variables.locals_reference(), expensive: false },
                    Scope { name: "Globals".to_string(), variables_reference: self.variables.globals_reference(), expensive: true },
                ],
            }), Vec::new()),
            "variables" => self.handle_variables(seq, &command, &request).await,
            "evaluate" => self.handle_evaluate(seq, &command, &request).await,
            "continue" => self.handle_continue(seq, &command).await,
            "next" => self.handle_step(seq, &command, Step::Next).await,
            "stepIn" => self.handle_step(seq, &command, Step::SingleStep).await,
            "stepOut" => self.handle_step(seq, &command, Step::StepOut).await,
            "restart" => self.handle_step(seq, &command, Step::Restart).await,
            "pause" => self.handle_pause(seq, &command),
            "disconnect" | "terminate" => (respond_empty(seq, &command), Vec::new()),
            other => (respond_err(seq, &command, format!("unsupported command: {other}")), Vec::new()),
        }
    }

    async fn handle_launch(&mut self, seq: i64, command: &str, request: &Request) -> (Response, Vec<Event>) {
        let args: LaunchRequestArguments = match parse_args(request) {
            Ok(a) => a,
            Err(e) => return (respond_err(seq, command, e), Vec::new()),
        };
        self.stop_on_entry = args.stop_on_entry;

        let _ = tokio::time::timeout(CONFIGURATION_DONE_TIMEOUT, self.configuration_done.notified()).await;

        let argv = args.args.map(|s| s.split_whitespace().map(str::to_string).collect()).unwrap_or_default();
        let params = LaunchParams {
            program: std::path::PathBuf::from(args.program),
            cwd: args.cwd.map(std::path::PathBuf::from),
            env: args.env.unwrap_or_default(),
            argv,
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let driver = match PerlProcessDriver::spawn(params, event_tx) {
            Ok(d) => Arc::new(d),
            Err(DriverError::NoProgramSpecified) => return (program_missing_response(seq, command), Vec::new()),
            Err(e) => return (respond_err(seq, command, e), Vec::new()),
        };
        {
            let watched = Arc::clone(&driver);
            tokio::spawn(async move { watched.watch_for_exit().await });
        }
        self.driver = Some(driver);
        self.driver_events = Some(event_rx);

        if let Some(driver) = &self.driver {
            if let Err(e) = driver.auto_flush_stdout().await {
                return (respond_err(seq, command, e), Vec::new());
            }
        }

        (respond_empty(seq, command), vec![Event::new("initialized", None)])
    }

    async fn handle_set_breakpoints(&mut self, seq: i64, command: &str, request: &Request) -> (Response, Vec<Event>) {
        let args: SetBreakpointsArguments = match parse_args(request) {
            Ok(a) => a,
            Err(e) => return (respond_err(seq, command, e), Vec::new()),
        };
        let Some(driver) = &self.driver else {
            return (respond_err(seq, command, "no active debug session"), Vec::new());
        };
        let path = args.source.path.unwrap_or_default();
        match self.breakpoints.set_breakpoints(driver, &path, &args.breakpoints).await {
            Ok(breakpoints) => (respond(seq, command, SetBreakpointsResponseBody { breakpoints }), Vec::new()),
            Err(e) => (respond_err(seq, command, e), Vec::new()),
        }
    }

    async fn handle_stack_trace(&mut self, seq: i64, command: &str) -> (Response, Vec<Event>) {
        let Some(driver) = self.driver.clone() else {
            return (respond_err(seq, command, "no active debug session"), Vec::new());
        };
        let raw = match driver.trace().await {
            Ok(raw) => raw,
            Err(e) => return (respond_err(seq, command, e), Vec::new()),
        };
        let frames = parse_stack_trace(&raw);
        let stack_frames: Vec<ProtocolStackFrame> = frames
            .iter()
            .enumerate()
            .map(|(i, frame)| ProtocolStackFrame {
                id: i as i64,
                name: render_frame_name(frame),
                source: Some(Source { path: Some(frame.caller_file.clone()), name: basename(&frame.caller_file) }),
                line: frame.line as i64,
                column: 1,
            })
            .collect();

        if !self.first_stack_trace_served {
            self.first_stack_trace_served = true;
            if let Some(top) = frames.first() {
                let top_is_breakpoint = self.breakpoints.has_breakpoint_at(&top.caller_file, top.line as i64);
                if should_auto_continue(self.stop_on_entry, top_is_breakpoint) {
                    let _ = driver.continue_().await;
                }
            }
        }

        let total_frames = stack_frames.len() as i64;
        (respond(seq, command, StackTraceResponseBody { stack_frames, total_frames }), Vec::new())
    }

    async fn handle_variables(&mut self, seq: i64, command: &str, request: &Request) -> (Response, Vec<Event>) {
        let args: VariablesArguments = match parse_args(request) {
            Ok(a) => a,
            Err(e) => return (respond_err(seq, command, e), Vec::new()),
        };
        let Some(driver) = self.driver.clone() else {
            return (respond_err(seq, command, "no active debug session"), Vec::new());
        };
        match self.variables.resolve(&driver, args.variables_reference).await {
            Ok(variables) => (respond(seq, command, VariablesResponseBody { variables }), Vec::new()),
            Err(e) => (respond_err(seq, command, e), Vec::new()),
        }
    }

    async fn handle_evaluate(&mut self, seq: i64, command: &str, request: &Request) -> (Response, Vec<Event>) {
        let args: EvaluateArguments = match parse_args(request) {
            Ok(a) => a,
            Err(e) => return (respond_err(seq, command, e), Vec::new()),
        };
        let Some(driver) = &self.driver else {
            return (respond_err(seq, command, "no active debug session"), Vec::new());
        };
        let raw_reply = match driver.evaluate(&args.expression).await {
            Ok(raw) => raw,
            Err(e) => return (respond_err(seq, command, e), Vec::new()),
        };
        let result = parse_evaluate_reply(&args.expression, &raw_reply);
        let variables_reference = self.variables.reference_for_evaluate(&result);
        (respond(seq, command, EvaluateResponseBody { result, variables_reference }), Vec::new())
    }

    async fn dispatch_thread_scoped<F, Fut>(&mut self, seq: i64, command: &str, op: F) -> (Response, Vec<Event>)
    where
        F: FnOnce(Arc<PerlProcessDriver>) -> Fut,
        Fut: std::future::Future<Output = Result<String, DriverError>>,
    {
        let Some(driver) = self.driver.clone() else {
            return (respond_err(seq, command, "no active debug session"), Vec::new());
        };
        match op(driver).await {
            Ok(_) => (respond_empty(seq, command), Vec::new()),
            Err(e) => (respond_err(seq, command, e), Vec::new()),
        }
    }

    async fn handle_continue(&mut self, seq: i64, command: &str) -> (Response, Vec<Event>) {
        self.dispatch_thread_scoped(seq, command, |driver| async move { driver.continue_().await }).await.map_continue()
    }

    async fn handle_step(&mut self, seq: i64, command: &str, step: Step) -> (Response, Vec<Event>) {
        match step {
            Step::Next => self.dispatch_thread_scoped(seq, command, |driver| async move { driver.next().await }).await,
            Step::SingleStep => {
                self.dispatch_thread_scoped(seq, command, |driver| async move { driver.single_step().await }).await
            }
            Step::StepOut => {
                self.dispatch_thread_scoped(seq, command, |driver| async move { driver.step_out().await }).await
            }
            Step::Restart => {
                self.dispatch_thread_scoped(seq, command, |driver| async move { driver.restart().await }).await
            }
        }
    }

    fn handle_pause(&mut self, seq: i64, command: &str) -> (Response, Vec<Event>) {
        #[cfg(unix)]
        {
            match &self.driver {
                Some(driver) => match driver.pause() {
                    Ok(()) => (respond_empty(seq, command), Vec::new()),
                    Err(e) => (respond_err(seq, command, e), Vec::new()),
                },
                None => (respond_err(seq, command, "no active debug session"), Vec::new()),
            }
        }
        #[cfg(not(unix))]
        {
            (respond_err(seq, command, "pause is only supported on unix"), Vec::new())
        }
    }

    /// Whether a debug session is currently active — callers should only
    /// poll [`Self::next_driver_event`] while this is true, since it
    /// resolves immediately (rather than pending) when there is no driver.
    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Await the next driver-originated event and translate it into a DAP
    /// event, updating facade state (invalidating variable handles on
    /// `continued`, since handles are only valid while stopped).
    pub async fn next_driver_event(&mut self) -> Option<Event> {
        let event = self.driver_events.as_mut()?.recv().await?;
        Some(self.translate_driver_event(event))
    }

    fn translate_driver_event(&mut self, event: DriverEvent) -> Event {
        match event {
            DriverEvent::Stopped => Event::new("stopped", Some(serde_json::json!({ "reason": "step", "threadId": 1 }))),
            DriverEvent::Continued => {
                self.variables.invalidate_all();
                Event::new("continued", Some(serde_json::json!({ "threadId": 1, "allThreadsContinued": true })))
            }
            DriverEvent::Terminated(code) => Event::new("terminated", Some(serde_json::json!({ "restart": false, "exitCode": code }))),
            DriverEvent::Paused => Event::new("stopped", Some(serde_json::json!({ "reason": "pause", "threadId": 1 }))),
        }
    }
}

trait MapContinue {
    fn map_continue(self) -> (Response, Vec<Event>);
}

impl MapContinue for (Response, Vec<Event>) {
    fn map_continue(self) -> (Response, Vec<Event>) {
        let (response, events) = self;
        if !response.success {
            return (response, events);
        }
        let body = serde_json::to_value(ContinueResponseBody { all_threads_continued: true }).ok();
        (Response { body, ..response }, events)
    }
}

fn basename(path: &str) -> Option<String> {
    std::path::Path::new(path).file_name().map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_configuration_done_and_an_exception_filter() {
        let caps = default_capabilities();
        assert_eq!(caps.supports_configuration_done_request, Some(true));
        let filters = caps.exception_breakpoint_filters.expect("filters present");
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].filter, "die");
    }

    #[test]
    fn stop_on_entry_false_and_no_breakpoint_auto_continues() {
        assert!(should_auto_continue(false, false));
    }

    #[test]
    fn stop_on_entry_true_never_auto_continues() {
        assert!(!should_auto_continue(true, false));
        assert!(!should_auto_continue(true, true));
    }

    #[test]
    fn a_breakpoint_on_the_entry_line_suppresses_auto_continue() {
        assert!(!should_auto_continue(false, true));
    }

    #[test]
    fn basename_extracts_the_final_path_component() {
        assert_eq!(basename("/workspace/lib/Foo.pm"), Some("Foo.pm".to_string()));
    }

    #[tokio::test]
    async fn initialize_responds_with_capabilities_body() {
        let mut facade = DapFacade::new();
        let request = Request { seq: 1, msg_type: "request".to_string(), command: "initialize".to_string(), arguments: None };
        let (response, events) = facade.handle_request(request).await;
        assert!(response.success);
        assert!(response.body.is_some());
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn unknown_command_is_a_failure_response() {
        let mut facade = DapFacade::new();
        let request = Request { seq: 2, msg_type: "request".to_string(), command: "frobnicate".to_string(), arguments: None };
        let (response, _events) = facade.handle_request(request).await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn stack_trace_without_a_session_fails_cleanly() {
        let mut facade = DapFacade::new();
        let request = Request { seq: 3, msg_type: "request".to_string(), command: "stackTrace".to_string(), arguments: None };
        let (response, _events) = facade.handle_request(request).await;
        assert!(!response.success);
    }
}
