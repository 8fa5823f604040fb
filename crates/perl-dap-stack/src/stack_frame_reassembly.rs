//! The exact `T`-command stack-trace parser: multi-line logical-frame
//! reassembly plus context-sigil extraction.
//!
//! [`crate::PerlStackParser`] handles a broader family of informal
//! `perl -d` trace shapes; this module implements the one exact format the
//! facade actually drives the debugger with (`T` command output) and the
//! `context` field ([`FrameContext`]) that shape lacks entirely.

use once_cell::sync::Lazy;
use regex::Regex;

/// The calling context a frame was invoked in, taken from the leading
/// sigil of its `T`-command line (`@` array, `$` scalar, `.` void).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameContext {
    Array,
    Scalar,
    Void,
    Unknown,
}

impl FrameContext {
    fn from_sigil(sigil: char) -> Self {
        match sigil {
            '@' => FrameContext::Array,
            '$' => FrameContext::Scalar,
            '.' => FrameContext::Void,
            _ => FrameContext::Unknown,
        }
    }

    /// The `«context»` token used in a rendered frame name, e.g.
    /// `":(«array») foo"`.
    pub fn label(self) -> &'static str {
        match self {
            FrameContext::Array => "array",
            FrameContext::Scalar => "scalar",
            FrameContext::Void => "void",
            FrameContext::Unknown => "unknown",
        }
    }
}

/// A single `T`-command frame: the calling context, the callee expression,
/// the caller's file, and the caller's line.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFrame {
    pub context: FrameContext,
    pub callee: String,
    pub caller_file: String,
    pub line: u32,
}

/// `^([@$.])\s*=\s*(.+?)\s+called\s+from\s+file\s+'(.+?)'\s+line\s+(\d+)`,
/// applied to a logical (already-reassembled) frame line.
static FRAME_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([@$.])\s*=\s*(.+?)\s+called\s+from\s+file\s+'(.+?)'\s+line\s+(\d+)").expect("valid regex")
});

/// Parse the full reply to the `T` command into an ordered list of frames,
/// innermost first. A logical frame is a line beginning with `@`, `$`, or
/// `.` followed by `=`; lines that don't start a new logical frame (the
/// debugger sometimes wraps a long callee expression) are appended to the
/// frame currently being accumulated. Trailing noise (a `DB<N>` prompt, or
/// anything that never completes with a `called from file '...' line N`
/// suffix) is dropped rather than surfaced as a frame: k well-formed frames
/// followed by arbitrary trailing noise always yields exactly k frames.
pub fn parse_stack_trace(raw: &str) -> Vec<TraceFrame> {
    let mut logical_lines: Vec<String> = Vec::new();
    for line in raw.lines() {
        let starts_frame = line.chars().next().is_some_and(|c| matches!(c, '@' | '$' | '.'));
        if starts_frame {
            logical_lines.push(line.to_string());
        } else if let Some(last) = logical_lines.last_mut() {
            if !line.trim().is_empty() && !is_prompt_line(line) {
                last.push(' ');
                last.push_str(line.trim());
            }
        }
    }

    logical_lines.iter().filter_map(|line| parse_one_frame(line)).collect()
}

fn is_prompt_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("DB<") && trimmed.contains('>')
}

fn parse_one_frame(logical_line: &str) -> Option<TraceFrame> {
    let caps = FRAME_LINE_RE.captures(logical_line)?;
    let sigil = caps[1].chars().next()?;
    let line: u32 = caps[4].parse().ok()?;
    Some(TraceFrame {
        context: FrameContext::from_sigil(sigil),
        callee: caps[2].trim().to_string(),
        caller_file: caps[3].to_string(),
        line,
    })
}

/// Render a frame's DAP display name: `":(«context») «callee»"`.
pub fn render_frame_name(frame: &TraceFrame) -> String {
    format!(":({}) {}", frame.context.label(), frame.callee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_array_context_frame() {
        let raw = "@ = main::foo called from file '/tmp/a.pl' line 10\n";
        let frames = parse_stack_trace(raw);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].context, FrameContext::Array);
        assert_eq!(frames[0].callee, "main::foo");
        assert_eq!(frames[0].caller_file, "/tmp/a.pl");
        assert_eq!(frames[0].line, 10);
    }

    #[test]
    fn maps_all_four_context_sigils() {
        let raw = "\
$ = main::a called from file '/a.pl' line 1
@ = main::b called from file '/a.pl' line 2
. = main::c called from file '/a.pl' line 3
";
        let frames = parse_stack_trace(raw);
        assert_eq!(frames[0].context, FrameContext::Scalar);
        assert_eq!(frames[1].context, FrameContext::Array);
        assert_eq!(frames[2].context, FrameContext::Void);
    }

    #[test]
    fn trailing_noise_does_not_become_a_frame() {
        let raw = "@ = main::foo called from file '/tmp/a.pl' line 10\n  DB<3>\n";
        assert_eq!(parse_stack_trace(raw).len(), 1);
    }

    #[test]
    fn k_frames_plus_noise_round_trips_to_k_frames() {
        let raw = "\
@ = main::a called from file '/x.pl' line 1
$ = main::b called from file '/x.pl' line 2
. = main::c called from file '/x.pl' line 3
  DB<9>
";
        assert_eq!(parse_stack_trace(raw).len(), 3);
    }

    #[test]
    fn renders_name_with_context_label() {
        let frame = TraceFrame { context: FrameContext::Scalar, callee: "main::foo".into(), caller_file: "/a.pl".into(), line: 5 };
        assert_eq!(render_frame_name(&frame), ":(scalar) main::foo");
    }
}
