//! Subprocess boundary.
//!
//! Handlers run external tools synchronously and show the result. The
//! runner is a trait so handlers can be exercised against canned output.

use std::io;
use std::path::Path;
use std::process::Command;

use crate::types::{Content, Tone};

/// A shell command line, run via `sh -c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn shell(command_line: impl Into<String>) -> Self {
        CommandSpec {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), command_line.into()],
        }
    }

    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        CommandSpec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Human-readable form shown as the output title.
    pub fn display(&self) -> String {
        if self.program == "sh" && self.args.len() == 2 && self.args[0] == "-c" {
            self.args[1].clone()
        } else {
            std::iter::once(self.program.as_str())
                .chain(self.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        }
    }
}

/// Captured result of a finished process.
///
/// Streams are `Content` because producers differ: the system runner holds
/// raw text, canned results are often pre-split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when terminated by a signal.
    pub status: Option<i32>,
    pub stdout: Content,
    pub stderr: Content,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Merge both streams into display lines plus a tone.
    ///
    /// Non-zero exits are reported as text, never as an error value.
    pub fn into_display(self) -> (Vec<String>, Tone) {
        let success = self.success();
        let status = self.status;
        let mut lines = Vec::new();

        if !self.stdout.is_empty() {
            lines.extend(self.stdout.into_lines());
        }
        if !self.stderr.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(self.stderr.into_lines());
        }
        if lines.is_empty() {
            lines.push("(no output)".to_string());
        }

        if success {
            (lines, Tone::Normal)
        } else {
            lines.push(String::new());
            lines.push(match status {
                Some(code) => format!("✗ exited with status {}", code),
                None => "✗ terminated by signal".to_string(),
            });
            (lines, Tone::Error)
        }
    }
}

pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec, working_dir: &Path) -> io::Result<CommandOutput>;
}

/// Runs commands with `std::process`, blocking until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec, working_dir: &Path) -> io::Result<CommandOutput> {
        tracing::debug!(command = %spec.display(), dir = %working_dir.display(), "spawning");
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(working_dir)
            .output()?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: Content::Text(String::from_utf8_lossy(&output.stdout).into_owned()),
            stderr: Content::Text(String::from_utf8_lossy(&output.stderr).into_owned()),
        };
        tracing::debug!(command = %spec.display(), status = ?result.status, "finished");
        Ok(result)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_spec_displays_command_line() {
        let spec = CommandSpec::shell("git status --short");
        assert_eq!(spec.display(), "git status --short");
        assert_eq!(spec.program, "sh");
    }

    #[test]
    fn plain_spec_displays_joined_args() {
        let spec = CommandSpec::new("systemctl", ["status", "nginx"]);
        assert_eq!(spec.display(), "systemctl status nginx");
    }

    #[test]
    fn list_and_text_stdout_give_the_same_lines() {
        let as_list = CommandOutput {
            status: Some(0),
            stdout: Content::Lines(vec!["one".into(), "two".into()]),
            stderr: Content::Text(String::new()),
        };
        let as_text = CommandOutput {
            status: Some(0),
            stdout: Content::Text("one\ntwo".into()),
            stderr: Content::Lines(Vec::new()),
        };
        let (a, tone_a) = as_list.into_display();
        let (b, tone_b) = as_text.into_display();
        assert_eq!(a, vec!["one", "two"]);
        assert_eq!(a, b);
        assert_eq!(tone_a, Tone::Normal);
        assert_eq!(tone_b, Tone::Normal);
    }

    #[test]
    fn failure_is_reported_as_text() {
        let output = CommandOutput {
            status: Some(3),
            stdout: Content::Text(String::new()),
            stderr: Content::Text("fatal: not a git repository\n".into()),
        };
        let (lines, tone) = output.into_display();
        assert_eq!(tone, Tone::Error);
        assert_eq!(lines[0], "fatal: not a git repository");
        assert_eq!(lines.last().map(String::as_str), Some("✗ exited with status 3"));
    }

    #[test]
    fn empty_success_says_so() {
        let output = CommandOutput {
            status: Some(0),
            stdout: Content::Text("\n".into()),
            stderr: Content::Text(String::new()),
        };
        assert_eq!(output.into_display().0, vec!["(no output)"]);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_both_streams() {
        let dir = std::env::temp_dir();
        let out = SystemRunner
            .run(&CommandSpec::shell("echo out; echo err 1>&2; exit 2"), &dir)
            .unwrap();
        assert_eq!(out.status, Some(2));
        assert_eq!(out.stdout.into_lines(), vec!["out"]);
        assert_eq!(out.stderr.into_lines(), vec!["err"]);
    }
}
