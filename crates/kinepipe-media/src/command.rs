//! Blocking external-tool runner

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::error::MediaError;

/// Cap on tool output kept in an error message (failure-log rows should
/// stay readable).
const OUTPUT_TAIL: usize = 1024;

/// Verify the given binaries exist on PATH before a pool starts, so a
/// missing tool fails the run up front rather than once per item.
pub fn require_tools(tools: &[&'static str]) -> Result<(), MediaError> {
    for tool in tools {
        which::which(tool).map_err(|_| MediaError::MissingTool(tool))?;
    }
    Ok(())
}

/// Run a tool to completion, capturing combined stdout/stderr.
///
/// Non-zero exit becomes [`MediaError::Tool`] carrying the output tail —
/// the worker inspects that text for the rate-limit signature. When
/// `log_file` is set, the full output is appended there on every
/// invocation (the equivalent of the original tooling's diagnostic log).
pub fn run_tool(
    tool: &'static str,
    command: &mut Command,
    log_file: Option<&Path>,
) -> Result<(), MediaError> {
    let output = command.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MediaError::MissingTool(tool)
        } else {
            MediaError::Io(e)
        }
    })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if let Some(path) = log_file {
        if let Err(e) = append_log(path, tool, &combined) {
            log::warn!("cannot append to tool log {}: {e}", path.display());
        }
    }

    if output.status.success() {
        Ok(())
    } else {
        Err(MediaError::Tool {
            tool,
            output: tail(&combined),
        })
    }
}

fn append_log(path: &Path, tool: &str, output: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    writeln!(file, "--- {tool} ---")?;
    file.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writeln!(file)?;
    }
    Ok(())
}

/// Last `OUTPUT_TAIL` bytes of tool output, whitespace-trimmed. Tools put
/// the actionable error at the end.
fn tail(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.len() <= OUTPUT_TAIL {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - OUTPUT_TAIL;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tail_keeps_short_output() {
        assert_eq!(tail("  short error\n"), "short error");
    }

    #[test]
    fn tail_truncates_long_output_from_the_front() {
        let long = "x".repeat(4000) + "the actual error";
        let t = tail(&long);
        assert_eq!(t.len(), OUTPUT_TAIL);
        assert!(t.ends_with("the actual error"));
    }

    #[test]
    fn run_tool_success() {
        run_tool("true", &mut Command::new("true"), None).unwrap();
    }

    #[test]
    fn run_tool_nonzero_exit_captures_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo boom >&2; exit 3"]);
        match run_tool("sh", &mut cmd, None) {
            Err(MediaError::Tool { tool, output }) => {
                assert_eq!(tool, "sh");
                assert_eq!(output, "boom");
            }
            other => panic!("expected tool error, got {other:?}"),
        }
    }

    #[test]
    fn run_tool_missing_binary() {
        let result = run_tool(
            "definitely-not-a-real-tool",
            &mut Command::new("definitely-not-a-real-tool"),
            None,
        );
        assert!(matches!(result, Err(MediaError::MissingTool(_))));
    }

    #[test]
    fn run_tool_appends_to_log_file() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("tool.log");
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo first"]);
        run_tool("sh", &mut cmd, Some(&log)).unwrap();
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo second"]);
        run_tool("sh", &mut cmd, Some(&log)).unwrap();

        let content = std::fs::read_to_string(&log).unwrap();
        assert!(content.contains("first"));
        assert!(content.contains("second"));
    }
}
