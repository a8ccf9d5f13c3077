//! Graph renderers turning DOT source into images.

use super::ExportFormat;
use crate::errors::ExportError;
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, Stdio};

/// Renders Graphviz DOT source into an image format.
pub trait GraphRenderer: fmt::Debug + Send + Sync {
    /// Renders `dot` into `format`, returning the file contents.
    fn render(&self, dot: &str, format: ExportFormat) -> Result<Vec<u8>, ExportError>;
}

/// Renders by piping DOT source through the Graphviz `dot` program.
#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    program: String,
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self::new("dot")
    }
}

impl GraphvizRenderer {
    /// Creates a renderer invoking `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The program that will be invoked.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl GraphRenderer for GraphvizRenderer {
    fn render(&self, dot: &str, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        let fail = |reason: String| ExportError::render(format.extension(), reason);

        let mut child = Command::new(&self.program)
            .arg(format!("-T{}", format.extension()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| fail(format!("failed to spawn {}: {e}", self.program)))?;

        // Feed stdin on its own thread while the pipes are drained, so a
        // chatty renderer cannot block on a full stderr pipe.
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(dot.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (written, output)
        });

        let output =
            output.map_err(|e| fail(format!("failed to read {} output: {e}", self.program)))?;

        if !output.status.success() {
            return Err(fail(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        written.map_err(|e| fail(format!("failed to write to {}: {e}", self.program)))?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_render_error() {
        let renderer = GraphvizRenderer::new("/nonexistent/graphviz/dot");
        let err = renderer
            .render("digraph g {}", ExportFormat::Png)
            .unwrap_err();

        match err {
            ExportError::Render { format, reason } => {
                assert_eq!(format, "png");
                assert!(reason.contains("failed to spawn"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_program() {
        assert_eq!(GraphvizRenderer::default().program(), "dot");
    }

    #[cfg(unix)]
    fn script(dir: &tempfile::TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("fake-dot");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[test]
    fn test_large_input_with_noisy_stderr() {
        let dir = tempfile::tempdir().unwrap();
        // Fills the stderr pipe before reading any input.
        let program = script(&dir, "head -c 262144 /dev/zero >&2\ncat");
        let dot = format!("digraph g {{\n{}}}\n", "  n0 -> n1;\n".repeat(30_000));

        let rendered = GraphvizRenderer::new(program)
            .render(&dot, ExportFormat::Svg)
            .unwrap();

        assert_eq!(rendered, dot.into_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, "echo 'syntax error in line 1' >&2\nexit 3");

        let err = GraphvizRenderer::new(program)
            .render("digraph g {", ExportFormat::Pdf)
            .unwrap_err();

        match err {
            ExportError::Render { format, reason } => {
                assert_eq!(format, "pdf");
                assert_eq!(reason, "syntax error in line 1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
