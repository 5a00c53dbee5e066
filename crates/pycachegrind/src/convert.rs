// pycachegrind
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Conversion of the raw trace into callgrind format with an external tool

use crate::config::CommandTemplate;
use crate::error::{ProfilerError, ProfilerResult};
use crate::paths::OutputPaths;
use std::io::{self, Write};
use std::process::Stdio;
use tracing::{debug, info, warn};

/// Runs the configured converter on a finished trace
#[derive(Debug)]
pub struct Converter<'a> {
    template: &'a CommandTemplate,
}

impl<'a> Converter<'a> {
    pub fn new(template: &'a CommandTemplate) -> Self {
        Self { template }
    }

    /// Convert `paths.trace` into `paths.callgraph`.
    ///
    /// The converter's stdout is inherited. Its stderr is captured: forwarded
    /// on success, attached to the error otherwise.
    pub fn convert(&self, paths: &OutputPaths) -> ProfilerResult<()> {
        let mut command = self.template.command(&paths.trace, Some(&paths.callgraph));
        command.stdin(Stdio::null()).stdout(Stdio::inherit()).stderr(Stdio::piped());

        debug!(command = ?command, "running converter");

        let output = command.output().map_err(|e| ProfilerError::Subprocess {
            program: self.template.program.clone(),
            reason: format!("could not be started: {e}"),
            status: None,
            stderr: String::new(),
        })?;

        if !output.status.success() {
            return Err(ProfilerError::Subprocess {
                program: self.template.program.clone(),
                reason: format!("failed with {}", output.status),
                status: Some(output.status),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        if !output.stderr.is_empty() {
            // Warnings from a successful run still belong to the user
            if let Err(err) = io::stderr().write_all(&output.stderr) {
                warn!("failed to forward converter stderr: {err}");
            }
        }

        info!(callgraph = %paths.callgraph.display(), "call graph written");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn sh(script: &str) -> CommandTemplate {
        CommandTemplate {
            program: "sh".to_string(),
            args: vec!["-c".into(), script.into(), "sh".into(), "{input}".into(), "{output}".into()],
        }
    }

    fn paths(dir: &Path) -> OutputPaths {
        let paths = OutputPaths::for_script(Path::new("job.py"), dir).unwrap();
        fs::write(&paths.trace, b"trace").unwrap();
        paths
    }

    #[test]
    fn test_convert_receives_input_and_output() {
        let temp_dir = tempdir().unwrap();
        let paths = paths(temp_dir.path());
        let template = sh("cp \"$1\" \"$2\"");

        Converter::new(&template).convert(&paths).unwrap();
        assert_eq!(fs::read(&paths.callgraph).unwrap(), b"trace");
    }

    #[test]
    fn test_warnings_on_success_do_not_fail_conversion() {
        let temp_dir = tempdir().unwrap();
        let paths = paths(temp_dir.path());
        let template = sh("echo 'deprecated option' >&2; cp \"$1\" \"$2\"");

        Converter::new(&template).convert(&paths).unwrap();
        assert_eq!(fs::read(&paths.callgraph).unwrap(), b"trace");
    }

    #[test]
    fn test_nonzero_exit_is_reported_with_stderr() {
        let temp_dir = tempdir().unwrap();
        let paths = paths(temp_dir.path());
        let template = sh("echo 'unsupported trace' >&2; exit 3");

        let error = Converter::new(&template).convert(&paths).unwrap_err();
        match error {
            ProfilerError::Subprocess { program, status, stderr, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(status.and_then(|s| s.code()), Some(3));
                assert!(stderr.contains("unsupported trace"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!paths.callgraph.exists());
    }

    #[test]
    fn test_missing_converter_is_reported() {
        let temp_dir = tempdir().unwrap();
        let paths = paths(temp_dir.path());
        let template = CommandTemplate { program: "pycachegrind-no-such-converter".to_string(), args: vec![] };

        let error = Converter::new(&template).convert(&paths).unwrap_err();
        assert!(matches!(error, ProfilerError::Subprocess { status: None, .. }));
        assert!(error.to_string().contains("could not be started"));
    }
}
