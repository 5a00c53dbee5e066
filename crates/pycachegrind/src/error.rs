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

//! Error taxonomy for the profiling pipeline

use pyo3::exceptions::PySystemExit;
use pyo3::prelude::*;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Profiling pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum ProfilerError {
    #[error("No script given")]
    Usage,

    #[error("Cannot read script {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Script path has no file name: {}", .0.display())]
    InvalidScriptPath(PathBuf),

    #[error("Compilation failed: {0}")]
    Compile(PyErr),

    #[error("Script raised: {0}")]
    Execution(PyErr),

    #[error("Script exited with status {code}")]
    ScriptExit { code: i32, message: Option<String> },

    #[error("Cannot write profile trace {}: {source}", path.display())]
    Finalize {
        path: PathBuf,
        #[source]
        source: PyErr,
    },

    #[error("`{program}` {reason}")]
    Subprocess {
        program: String,
        reason: String,
        status: Option<ExitStatus>,
        stderr: String,
    },

    #[error("Interpreter error: {0}")]
    Interpreter(PyErr),

    #[error("Invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

/// Type alias for pipeline results
pub type ProfilerResult<T> = Result<T, ProfilerError>;

impl ProfilerError {
    /// Classify an exception raised by the target script.
    ///
    /// `SystemExit` follows the interpreter's own exit semantics: `None` maps to
    /// status 0, an integer to itself, anything else is printed and maps to 1.
    pub fn from_script_error(py: Python<'_>, err: PyErr) -> Self {
        if !err.is_instance_of::<PySystemExit>(py) {
            return Self::Execution(err);
        }

        let code = match err.value(py).getattr("code") {
            Ok(code) => code,
            Err(_) => return Self::ScriptExit { code: 1, message: None },
        };

        if code.is_none() {
            Self::ScriptExit { code: 0, message: None }
        } else if let Ok(status) = code.extract::<i32>() {
            Self::ScriptExit { code: status, message: None }
        } else {
            let message = code.str().map(|s| s.to_string()).ok();
            Self::ScriptExit { code: 1, message }
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ScriptExit { code, .. } => *code,
            _ => 1,
        }
    }

    /// Print the error the way the user expects to see it.
    ///
    /// Interpreter errors go through the interpreter's own traceback printer so
    /// the diagnostic is not wrapped.
    pub fn report(&self) {
        match self {
            Self::Compile(err) | Self::Execution(err) | Self::Interpreter(err) => Python::with_gil(|py| {
                err.display(py);
                crate::harness::flush_std_streams(py);
            }),
            Self::ScriptExit { message, .. } => {
                if let Some(message) = message {
                    eprintln!("{message}");
                }
            }
            Self::Subprocess { stderr, .. } => {
                eprintln!("error: {self}");
                let stderr = stderr.trim_end();
                if !stderr.is_empty() {
                    eprintln!("{stderr}");
                }
            }
            // Help text is printed by the caller, it needs the clap command
            Self::Usage => {}
            _ => eprintln!("error: {self}"),
        }
    }
}
