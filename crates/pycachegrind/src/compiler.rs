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

//! Ahead-of-time compilation of the target script
//!
//! Compiling before the profiler is enabled keeps compile time out of the
//! profile results.

use crate::error::{ProfilerError, ProfilerResult};
use crate::source::TargetScript;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A compiled code object ready for the execution harness
#[derive(Debug)]
pub struct CompiledScript {
    code: Py<PyAny>,
    filename: PathBuf,
}

impl CompiledScript {
    pub fn code<'py>(&self, py: Python<'py>) -> &Bound<'py, PyAny> {
        self.code.bind(py)
    }

    /// Nominal filename used in tracebacks and as `__file__`
    pub fn filename(&self) -> &Path {
        &self.filename
    }
}

/// Compile the script in `exec` mode.
///
/// Compilation errors carry the interpreter's original exception, so the
/// caller can show the real `SyntaxError` location.
pub fn compile_script(py: Python<'_>, script: &TargetScript) -> ProfilerResult<CompiledScript> {
    let builtins = py.import("builtins").map_err(ProfilerError::Interpreter)?;
    let kwargs = PyDict::new(py);
    kwargs.set_item("dont_inherit", true).map_err(ProfilerError::Interpreter)?;

    let source = PyBytes::new(py, script.source());
    let filename = script.path().as_os_str();

    let code = builtins
        .getattr("compile")
        .and_then(|compile| compile.call((source, filename, "exec"), Some(&kwargs)))
        .map_err(ProfilerError::Compile)?;

    debug!(path = %script.path().display(), "compiled script");

    Ok(CompiledScript { code: code.unbind(), filename: script.path().to_path_buf() })
}
