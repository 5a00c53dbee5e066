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

//! Execution harness
//!
//! Runs a compiled script so that, from its own point of view, it is
//! indistinguishable from `python script.py args...`: it sees `__name__ ==
//! "__main__"`, `__file__` set to the supplied path, the expected `sys.argv`,
//! and its own directory at the front of `sys.path`.

use crate::compiler::CompiledScript;
use crate::error::{ProfilerError, ProfilerResult};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Argument vector observed by the target script as `sys.argv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptArgv(Vec<OsString>);

impl ScriptArgv {
    /// Build `[script, args...]`, the invocation minus this program's own name
    pub fn new(script: &Path, args: impl IntoIterator<Item = OsString>) -> Self {
        let mut argv = vec![script.as_os_str().to_os_string()];
        argv.extend(args);
        Self(argv)
    }

    pub fn as_slice(&self) -> &[OsString] {
        &self.0
    }
}

/// Execute `compiled` in a fresh `__main__` namespace.
///
/// Exceptions raised by the script propagate unmodified. Interpreter globals
/// touched for the run are restored on every exit path. Returns the module
/// namespace the script ran in.
pub fn run_script(py: Python<'_>, compiled: &CompiledScript, argv: &ScriptArgv) -> ProfilerResult<Py<PyDict>> {
    let module = PyModule::new(py, "__main__").map_err(ProfilerError::Interpreter)?;
    module.setattr("__file__", compiled.filename().as_os_str()).map_err(ProfilerError::Interpreter)?;

    let namespace = module.dict();
    let builtins = py.import("builtins").map_err(ProfilerError::Interpreter)?;
    namespace.set_item("__builtins__", &builtins).map_err(ProfilerError::Interpreter)?;

    let _scope = MainScope::enter(py, &module, argv, &script_dir(compiled.filename())).map_err(ProfilerError::Interpreter)?;

    debug!(argv = ?argv.as_slice(), "executing script");

    let exec = builtins.getattr("exec").map_err(ProfilerError::Interpreter)?;
    match exec.call1((compiled.code(py), &namespace)) {
        Ok(_) => Ok(namespace.unbind()),
        Err(err) => Err(ProfilerError::from_script_error(py, err)),
    }
}

/// Flush the interpreter's `sys.stdout` and `sys.stderr`.
///
/// The embedded interpreter is never finalized, so buffered script output
/// would otherwise be lost at process exit.
pub fn flush_std_streams(py: Python<'_>) {
    let Ok(sys) = py.import("sys") else { return };
    for stream in ["stdout", "stderr"] {
        if let Ok(stream) = sys.getattr(stream) {
            if !stream.is_none() {
                if let Err(err) = stream.call_method0("flush") {
                    warn!("failed to flush sys.{stream}: {err}");
                }
            }
        }
    }
}

/// Directory the script lives in, as `python script.py` would put on `sys.path`
fn script_dir(script: &Path) -> PathBuf {
    std::path::absolute(script)
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Interpreter globals swapped in for the duration of a script run
struct MainScope<'py> {
    sys: Bound<'py, PyModule>,
    modules: Bound<'py, PyDict>,
    argv: Bound<'py, PyAny>,
    path: Bound<'py, PyAny>,
    main: Option<Bound<'py, PyAny>>,
}

impl<'py> MainScope<'py> {
    fn enter(py: Python<'py>, module: &Bound<'py, PyModule>, argv: &ScriptArgv, dir: &Path) -> PyResult<Self> {
        let sys = py.import("sys")?;
        let modules = sys.getattr("modules")?.downcast_into::<PyDict>()?;

        let scope = Self {
            argv: sys.getattr("argv")?,
            path: sys.getattr("path")?,
            main: modules.get_item("__main__")?,
            sys,
            modules,
        };

        let new_argv = PyList::new(py, argv.as_slice().iter().map(OsString::as_os_str))?;
        let new_path = PyList::new(py, [dir.as_os_str()])?;
        for entry in scope.path.try_iter()? {
            new_path.append(entry?)?;
        }

        scope.sys.setattr("argv", new_argv)?;
        scope.sys.setattr("path", new_path)?;
        scope.modules.set_item("__main__", module)?;

        Ok(scope)
    }

    fn restore(&self) -> PyResult<()> {
        self.sys.setattr("argv", &self.argv)?;
        self.sys.setattr("path", &self.path)?;
        match &self.main {
            Some(main) => self.modules.set_item("__main__", main)?,
            None => self.modules.del_item("__main__")?,
        }
        Ok(())
    }
}

impl Drop for MainScope<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!("failed to restore interpreter state: {err}");
        }
        flush_std_streams(self.sys.py());
    }
}
