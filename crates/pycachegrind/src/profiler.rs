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

//! Profiler controller
//!
//! A [`ProfileSession`] wraps exactly one call in the interpreter's
//! deterministic profiler and writes the raw trace to disk. The trace is
//! finalized on every exit path, so it is complete before the converter reads
//! it even when the profiled script raised.

use crate::error::{ProfilerError, ProfilerResult};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Interpreter module providing the deterministic profiler
const PROFILER_MODULE: &str = "cProfile";

/// A profiling session bound to a raw trace output path
#[derive(Debug)]
pub struct ProfileSession {
    profiler: Option<Py<PyAny>>,
    trace_path: PathBuf,
}

impl ProfileSession {
    /// Create the profiler with sub-call accounting and built-in function
    /// events enabled. Nothing is written until the session is finalized.
    pub fn open(py: Python<'_>, trace_path: impl Into<PathBuf>) -> ProfilerResult<Self> {
        let trace_path = trace_path.into();
        let profiler = Self::create_profiler(py).map_err(ProfilerError::Interpreter)?;

        debug!(trace = %trace_path.display(), "opened profile session");

        Ok(Self { profiler: Some(profiler), trace_path })
    }

    fn create_profiler(py: Python<'_>) -> PyResult<Py<PyAny>> {
        let kwargs = PyDict::new(py);
        kwargs.set_item("subcalls", true)?;
        kwargs.set_item("builtins", true)?;
        let profiler = py.import(PROFILER_MODULE)?.getattr("Profile")?.call((), Some(&kwargs))?;
        Ok(profiler.unbind())
    }

    pub fn trace_path(&self) -> &Path {
        &self.trace_path
    }

    /// Run `f` once under the profiler, then finalize the session.
    ///
    /// If `f` fails and finalization succeeds, `f`'s error is returned. If
    /// finalization fails, its error is returned; a failure from `f` is
    /// reported to the user first since it happened first.
    pub fn runcall<T, F>(mut self, py: Python<'_>, f: F) -> ProfilerResult<T>
    where
        F: FnOnce(Python<'_>) -> ProfilerResult<T>,
    {
        self.enable(py).map_err(ProfilerError::Interpreter)?;
        let outcome = f(py);
        let finalized = self.finalize(py);

        match (outcome, finalized) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(err), Ok(())) => Err(err),
            (Ok(_), Err(finalize_err)) => Err(finalize_err),
            (Err(err), Err(finalize_err)) => {
                err.report();
                Err(finalize_err)
            }
        }
    }

    fn enable(&self, py: Python<'_>) -> PyResult<()> {
        if let Some(profiler) = &self.profiler {
            profiler.bind(py).call_method0("enable")?;
        }
        Ok(())
    }

    /// Disable the profiler and dump its stats to the trace path.
    ///
    /// Idempotent: the profiler handle is taken on the first call.
    fn finalize(&mut self, py: Python<'_>) -> ProfilerResult<()> {
        let Some(profiler) = self.profiler.take() else {
            return Ok(());
        };
        let profiler = profiler.into_bound(py);

        let disabled = profiler.call_method0("disable");
        let dumped = profiler.call_method1("dump_stats", (self.trace_path.as_os_str(),));

        disabled.and(dumped).map_err(|source| ProfilerError::Finalize { path: self.trace_path.clone(), source })?;

        info!(trace = %self.trace_path.display(), "profile trace written");
        Ok(())
    }
}

impl Drop for ProfileSession {
    fn drop(&mut self) {
        if self.profiler.is_none() {
            return;
        }

        warn!(trace = %self.trace_path.display(), "profile session dropped without finalizing");
        Python::with_gil(|py| {
            if let Err(err) = self.finalize(py) {
                error!("{err}");
            }
        });
    }
}
