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

//! Output file naming

use crate::error::{ProfilerError, ProfilerResult};
use std::path::{Path, PathBuf};

/// Suffix appended to the script name for the raw profiler trace
pub const TRACE_SUFFIX: &str = ".prof";

/// Suffix appended to the script name for the converted call graph
pub const CALLGRAPH_SUFFIX: &str = ".cgrind";

/// The two files a profiling run leaves on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Raw trace written by the profiler
    pub trace: PathBuf,
    /// Call graph written by the converter
    pub callgraph: PathBuf,
}

impl OutputPaths {
    /// Derive output paths from the script's file name, e.g. `foo.py` gives
    /// `foo.py.prof` and `foo.py.cgrind` inside `output_dir`.
    ///
    /// Existing files are overwritten by later stages.
    pub fn for_script(script: &Path, output_dir: &Path) -> ProfilerResult<Self> {
        let base = script.file_name().ok_or_else(|| ProfilerError::InvalidScriptPath(script.to_path_buf()))?;

        let mut trace = base.to_os_string();
        trace.push(TRACE_SUFFIX);
        let mut callgraph = base.to_os_string();
        callgraph.push(CALLGRAPH_SUFFIX);

        Ok(Self { trace: output_dir.join(trace), callgraph: output_dir.join(callgraph) })
    }
}
