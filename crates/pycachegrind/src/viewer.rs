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

//! Detached launch of the call graph viewer

use crate::config::CommandTemplate;
use crate::error::{ProfilerError, ProfilerResult};
use std::path::Path;
use std::process::Stdio;
use tracing::info;

#[derive(Debug)]
pub struct Viewer<'a> {
    template: &'a CommandTemplate,
}

impl<'a> Viewer<'a> {
    pub fn new(template: &'a CommandTemplate) -> Self {
        Self { template }
    }

    /// Spawn the viewer on `callgraph` and return without waiting.
    ///
    /// The viewer runs in its own process group so it outlives this process
    /// and ignores terminal signals aimed at it. Only a failure to start is
    /// reported.
    pub fn launch(&self, callgraph: &Path) -> ProfilerResult<()> {
        let mut command = self.template.command(callgraph, None);
        command.stdin(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(|e| ProfilerError::Subprocess {
            program: self.template.program.clone(),
            reason: format!("could not be started: {e}"),
            status: None,
            stderr: String::new(),
        })?;

        info!(pid = child.id(), program = %self.template.program, "viewer launched");
        Ok(())
    }
}
