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

//! pycachegrind CLI
//!
//! Main entry point: `pycachegrind script.py [script args]`.

use clap::{CommandFactory, Parser};
use pycachegrind::cli::Cli;
use pycachegrind::{ProfilePipeline, ProfileRequest, ProfilerConfig, ProfilerError, logging};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let request = match ProfileRequest::from_cli(cli) {
        Ok(request) => request,
        Err(ProfilerError::Usage) => {
            let _ = Cli::command().print_long_help();
            return ExitCode::from(1);
        }
        Err(err) => return fail(&err),
    };

    let config = match ProfilerConfig::resolve(Path::new(".")) {
        Ok(config) => config,
        Err(err) => return fail(&err),
    };

    // Initialize tracing
    if let Err(err) = logging::init(&config.log_level) {
        return fail(&err);
    }

    match ProfilePipeline::new(config, request).execute() {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

fn fail(err: &ProfilerError) -> ExitCode {
    err.report();
    // Statuses wrap modulo 256 the same way the OS truncates them
    ExitCode::from((err.exit_code() & 0xff) as u8)
}
