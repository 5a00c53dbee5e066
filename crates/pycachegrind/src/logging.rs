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

use crate::error::{ProfilerError, ProfilerResult};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Parse a configured log level such as `warn` or `debug`
pub fn parse_level(level: &str) -> ProfilerResult<LevelFilter> {
    level.parse::<LevelFilter>().map_err(|err| ProfilerError::Config {
        path: PathBuf::from(crate::config::CONFIG_FILE_NAME),
        message: format!("log_level `{level}`: {err}"),
    })
}

/// Install the stderr subscriber. Stdout belongs to the profiled script.
pub fn init(level: &str) -> ProfilerResult<()> {
    let level = parse_level(level)?;
    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).with_target(false).try_init();
    Ok(())
}
