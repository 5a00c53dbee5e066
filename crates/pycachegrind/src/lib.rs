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

//! pycachegrind
//!
//! Runs a Python script under the interpreter's deterministic profiler, converts
//! the raw trace into callgrind format with an external converter and opens the
//! result in KCachegrind.
//!
//! The pipeline is strictly sequential:
//! source loading → compilation → profiled execution → conversion → viewer.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod convert;
pub mod error;
pub mod harness;
pub mod logging;
pub mod paths;
pub mod profiler;
pub mod source;
pub mod viewer;

// Re-export the pipeline entry points for the binary and integration tests
pub use cli::profile::{ProfileOutcome, ProfilePipeline, ProfileRequest};
pub use config::ProfilerConfig;
pub use error::{ProfilerError, ProfilerResult};
