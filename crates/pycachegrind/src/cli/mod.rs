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

//! Command-line surface

pub mod profile;

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

const ABOUT: &str = "Profile a Python script and view the results in KCachegrind";

const LONG_ABOUT: &str = "\
Profile a script with the interpreter's deterministic profiler and KCachegrind.

The script runs under the profiler exactly as if it had been started directly:
it sees __name__ == '__main__', __file__ set to the given path, and every
argument after the script name in sys.argv. The raw profile is converted to
callgrind format and KCachegrind is started on the result.";

const AFTER_LONG_HELP: &str = "\
Files left in the output directory (default: the current directory):

  script.py.prof    raw profiler trace
  script.py.cgrind  trace converted to callgrind format

Requirements:

  pyprof2calltree   converts the raw trace (pip install pyprof2calltree)
  kcachegrind       visualizes the converted call graph

Both tools can be replaced in a pycachegrind.toml placed in the working
directory, e.g.

  [converter]
  program = \"hotshot2calltree\"
  args = [\"-o\", \"{output}\", \"{input}\"]";

/// Profile a Python script and open the call graph in KCachegrind
#[derive(Parser, Debug)]
#[command(name = "pycachegrind", about = ABOUT, long_about = LONG_ABOUT, after_long_help = AFTER_LONG_HELP)]
pub struct Cli {
    /// Python script to profile, followed by the arguments for its sys.argv.
    /// Nothing after the script path is interpreted, not even `--help` or `--`
    #[arg(value_name = "SCRIPT", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<OsString>,
}

impl Cli {
    /// Split the invocation into the script path and its pass-through arguments
    pub fn into_parts(self) -> Option<(PathBuf, Vec<OsString>)> {
        let mut command = self.command.into_iter();
        let script = PathBuf::from(command.next()?);
        Some((script, command.collect()))
    }
}
