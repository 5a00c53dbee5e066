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

//! Tool selection and output configuration
//!
//! Defaults are compiled in. A `pycachegrind.toml` in the working directory
//! overrides them; environment variables are never consulted.

use crate::error::{ProfilerError, ProfilerResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Converter from the raw profiler trace to callgrind format
pub const DEFAULT_CONVERTER: &str = "pyprof2calltree";

/// Call graph viewer
pub const DEFAULT_VIEWER: &str = "kcachegrind";

/// Name of the optional override file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "pycachegrind.toml";

/// Placeholder replaced by the input file of a tool invocation
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Placeholder replaced by the output file of a tool invocation
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Directory receiving the `.prof` and `.cgrind` files
    pub output_dir: PathBuf,
    /// Maximum log level written to stderr
    pub log_level: String,
    pub converter: CommandTemplate,
    pub viewer: CommandTemplate,
}

/// An external program and its argument template.
///
/// Arguments may contain `{input}` and `{output}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            log_level: "warn".to_string(),
            converter: CommandTemplate {
                program: DEFAULT_CONVERTER.to_string(),
                args: vec!["-i".to_string(), INPUT_PLACEHOLDER.to_string(), "-o".to_string(), OUTPUT_PLACEHOLDER.to_string()],
            },
            viewer: CommandTemplate { program: DEFAULT_VIEWER.to_string(), args: vec![INPUT_PLACEHOLDER.to_string()] },
        }
    }
}

impl ProfilerConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("malformed configuration")?;
        Ok(config)
    }

    /// Load `pycachegrind.toml` from `dir` if present, otherwise use defaults
    pub fn resolve(dir: &Path) -> ProfilerResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }

        Self::load_from_file(&path).map_err(|err| ProfilerError::Config { message: format!("{err:#}"), path })
    }
}

impl CommandTemplate {
    /// Build the command with placeholders expanded.
    ///
    /// An argument that is exactly a placeholder receives the path unchanged,
    /// so non UTF-8 paths survive; embedded placeholders are substituted
    /// textually.
    pub fn command(&self, input: &Path, output: Option<&Path>) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args.iter().map(|arg| expand(arg, input, output)));
        command
    }
}

fn expand(arg: &str, input: &Path, output: Option<&Path>) -> OsString {
    if arg == INPUT_PLACEHOLDER {
        return input.as_os_str().to_os_string();
    }
    if let Some(output) = output.filter(|_| arg == OUTPUT_PLACEHOLDER) {
        return output.as_os_str().to_os_string();
    }

    let mut expanded = arg.replace(INPUT_PLACEHOLDER, &input.to_string_lossy());
    if let Some(output) = output {
        expanded = expanded.replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy());
    }
    expanded.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = tempdir().unwrap();
        let config = ProfilerConfig::resolve(temp_dir.path()).unwrap();
        assert_eq!(config, ProfilerConfig::default());
        assert_eq!(config.converter.program, DEFAULT_CONVERTER);
        assert_eq!(config.viewer.program, DEFAULT_VIEWER);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "[converter]\nprogram = \"hotshot2calltree\"\nargs = [\"-o\", \"{output}\", \"{input}\"]\n",
        )
        .unwrap();

        let config = ProfilerConfig::resolve(temp_dir.path()).unwrap();
        assert_eq!(config.converter.program, "hotshot2calltree");
        assert_eq!(config.viewer, ProfilerConfig::default().viewer);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "output_dir = [\n").unwrap();

        let error = ProfilerConfig::resolve(temp_dir.path()).unwrap_err();
        match error {
            ProfilerError::Config { path, message } => {
                assert_eq!(path, temp_dir.path().join(CONFIG_FILE_NAME));
                assert!(message.contains("malformed configuration"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defaults_serialize_to_toml() {
        let config = ProfilerConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("pyprof2calltree"));
    }

    #[test]
    fn test_command_expands_placeholders() {
        let template = CommandTemplate {
            program: "conv".to_string(),
            args: vec!["-o".into(), "{output}".into(), "--in={input}".into(), "{input}".into()],
        };
        let command = template.command(Path::new("a.prof"), Some(Path::new("a.cgrind")));

        assert_eq!(command.get_program(), "conv");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["-o", "a.cgrind", "--in=a.prof", "a.prof"]);
    }

    #[test]
    fn test_output_placeholder_left_alone_without_output() {
        let template = CommandTemplate { program: "view".to_string(), args: vec!["{input}".into(), "{output}".into()] };
        let command = template.command(Path::new("a.cgrind"), None);
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["a.cgrind", "{output}"]);
    }
}
