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

//! End-to-end profiling pipeline: load → compile → profile → convert → view

use super::Cli;
use crate::compiler::compile_script;
use crate::config::ProfilerConfig;
use crate::convert::Converter;
use crate::error::{ProfilerError, ProfilerResult};
use crate::harness::{ScriptArgv, run_script};
use crate::paths::OutputPaths;
use crate::profiler::ProfileSession;
use crate::source::TargetScript;
use crate::viewer::Viewer;
use pyo3::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// What to profile and what the script should see as `sys.argv`
#[derive(Debug, Clone)]
pub struct ProfileRequest {
    pub script: PathBuf,
    pub argv: ScriptArgv,
}

impl ProfileRequest {
    pub fn new(script: PathBuf, argv: ScriptArgv) -> Self {
        Self { script, argv }
    }

    /// Fails with [`ProfilerError::Usage`] when no script was given
    pub fn from_cli(cli: Cli) -> ProfilerResult<Self> {
        let (script, args) = cli.into_parts().ok_or(ProfilerError::Usage)?;
        let argv = ScriptArgv::new(&script, args);
        Ok(Self { script, argv })
    }
}

/// Files produced by a successful run
#[derive(Debug, Clone)]
pub struct ProfileOutcome {
    pub paths: OutputPaths,
}

/// Main profiling pipeline
pub struct ProfilePipeline {
    config: ProfilerConfig,
    request: ProfileRequest,
}

impl ProfilePipeline {
    pub fn new(config: ProfilerConfig, request: ProfileRequest) -> Self {
        Self { config, request }
    }

    /// Execute the complete pipeline
    pub fn execute(&self) -> ProfilerResult<ProfileOutcome> {
        info!(script = %self.request.script.display(), "profiling");

        // Step 1: Load source
        let script = TargetScript::load(&self.request.script)?;

        let paths = Python::with_gil(|py| -> ProfilerResult<OutputPaths> {
            // Step 2: Compile before the profiler is enabled
            let compiled = compile_script(py, &script)?;

            // Step 3: Profile one run of the script; the trace is finalized on return
            let paths = OutputPaths::for_script(script.path(), &self.config.output_dir)?;
            let session = ProfileSession::open(py, &paths.trace)?;
            session.runcall(py, |py| run_script(py, &compiled, &self.request.argv).map(drop))?;

            Ok(paths)
        })?;

        // Step 4: Convert the finalized trace
        debug!(converter = %self.config.converter.program, "converting trace");
        Converter::new(&self.config.converter).convert(&paths)?;

        // Step 5: Launch the viewer without waiting for it
        Viewer::new(&self.config.viewer).launch(&paths.callgraph)?;

        Ok(ProfileOutcome { paths })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::CommandTemplate;
    use crate::test_support::interpreter_lock;
    use std::ffi::OsString;
    use std::fs;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    fn config(output_dir: &Path, converter: &str) -> ProfilerConfig {
        ProfilerConfig {
            output_dir: output_dir.to_path_buf(),
            converter: CommandTemplate {
                program: "sh".to_string(),
                args: vec!["-c".into(), converter.into(), "sh".into(), "{input}".into(), "{output}".into()],
            },
            viewer: CommandTemplate { program: "true".to_string(), args: vec!["{input}".into()] },
            ..ProfilerConfig::default()
        }
    }

    fn script(source: &str) -> (TempDir, PathBuf) {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("work.py");
        fs::write(&path, source).unwrap();
        (temp_dir, path)
    }

    fn request(path: &Path, args: &[&str]) -> ProfileRequest {
        ProfileRequest::new(path.to_path_buf(), ScriptArgv::new(path, args.iter().map(OsString::from)))
    }

    #[test]
    fn test_usage_error_without_script() {
        let cli = Cli { command: vec![] };
        assert!(matches!(ProfileRequest::from_cli(cli), Err(ProfilerError::Usage)));
    }

    #[test]
    fn test_pipeline_produces_both_files() {
        let _lock = interpreter_lock();
        let (dir, path) = script("def fib(n):\n    return n if n < 2 else fib(n - 1) + fib(n - 2)\nfib(12)\n");

        let pipeline = ProfilePipeline::new(config(dir.path(), "cp \"$1\" \"$2\""), request(&path, &[]));
        let outcome = pipeline.execute().unwrap();

        assert_eq!(outcome.paths.trace, dir.path().join("work.py.prof"));
        assert_eq!(outcome.paths.callgraph, dir.path().join("work.py.cgrind"));
        assert!(fs::metadata(&outcome.paths.trace).unwrap().len() > 0);
        assert_eq!(fs::read(&outcome.paths.trace).unwrap(), fs::read(&outcome.paths.callgraph).unwrap());
    }

    #[test]
    fn test_syntax_error_creates_no_files() {
        let _lock = interpreter_lock();
        let (dir, path) = script("print('unterminated'\n");

        let pipeline = ProfilePipeline::new(config(dir.path(), "cp \"$1\" \"$2\""), request(&path, &[]));
        let error = pipeline.execute().unwrap_err();

        assert!(matches!(error, ProfilerError::Compile(_)));
        assert!(!dir.path().join("work.py.prof").exists());
        assert!(!dir.path().join("work.py.cgrind").exists());
    }

    #[test]
    fn test_script_failure_keeps_trace_and_skips_conversion() {
        let _lock = interpreter_lock();
        let (dir, path) = script("def explode():\n    raise KeyError('missing')\nexplode()\n");

        let pipeline = ProfilePipeline::new(config(dir.path(), "cp \"$1\" \"$2\""), request(&path, &["x"]));
        let error = pipeline.execute().unwrap_err();

        assert!(matches!(error, ProfilerError::Execution(_)));
        assert!(fs::metadata(dir.path().join("work.py.prof")).unwrap().len() > 0);
        assert!(!dir.path().join("work.py.cgrind").exists());
    }

    #[test]
    fn test_converter_failure_stops_pipeline() {
        let _lock = interpreter_lock();
        let (dir, path) = script("total = sum(range(100))\n");
        let marker = dir.path().join("viewer-ran");
        let mut config = config(dir.path(), "echo 'cannot convert' >&2; exit 1");
        config.viewer = CommandTemplate { program: "touch".to_string(), args: vec![marker.to_string_lossy().into_owned()] };

        let error = ProfilePipeline::new(config, request(&path, &[])).execute().unwrap_err();

        match error {
            ProfilerError::Subprocess { stderr, .. } => assert!(stderr.contains("cannot convert")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.path().join("work.py.prof").exists());
        assert!(!marker.exists());
    }

    #[test]
    fn test_rerun_overwrites_outputs() {
        let _lock = interpreter_lock();
        let (dir, path) = script("x = [i * i for i in range(10)]\n");
        let callgraph = dir.path().join("work.py.cgrind");
        fs::write(&callgraph, b"old").unwrap();

        let pipeline = ProfilePipeline::new(config(dir.path(), "cp \"$1\" \"$2\""), request(&path, &[]));
        pipeline.execute().unwrap();
        pipeline.execute().unwrap();

        assert_ne!(fs::read(&callgraph).unwrap(), b"old");
    }
}
