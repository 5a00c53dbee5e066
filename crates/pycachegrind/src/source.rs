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

//! Target script loading

use crate::error::{ProfilerError, ProfilerResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A script read from disk, held whole in memory.
///
/// The contents are kept as raw bytes so the interpreter applies its own
/// source-encoding rules when compiling.
#[derive(Debug, Clone)]
pub struct TargetScript {
    path: PathBuf,
    source: Vec<u8>,
}

impl TargetScript {
    /// Read the full contents of the script at `path`
    pub fn load(path: impl AsRef<Path>) -> ProfilerResult<Self> {
        let path = path.as_ref();
        let source = fs::read(path).map_err(|source| ProfilerError::FileAccess { path: path.to_path_buf(), source })?;

        debug!(path = %path.display(), bytes = source.len(), "loaded script");

        Ok(Self { path: path.to_path_buf(), source })
    }

    /// Path exactly as the user supplied it
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_reads_whole_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("hello.py");
        fs::write(&path, "print('hello')\n").unwrap();

        let script = TargetScript::load(&path).unwrap();
        assert_eq!(script.path(), path.as_path());
        assert_eq!(script.source(), b"print('hello')\n");
    }

    #[test]
    fn test_missing_file_is_file_access_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("missing.py");

        let error = TargetScript::load(&path).unwrap_err();
        match error {
            ProfilerError::FileAccess { path: reported, source } => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_directory_is_not_a_script() {
        let temp_dir = tempdir().unwrap();
        let error = TargetScript::load(temp_dir.path()).unwrap_err();
        assert!(matches!(error, ProfilerError::FileAccess { .. }));
    }
}
