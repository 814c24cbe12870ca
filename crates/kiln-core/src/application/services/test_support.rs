//! In-crate filesystem double for service tests.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::{ApplicationError, ports::Filesystem};
use crate::error::KilnResult;

#[derive(Default)]
pub struct FakeFs {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    links: BTreeMap<PathBuf, PathBuf>,
    writes: usize,
}

impl FakeFs {
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(PathBuf::from(path), content.as_bytes().to_vec());
        self
    }

    /// Make `from` a symbolic link to `to`.
    pub fn with_link(self, from: &str, to: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .links
            .insert(PathBuf::from(from), PathBuf::from(to));
        self
    }

    pub fn read(&self, path: &str) -> Option<String> {
        self.bytes(path).and_then(|b| String::from_utf8(b).ok())
    }

    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(Path::new(path)).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().files.keys().cloned().collect()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state.lock().unwrap().dirs.contains(Path::new(path))
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }
}

impl Filesystem for FakeFs {
    fn create_dir_all(&self, path: &Path) -> KilnResult<()> {
        let mut state = self.state.lock().unwrap();
        for ancestor in path.ancestors() {
            state.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> KilnResult<()> {
        let mut state = self.state.lock().unwrap();
        state.writes += 1;
        state.files.insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> KilnResult<String> {
        let bytes = self
            .state
            .lock()
            .unwrap()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| ApplicationError::FileNotFound {
                path: path.to_path_buf(),
            })?;
        String::from_utf8(bytes).map_err(|e| {
            ApplicationError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.state.lock().unwrap().files.contains_key(path)
    }

    fn real_path(&self, path: &Path) -> KilnResult<PathBuf> {
        let state = self.state.lock().unwrap();
        let resolved = state.links.iter().find_map(|(from, to)| {
            path.strip_prefix(from).ok().map(|rest| to.join(rest))
        });
        Ok(resolved.unwrap_or_else(|| path.to_path_buf()))
    }
}
