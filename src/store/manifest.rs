//! In-memory view of a synced artifact tree.
//!
//! Rather than a bare `HashMap<String, RawHandle>`, each entry is a
//! [`ModuleDir`] that owns one open directory descriptor and closes it on
//! `Drop`.

use std::fs::File;
use std::path::{Path, PathBuf};

/// An open handle to one module's artifact directory.
///
/// On Unix, opening a directory with `std::fs::File::open` yields a valid,
/// read-only descriptor; it is closed automatically when this value is
/// dropped.
#[derive(Debug)]
pub struct ModuleDir {
    path: PathBuf,
    #[allow(dead_code)] // kept open for the handle's lifetime, never read directly
    handle: File,
}

impl ModuleDir {
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let handle = File::open(&path)?;
        Ok(Self { path, handle })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The set of modules available for one `(repository, version)`.
#[derive(Debug, Default)]
pub struct Manifest {
    modules: Vec<(String, ModuleDir)>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, dir: ModuleDir) {
        self.modules.push((name, dir));
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn module_names(&self) -> Vec<String> {
        self.modules.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDir> {
        self.modules
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, dir)| dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_has_no_modules() {
        let m = Manifest::new();
        assert!(m.is_empty());
        assert!(m.module_names().is_empty());
    }

    #[test]
    fn insert_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let module_dir = ModuleDir::open(dir.path()).unwrap();
        let mut m = Manifest::new();
        m.insert("mymodule".to_string(), module_dir);
        assert_eq!(m.len(), 1);
        assert!(m.get("mymodule").is_some());
        assert!(m.get("other").is_none());
        assert_eq!(m.module_names(), vec!["mymodule".to_string()]);
    }
}
