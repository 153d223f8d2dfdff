// src/loader.rs

//! Defines the `ResourceLoader` trait, which abstracts over where template
//! and ANSI art files come from, plus the two shipped implementations:
//! `DirLoader` (root-relative filesystem) and `MemoryLoader` (an in-memory
//! name->bytes map, used by tests and by embedders that compile templates
//! into the binary).

use log::debug;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Read-only access to named template resources.
///
/// Every file-composition token (`include`, `link`, `display`, `ansi`,
/// `ansiconvert`, `copy`, `on exit`) resolves its argument through this
/// trait. A missing resource is reported as `io::ErrorKind::NotFound`; the
/// interpreter turns that into an inline error marker rather than a
/// failure.
pub trait ResourceLoader {
    /// Reads the named resource in full.
    fn read(&self, name: &str) -> io::Result<Vec<u8>>;
}

/// Loads resources from the filesystem, relative to a root directory.
#[derive(Debug, Clone)]
pub struct DirLoader {
    root: PathBuf,
}

impl DirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirLoader { root: root.into() }
    }
}

impl Default for DirLoader {
    /// Loads relative to the current working directory.
    fn default() -> Self {
        DirLoader::new(".")
    }
}

impl ResourceLoader for DirLoader {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        let path = self.root.join(name);
        debug!("loading resource {:?}", path);
        std::fs::read(path)
    }
}

/// An in-memory resource map.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    /// Adds or replaces a named resource.
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), data.into());
    }

    /// Builder-style `insert` for test setup.
    pub fn with(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }
}

impl ResourceLoader for MemoryLoader {
    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no resource {name}")))
    }
}
