//! Key-value sinks that drivers publish stream metadata to.
//!
//! The host decides where the records go. [`MemorySink`] keeps them in
//! process and remembers every operation, which is what tests assert on.
//! [`DirSink`] writes one file per key so other programs can pick up the
//! current endpoint.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use livecam_core::{Error, Result};
use parking_lot::Mutex;

/// Object-publishing sink consumed by camera drivers.
pub trait ObjectSink: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn put_object(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Store several objects.
    ///
    /// The default stores them one by one and stops at the first failure, so
    /// a partial write is possible.
    fn put_objects(&self, objects: &BTreeMap<String, Vec<u8>>) -> Result<()> {
        for (key, value) in objects {
            self.put_object(key, value)?;
        }
        Ok(())
    }

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_object(&self, key: &str) -> Result<()>;
}

/// One operation recorded by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    Put { key: String, value: String },
    Remove { key: String },
}

#[derive(Debug, Default)]
struct MemoryInner {
    objects: BTreeMap<String, Vec<u8>>,
    history: Vec<SinkOp>,
}

/// In-process sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: Mutex<MemoryInner>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key` as UTF-8 text.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .objects
            .get(key)
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    /// Snapshot of every stored key.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().objects.keys().cloned().collect()
    }

    /// Every operation applied so far, oldest first.
    pub fn history(&self) -> Vec<SinkOp> {
        self.inner.lock().history.clone()
    }

    /// Forget recorded operations; stored objects are kept.
    pub fn clear_history(&self) {
        self.inner.lock().history.clear();
    }
}

impl ObjectSink for MemorySink {
    fn put_object(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.objects.insert(key.to_string(), value.to_vec());
        inner.history.push(SinkOp::Put {
            key: key.to_string(),
            value: String::from_utf8_lossy(value).into_owned(),
        });
        Ok(())
    }

    fn remove_object(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.objects.remove(key);
        inner.history.push(SinkOp::Remove {
            key: key.to_string(),
        });
        Ok(())
    }
}

/// Sink storing each key as a file under a directory.
///
/// Writes go through a temporary file in the same directory that is renamed
/// into place, so readers never observe a half-written value.
#[derive(Debug, Clone)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(|c| matches!(c, '/' | '\\' | '\0'));
        if !valid {
            return Err(Error::sink(key, "key is not a valid file name"));
        }
        Ok(self.dir.join(key))
    }
}

impl ObjectSink for DirSink {
    fn put_object(&self, key: &str, value: &[u8]) -> Result<()> {
        let target = self.path_for(key)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| Error::sink(key, e.to_string()))?;
        tmp.write_all(value)
            .and_then(|()| tmp.flush())
            .map_err(|e| Error::sink(key, e.to_string()))?;
        tmp.persist(&target)
            .map_err(|e| Error::sink(key, e.error.to_string()))?;
        Ok(())
    }

    fn remove_object(&self, key: &str) -> Result<()> {
        let target = self.path_for(key)?;
        match std::fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::sink(key, e.to_string())),
        }
    }
}
