use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::pipeline::SourceFile;

#[derive(Default, Clone)]
#[salsa::db]
pub struct EffmatchDatabaseImpl {
    storage: salsa::Storage<Self>,
    sources: Arc<DashMap<(PathBuf, String), SourceFile>>,
}

#[salsa::db]
impl salsa::Database for EffmatchDatabaseImpl {}

impl EffmatchDatabaseImpl {
    /// Load `path` from disk, reusing the input created by an earlier call
    /// for the same file and runtime module.
    pub fn input(&self, path: &Path, runtime_module: &str) -> std::io::Result<SourceFile> {
        let path = path.canonicalize()?;
        match self.sources.entry((path, runtime_module.to_owned())) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let (path, runtime_module) = entry.key().clone();
                let text = std::fs::read_to_string(&path)?;
                let file = SourceFile::new(self, path, text, runtime_module);
                entry.insert(file);
                Ok(file)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_input_is_cached_per_runtime_module() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "let x = 1").unwrap();
        let db = EffmatchDatabaseImpl::default();

        let first = db.input(tmp.path(), "Effect").unwrap();
        let again = db.input(tmp.path(), "Effect").unwrap();
        let other = db.input(tmp.path(), "Fx").unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(first.text(&db), "let x = 1");
        assert_eq!(other.runtime_module(&db), "Fx");
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let db = EffmatchDatabaseImpl::default();
        assert!(db.input(Path::new("/nonexistent/effmatch.ml"), "Effect").is_err());
    }
}
