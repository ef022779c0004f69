//! Local filesystem model store (feature: `serde`).
//!
//! Each model lives in its own directory: `<root>/<name>/model.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{Error, Model, Result};

pub const MODEL_FILE: &str = "model.json";

#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the model file for `name`.
    pub fn model_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name).join(MODEL_FILE))
    }

    /// Write `model` under `name`, replacing any previous version.
    pub fn save(&self, name: &str, model: &Model) -> Result<PathBuf> {
        let path = self.model_path(name)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        if path.exists() {
            info!(name, "model exists, replacing");
        }
        model.save_json(&path)?;
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Model> {
        let path = self.model_path(name)?;
        if !path.is_file() {
            return Err(Error::InvalidData(format!(
                "no model named {name:?} in {}",
                self.root.display()
            )));
        }
        Model::load_json(path)
    }

    /// Names of stored models, sorted. A missing root is an empty store.
    pub fn list(&self) -> Result<Vec<String>> {
        debug!(root = %self.root.display(), "scanning model store");
        list_entries(&self.root, |p| p.join(MODEL_FILE).is_file())
    }
}

/// Sorted names of the entries in `dir` that satisfy `keep`. A missing `dir` yields
/// an empty list.
pub(crate) fn list_entries<F>(dir: &Path, keep: F) -> Result<Vec<String>>
where
    F: Fn(&Path) -> bool,
{
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !keep(&entry.path()) {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_owned());
        }
    }
    names.sort();
    Ok(names)
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(Error::InvalidConfig(format!("invalid model name {name:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelConfig;

    fn cfg() -> ModelConfig {
        ModelConfig {
            hidden_size: 2,
            image_pixels: 3,
            num_labels: 2,
        }
    }

    #[test]
    fn save_list_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("models"));
        assert!(store.list().unwrap().is_empty());

        let a = Model::new_with_seed(&cfg(), 1).unwrap();
        let b = Model::new_with_seed(&cfg(), 2).unwrap();
        store.save("mnist_b", &b).unwrap();
        store.save("mnist_a", &a).unwrap();
        // A stray directory without a model file is not listed.
        std::fs::create_dir_all(store.root().join("scratch")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["mnist_a", "mnist_b"]);
        assert_eq!(store.load("mnist_a").unwrap(), a);

        store.save("mnist_a", &b).unwrap();
        assert_eq!(store.load("mnist_a").unwrap(), b);
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let model = Model::zeros(&cfg()).unwrap();
        for name in ["", "..", "a/b", "a\\b"] {
            assert!(store.save(name, &model).is_err(), "{name:?} accepted");
        }
    }

    #[test]
    fn load_missing_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let err = store.load("absent").unwrap_err();
        assert!(format!("{err}").contains("absent"));
    }
}
