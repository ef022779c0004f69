//! Package and environment metadata reported to the serving layer (feature: `serde`).

use serde::Serialize;

use crate::store::{MODEL_FILE, list_entries};
use crate::{Paths, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    pub name: String,
    pub author: Vec<String>,
    pub description: String,
    pub license: String,
    pub version: String,
    /// Raw files under `<data_path>/raw`.
    pub datasets: Vec<String>,
    /// Models in the local store.
    pub models: Vec<String>,
}

impl Metadata {
    pub fn collect(paths: &Paths) -> Result<Self> {
        let authors = env!("CARGO_PKG_AUTHORS");
        Ok(Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            author: authors
                .split(':')
                .filter(|a| !a.is_empty())
                .map(str::to_owned)
                .collect(),
            description: env!("CARGO_PKG_DESCRIPTION").to_owned(),
            license: env!("CARGO_PKG_LICENSE").to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            datasets: list_entries(&paths.raw_data_dir(), |p| p.is_file())?,
            models: list_entries(&paths.models_path, |p| p.join(MODEL_FILE).is_file())?,
        })
    }
}
