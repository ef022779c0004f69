//! Model serialization/deserialization (feature: `serde`).
//!
//! A versioned JSON format for `Model`. The format is its own struct so internal
//! representation changes do not break saved files. Loading validates dimensions,
//! matrix lengths and that every weight is finite.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Model, ModelConfig, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedModel {
    pub format_version: u32,
    pub hidden_size: usize,
    pub image_pixels: usize,
    pub num_labels: usize,
    /// Row-major (image_pixels, hidden_size).
    pub w1: Vec<f32>,
    /// Row-major (hidden_size, num_labels).
    pub w2: Vec<f32>,
}

impl SerializedModel {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported model format_version {}; expected {}",
                self.format_version, MODEL_FORMAT_VERSION
            )));
        }
        ModelConfig {
            hidden_size: self.hidden_size,
            image_pixels: self.image_pixels,
            num_labels: self.num_labels,
        }
        .validate()
        .map_err(|e| Error::InvalidData(format!("invalid model dims: {e}")))?;

        if self.w1.iter().chain(&self.w2).any(|w| !w.is_finite()) {
            return Err(Error::InvalidData(
                "weights must contain only finite values".to_owned(),
            ));
        }
        Ok(())
    }
}

impl From<&Model> for SerializedModel {
    fn from(model: &Model) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            hidden_size: model.hidden_size(),
            image_pixels: model.image_pixels(),
            num_labels: model.num_labels(),
            w1: model.w1().to_vec(),
            w2: model.w2().to_vec(),
        }
    }
}

impl TryFrom<SerializedModel> for Model {
    type Error = Error;

    fn try_from(value: SerializedModel) -> std::result::Result<Self, Self::Error> {
        value.validate()?;
        // from_weights checks the matrix lengths against the dims.
        Model::from_weights(
            value.hidden_size,
            value.image_pixels,
            value.num_labels,
            value.w1,
            value.w2,
        )
        .map_err(|e| Error::InvalidData(format!("invalid weights: {e}")))
    }
}

impl Model {
    /// Serialize the model to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&SerializedModel::from(self))
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Serialize the model to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&SerializedModel::from(self))
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Parse a model from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedModel = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse model json: {e}")))?;
        ser.try_into()
    }

    /// Save the model to a JSON file (compact; MNIST-sized weights are large).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "saving model");
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Load a model from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading model");
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }
}
