//! Model, training and path configuration.
//!
//! Every config has a `Default` matching the MNIST setup and a `validate` method.
//! The `from_env` constructors read the same environment variables the serving layer
//! uses; `from_lookup` takes the lookup as a closure so callers (and tests) can
//! supply their own source.

use std::path::PathBuf;
use std::str::FromStr;

use crate::{Error, Result};

pub const DEFAULT_HIDDEN_SIZE: usize = 100;
pub const DEFAULT_IMAGE_SIZE: usize = 28;
pub const DEFAULT_NUM_LABELS: usize = 10;
pub const DEFAULT_LEARNING_RATE: f32 = 0.005;

/// Network dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    pub hidden_size: usize,
    /// Length of a flattened input image.
    pub image_pixels: usize,
    pub num_labels: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_size: DEFAULT_HIDDEN_SIZE,
            image_pixels: DEFAULT_IMAGE_SIZE * DEFAULT_IMAGE_SIZE,
            num_labels: DEFAULT_NUM_LABELS,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 {
            return Err(Error::InvalidConfig("hidden_size must be > 0".to_owned()));
        }
        if self.image_pixels == 0 {
            return Err(Error::InvalidConfig("image_pixels must be > 0".to_owned()));
        }
        if self.num_labels == 0 {
            return Err(Error::InvalidConfig("num_labels must be > 0".to_owned()));
        }
        Ok(())
    }

    /// Read `IMAGE_SIZE`, `LABEL_DIMENSIONS` and `HIDDEN_SIZE` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ModelConfig::from_env`], with a caller-supplied variable lookup.
    ///
    /// `IMAGE_SIZE` is the side of a square image; `image_pixels` is its square.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let image_size: usize = parse_var(&lookup, "IMAGE_SIZE", DEFAULT_IMAGE_SIZE)?;
        let image_pixels = image_size.checked_mul(image_size).ok_or_else(|| {
            Error::InvalidConfig(format!("IMAGE_SIZE {image_size} overflows pixel count"))
        })?;

        let cfg = Self {
            hidden_size: parse_var(&lookup, "HIDDEN_SIZE", DEFAULT_HIDDEN_SIZE)?,
            image_pixels,
            num_labels: parse_var(&lookup, "LABEL_DIMENSIONS", DEFAULT_NUM_LABELS)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Training loop parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 20,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Prediction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictConfig {
    /// Apply dropout (random mask, x2 scaling) while predicting.
    ///
    /// Defaults to `true`: inference historically ran the same stochastic forward pass
    /// as training. Set to `false` for deterministic, full-strength activations.
    pub training_mode: bool,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            training_mode: true,
        }
    }
}

/// Filesystem locations for datasets and stored models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Root of the dataset tree; raw gzip files live under `<data_path>/raw`.
    pub data_path: PathBuf,
    pub models_path: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data"),
            models_path: PathBuf::from("./models"),
        }
    }
}

impl Paths {
    /// Read `DATA_PATH` and `MODELS_PATH` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            data_path: lookup("DATA_PATH").map_or(defaults.data_path, PathBuf::from),
            models_path: lookup("MODELS_PATH").map_or(defaults.models_path, PathBuf::from),
        }
    }

    /// Directory holding the raw gzip IDX files.
    pub fn raw_data_dir(&self) -> PathBuf {
        self.data_path.join("raw")
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("{key}={raw:?} is not valid: {e}"))),
    }
}
