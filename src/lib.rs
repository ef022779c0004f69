//! A from-scratch MNIST digit classifier.
//!
//! `mnist-mlp` is a one-hidden-layer feed-forward network trained with online SGD.
//! It is small enough to read in one sitting:
//!
//! - ReLU hidden layer with inverted dropout (p = 0.5, survivors scaled by 2)
//! - raw output scores, no softmax
//! - squared-error loss, weights updated after every sample
//! - batched, dropout-free evaluation on a held-out set
//!
//! # Panics vs `Result`
//!
//! Two layers of API:
//!
//! - Low-level hot path (panics on misuse):
//!   - [`Model::forward`], [`Model::forward_without_dropout`], [`Model::backward`],
//!     [`Model::apply_update`]
//!   - [`Training::training_step`], [`Training::evaluation_step`]
//!     Shape mismatches are programmer error and panic via `assert!`.
//!
//! - High-level convenience APIs (shape-checked):
//!   - [`Training::new`], [`Training::train`], [`Model::predict`]
//!   - the [`mnist`] loaders and, with the `serde` feature, model files and the store
//!     These validate inputs and return [`Result`].
//!
//! # Data layout
//!
//! - Scalars are `f32`.
//! - `W1` is `(image_pixels, hidden_size)` and `W2` is `(hidden_size, num_labels)`, both
//!   row-major.
//! - [`Inputs`] and [`Dataset`] store samples contiguously in row-major layout; targets
//!   are one-hot.
//!
//! # Randomness
//!
//! Nothing in this crate reads a global RNG. Weight initialization, dropout masks and
//! stochastic prediction all take an explicit `&mut impl Rng`, so a run is reproducible
//! from its seeds.
//!
//! # Quick start
//!
//! ```rust
//! use mnist_mlp::{Dataset, Model, ModelConfig, TrainConfig, Training};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! # fn main() -> mnist_mlp::Result<()> {
//! let cfg = ModelConfig {
//!     hidden_size: 8,
//!     image_pixels: 4,
//!     num_labels: 2,
//! };
//! let train = Dataset::from_flat(
//!     vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
//!     vec![1.0, 0.0, 0.0, 1.0],
//!     4,
//!     2,
//! )?;
//! let training = Training::new(train.clone(), train)?;
//!
//! let mut model = Model::new_with_seed(&cfg, 0)?;
//! let mut rng = StdRng::seed_from_u64(0);
//! let report = training.train(
//!     &mut model,
//!     &TrainConfig {
//!         epochs: 5,
//!         learning_rate: 0.05,
//!     },
//!     &mut rng,
//! )?;
//! assert_eq!(report.train.err().len(), 5);
//! # Ok(())
//! # }
//! ```
//!
//! # Driving a single step by hand
//!
//! ```rust
//! use mnist_mlp::{Model, ModelConfig};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! # fn main() -> mnist_mlp::Result<()> {
//! let mut model = Model::new_with_seed(
//!     &ModelConfig {
//!         hidden_size: 3,
//!         image_pixels: 2,
//!         num_labels: 2,
//!     },
//!     0,
//! )?;
//! let mut rng = StdRng::seed_from_u64(1);
//!
//! let x = [0.1_f32, 0.9];
//! let label = [0.0_f32, 1.0];
//! let fwd = model.forward(&x, &mut rng);
//! let bp = model.backward(&fwd, &label);
//! model.apply_update(&fwd, &bp, 0.005);
//! # Ok(())
//! # }
//! ```

pub(crate) mod activation;
pub mod config;
pub mod data;
pub mod error;
pub mod loss;
pub(crate) mod matmul;
pub mod metrics;
pub mod mlp;
pub mod mnist;
pub mod model;
pub mod stats;
pub mod train;

#[cfg(feature = "serde")]
pub mod metadata;
#[cfg(feature = "serde")]
pub mod serde_model;
#[cfg(feature = "serde")]
pub mod store;

pub use activation::DROPOUT_SCALE;
pub use config::{ModelConfig, Paths, PredictConfig, TrainConfig};
pub use data::{Dataset, Inputs, one_hot};
pub use error::{Error, Result};
pub use metrics::argmax;
pub use mlp::{BackpropData, ForwardData};
pub use model::Model;
pub use stats::{ExecutionStats, Phase, StepOutcome, TrainReport};
pub use train::Training;

#[cfg(feature = "serde")]
pub use metadata::Metadata;
#[cfg(feature = "serde")]
pub use store::ModelStore;
