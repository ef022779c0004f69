use mnist_mlp::{Dataset, Inputs, Model, ModelConfig, PredictConfig, TrainConfig, Training};
use rand::SeedableRng;
use rand::rngs::StdRng;

// Four 3x3 "digits": a bar in each direction. Noise-free copies for test.
const GLYPHS: [[f32; 9]; 4] = [
    [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
    [1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
];

fn make_set(copies: usize, jitter: f32) -> mnist_mlp::Result<Dataset> {
    let mut pixels = Vec::new();
    let mut labels = Vec::new();
    for c in 0..copies {
        for (label, glyph) in GLYPHS.iter().enumerate() {
            let shade = 1.0 - jitter * (c % 4) as f32;
            pixels.extend(glyph.iter().map(|&p| p * shade));
            labels.push(label as u8);
        }
    }
    Dataset::from_labels(Inputs::from_flat(pixels, 9)?, &labels, GLYPHS.len())
}

fn main() -> mnist_mlp::Result<()> {
    let train = make_set(16, 0.1)?;
    let test = make_set(1, 0.0)?;
    let training = Training::new(train, test)?;

    let cfg = ModelConfig {
        hidden_size: 16,
        image_pixels: 9,
        num_labels: GLYPHS.len(),
    };
    let mut model = Model::new_with_seed(&cfg, 0)?;
    let mut rng = StdRng::seed_from_u64(0);

    let report = training.train(
        &mut model,
        &TrainConfig {
            epochs: 40,
            learning_rate: 0.02,
        },
        &mut rng,
    )?;
    println!("train: {}", report.train);
    println!("test:  {}", report.test);

    let off = PredictConfig {
        training_mode: false,
    };
    let labels = model.predict_labels(training.test_set().inputs(), &off, &mut rng)?;
    println!("predicted labels: {labels:?}");

    Ok(())
}
