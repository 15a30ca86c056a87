use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dynamic_deep_learning::{
    Activation, DynamicDeepLearningEngine, DynamicLayerEngineConfig, LayerBlueprint,
    TrainingOptions, TrainingSample,
};

fn main() -> dynamic_deep_learning::Result<()> {
    // Tiny synthetic 3-class dataset in 2D.
    // Each class is a blob around a different center.
    let mut rng = StdRng::seed_from_u64(0);

    let centers = [[-1.0, -1.0], [1.0, -1.0], [0.0, 1.0]];
    let n_per_class = 128;
    let mut train = Vec::with_capacity(3 * n_per_class);

    for (class, center) in centers.iter().enumerate() {
        for _ in 0..n_per_class {
            let x0 = center[0] + rng.gen_range(-0.3..0.3);
            let x1 = center[1] + rng.gen_range(-0.3..0.3);

            let mut one_hot = vec![0.0; 3];
            one_hot[class] = 1.0;
            train.push(TrainingSample::new(vec![x0, x1], one_hot)?);
        }
    }

    // Softmax output pairs with cross-entropy loss.
    let spec = DynamicLayerEngineConfig::new(2)
        .with_hidden_layers(vec![LayerBlueprint::new("hidden", 16, Activation::Relu, 0.0)?])
        .with_output_layers(vec![LayerBlueprint::new("classes", 3, Activation::Softmax, 0.0)?])
        .with_options(
            TrainingOptions::default()
                .with_learning_rate(0.05)
                .with_momentum(0.9)
                .with_l2_regularisation(1e-4)
                .with_gradient_clip(Some(5.0))
                .with_seed(Some(0)),
        )
        .build_model_spec()?;
    let mut engine = DynamicDeepLearningEngine::new(spec);

    let history = engine.train(&train, 200, 32)?;
    if let Some(last) = history.last() {
        println!("train: {last}");
    }

    let eval = engine.evaluate(&train)?;
    println!("{eval}");

    let probs = engine.predict(&[0.0, 1.0])?;
    println!("p(class | [0, 1]) = {probs:.3?}");

    Ok(())
}
