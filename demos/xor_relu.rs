use dynamic_deep_learning::{
    Activation, DynamicDeepLearningEngine, DynamicLayerEngineConfig, LayerBlueprint,
    TrainingOptions, TrainingSample,
};

fn main() -> dynamic_deep_learning::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Classic XOR dataset.
    let xs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let ys = [0.0, 1.0, 1.0, 0.0];
    let train = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| TrainingSample::new(x.to_vec(), vec![y]))
        .collect::<Result<Vec<_>, _>>()?;

    // 2 -> 8 -> 1 network.
    // ReLU hidden layer, sigmoid output for a probability-like output.
    let spec = DynamicLayerEngineConfig::new(2)
        .with_hidden_layers(vec![LayerBlueprint::new("hidden", 8, Activation::Relu, 0.0)?])
        .with_output_layers(vec![LayerBlueprint::new("out", 1, Activation::Sigmoid, 0.0)?])
        .with_options(
            TrainingOptions::default()
                .with_learning_rate(0.5)
                .with_momentum(0.5)
                .with_seed(Some(0)),
        )
        .build_model_spec()?;
    let mut engine = DynamicDeepLearningEngine::new(spec);
    println!("{}", engine.summary());

    let history = engine.train(&train, 2_000, 4)?;
    if let Some(last) = history.last() {
        println!("{last}");
    }
    println!("{}", engine.evaluate(&train)?);

    for x in xs {
        let y = engine.predict(&x)?;
        println!("x={x:?} y={:.4}", y[0]);
    }

    Ok(())
}
