use serde_json::json;

use dynamic_deep_learning::{
    Activation, DynamicDeepLearningEngine, DynamicLayerEngineConfig, LayerBlueprint,
    TrainingOptions, available_domains, generate_domain_input_layers,
};

fn main() -> dynamic_deep_learning::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    for domain in available_domains() {
        let layers = generate_domain_input_layers(domain, 12)?;
        let widths: Vec<_> = layers.iter().map(LayerBlueprint::units).collect();
        println!("{domain:>10}: 12 -> {widths:?}");
    }

    let spec = DynamicLayerEngineConfig::new(6)
        .with_input_layers(generate_domain_input_layers("order-flow", 6)?)
        .with_output_layers(vec![LayerBlueprint::new("signal", 1, Activation::Tanh, 0.0)?])
        .with_options(
            TrainingOptions::default()
                .with_learning_rate(0.01)
                .with_momentum(0.9)
                .with_seed(Some(7)),
        )
        .build_model_spec()?;
    let mut engine = DynamicDeepLearningEngine::new(spec);
    println!("{}", engine.summary());

    // Mapping-form records, as they would arrive from a JSON feed.
    let records: Vec<_> = (0..64)
        .map(|i| {
            let x: Vec<f64> = (0..6).map(|j| (((i + j) % 7) as f64 - 3.0) / 3.0).collect();
            let y = (x[0] - x[5]).tanh();
            json!({
                "features": x,
                "target": [y],
                "weight": if i % 8 == 0 { 2.0 } else { 1.0 },
                "metadata": { "tick": i },
            })
        })
        .collect();

    let history = engine.train_records(&records, 100, 16)?;
    for m in history.iter().step_by(25) {
        println!("{m}");
    }
    println!("{}", engine.evaluate_records(&records)?);

    Ok(())
}
