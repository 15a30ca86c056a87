use dynamic_deep_learning::{
    Activation, DeepLearningLayerSpec, DeepLearningModelSpec, DynamicDeepLearningEngine,
    DynamicLayerEngineConfig, LayerBlueprint, TrainingOptions, TrainingSample,
    generate_domain_input_layers, generate_input_layers,
};

#[test]
fn geometric_expansion_chains_from_input_dim() {
    let layers = generate_input_layers(10, 3, 1.5, Activation::Relu, 0.0, "input", None).unwrap();
    let units: Vec<_> = layers.iter().map(LayerBlueprint::units).collect();
    assert_eq!(units, vec![15, 23, 35]);

    let spec = DynamicLayerEngineConfig::new(10)
        .with_input_layers(layers)
        .with_output_layers(vec![LayerBlueprint::new("out", 1, Activation::Sigmoid, 0.0).unwrap()])
        .build_model_spec()
        .unwrap();
    let dims: Vec<_> = spec
        .layers()
        .iter()
        .map(|l| (l.input_dim(), l.output_dim()))
        .collect();
    assert_eq!(dims, vec![(10, 15), (15, 23), (23, 35), (35, 1)]);
}

#[test]
fn built_specs_report_first_and_last_dims() {
    for (input_dim, widths) in [(1, vec![1]), (7, vec![3, 9, 2]), (12, vec![24, 24, 24, 5])] {
        let (last, hidden) = widths.split_last().unwrap();
        let hidden = hidden
            .iter()
            .enumerate()
            .map(|(i, &w)| LayerBlueprint::new(format!("h{i}"), w, Activation::Tanh, 0.0).unwrap())
            .collect();
        let spec = DynamicLayerEngineConfig::new(input_dim)
            .with_hidden_layers(hidden)
            .with_output_layers(vec![LayerBlueprint::new("out", *last, Activation::Linear, 0.0).unwrap()])
            .build_model_spec()
            .unwrap();

        assert_eq!(spec.input_dim(), input_dim);
        assert_eq!(spec.output_dim(), *last);
        assert_eq!(spec.layers().len(), widths.len());
    }
}

#[test]
fn broken_chain_is_rejected_at_construction() {
    let layers = vec![
        DeepLearningLayerSpec::new("a", 3, 4, Activation::Relu, 0.0).unwrap(),
        DeepLearningLayerSpec::new("b", 5, 2, Activation::Linear, 0.0).unwrap(),
    ];
    let err = DeepLearningModelSpec::new(layers, TrainingOptions::default()).unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("does not match previous output_dim 4"));
}

#[test]
fn domain_preset_stack_trains_end_to_end() {
    let mut input_layers = generate_domain_input_layers("Risk-Management", 4).unwrap();
    assert_eq!(input_layers[0].name(), "risk_input_1");
    input_layers.truncate(2);

    let spec = DynamicLayerEngineConfig::new(4)
        .with_input_layers(input_layers)
        .with_output_layers(vec![LayerBlueprint::new("score", 1, Activation::Sigmoid, 0.0).unwrap()])
        .with_options(
            TrainingOptions::default()
                .with_learning_rate(0.5)
                .with_momentum(0.5)
                .with_seed(Some(3)),
        )
        .build_model_spec()
        .unwrap();
    let mut engine = DynamicDeepLearningEngine::new(spec);

    let samples: Vec<_> = (0..16)
        .map(|i| {
            let x: Vec<f64> = (0..4).map(|j| if (i >> j) & 1 == 1 { 1.0 } else { -1.0 }).collect();
            let label = if x[0] > 0.0 { 1.0 } else { 0.0 };
            TrainingSample::new(x, vec![label]).unwrap()
        })
        .collect();

    let history = engine.train(&samples, 60, 4).unwrap();
    assert!(history.last().unwrap().loss < history[0].loss);

    let eval = engine.evaluate(&samples).unwrap();
    assert!(eval.accuracy.unwrap() >= 0.9);
    assert!(engine.summary().contains("risk_input_1"));
}

#[test]
fn json_config_document_builds_an_engine() {
    let doc = r#"{
        "input_dim": 3,
        "input_layers": [{"name": "in", "units": 6, "activation": "relu", "dropout": 0.1}],
        "hidden_layers": [{"name": "mid", "units": 4, "activation": "tanh"}],
        "output_layers": [{"name": "out", "units": 2, "activation": "softmax"}],
        "learning_rate": 0.02,
        "momentum": 0.9,
        "gradient_clip": 1.0,
        "seed": 99,
        "shuffle_training": false
    }"#;
    let cfg = DynamicLayerEngineConfig::from_json_str(doc).unwrap();
    let engine = DynamicDeepLearningEngine::new(cfg.build_model_spec().unwrap());

    assert_eq!(engine.num_layers(), 3);
    assert_eq!(engine.spec().gradient_clip(), Some(1.0));
    assert!(!engine.spec().shuffle_training());
    assert_eq!(engine.parameter_count(), (3 * 6 + 6) + (6 * 4 + 4) + (4 * 2 + 2));

    let err = DynamicLayerEngineConfig::from_json_str(
        r#"{"input_dim": 3, "output_layers": [{"units": 2, "activation": "mish"}]}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("mish"));
}
