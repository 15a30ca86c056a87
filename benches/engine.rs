use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use dynamic_deep_learning::{
    Activation, DynamicDeepLearningEngine, DynamicLayerEngineConfig, LayerBlueprint,
    TrainingOptions, TrainingSample,
};

fn engine(widths: &[usize], input_dim: usize) -> DynamicDeepLearningEngine {
    let (last, hidden) = widths.split_last().expect("at least one layer");
    let hidden = hidden
        .iter()
        .enumerate()
        .map(|(i, &w)| LayerBlueprint::new(format!("h{i}"), w, Activation::Relu, 0.0).unwrap())
        .collect();
    let spec = DynamicLayerEngineConfig::new(input_dim)
        .with_hidden_layers(hidden)
        .with_output_layers(vec![
            LayerBlueprint::new("out", *last, Activation::Softmax, 0.0).unwrap(),
        ])
        .with_options(
            TrainingOptions::default()
                .with_learning_rate(0.01)
                .with_momentum(0.9)
                .with_seed(Some(0)),
        )
        .build_model_spec()
        .unwrap();
    DynamicDeepLearningEngine::new(spec)
}

fn engine_predict_bench(c: &mut Criterion) {
    let engine = engine(&[256, 256, 10], 128);
    let input = vec![0.1; engine.input_dim()];

    c.bench_function("engine_predict_128_256_256_10", |b| {
        b.iter(|| {
            let out = engine.predict(black_box(&input)).unwrap();
            black_box(out);
        })
    });
}

fn engine_train_epoch_bench(c: &mut Criterion) {
    let base = engine(&[64, 64, 4], 32);
    let samples: Vec<_> = (0..256)
        .map(|i| {
            let x = (0..32).map(|j| ((i * 31 + j * 7) % 17) as f64 / 17.0).collect();
            let mut t = vec![0.0; 4];
            t[i % 4] = 1.0;
            TrainingSample::new(x, t).unwrap()
        })
        .collect();

    c.bench_function("engine_train_epoch_32_64_64_4_b32", |b| {
        b.iter_batched(
            || base.clone(),
            |mut e| {
                let history = e.train(black_box(&samples), 1, 32).unwrap();
                black_box(history);
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, engine_predict_bench, engine_train_epoch_bench);
criterion_main!(benches);
