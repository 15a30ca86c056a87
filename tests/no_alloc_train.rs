use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use dynamic_deep_learning::{
    Activation, DeepLearningLayerSpec, DeepLearningModelSpec, DynamicDeepLearningEngine,
    TrainingOptions, TrainingSample,
};

struct CountingAlloc {
    allocs: AtomicUsize,
    reallocs: AtomicUsize,
    bytes: AtomicUsize,
}

impl CountingAlloc {
    const fn new() -> Self {
        Self {
            allocs: AtomicUsize::new(0),
            reallocs: AtomicUsize::new(0),
            bytes: AtomicUsize::new(0),
        }
    }

    fn reset(&self) {
        self.allocs.store(0, Ordering::Relaxed);
        self.reallocs.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
    }

    fn alloc_events(&self) -> usize {
        self.allocs.load(Ordering::Relaxed) + self.reallocs.load(Ordering::Relaxed)
    }
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(layout.size(), Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(layout.size(), Ordering::Relaxed);
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        self.reallocs.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(new_size, Ordering::Relaxed);
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc::new();

fn make_samples(len: usize, input_dim: usize, target_dim: usize) -> Vec<TrainingSample> {
    (0..len)
        .map(|i| {
            let x = vec![0.1 * (i % 7) as f64; input_dim];
            let mut t = vec![0.0; target_dim];
            t[i % target_dim] = 1.0;
            TrainingSample::new(x, t).unwrap()
        })
        .collect()
}

#[test]
fn train_allocations_do_not_grow_with_batch_count() {
    let input_dim = 16;
    let hidden = 32;
    let output_dim = 4;
    let batch_size = 8;

    let spec = DeepLearningModelSpec::new(
        vec![
            DeepLearningLayerSpec::new("hidden", input_dim, hidden, Activation::Tanh, 0.1).unwrap(),
            DeepLearningLayerSpec::new("out", hidden, output_dim, Activation::Softmax, 0.0).unwrap(),
        ],
        TrainingOptions::default()
            .with_learning_rate(1e-2)
            .with_momentum(0.9)
            .with_gradient_clip(Some(1.0))
            .with_seed(Some(0)),
    )
    .unwrap();
    let base = DynamicDeepLearningEngine::new(spec);

    let small = make_samples(batch_size, input_dim, output_dim);
    let large = make_samples(batch_size * 64, input_dim, output_dim);

    // Warm up lazily-initialised state (e.g. log callsites) outside the measurement.
    base.clone().train(&small, 1, batch_size).unwrap();

    let mut engine_small = base.clone();
    ALLOC.reset();
    engine_small.train(&small, 2, batch_size).unwrap();
    let alloc_small = ALLOC.alloc_events();

    let mut engine_large = base;
    ALLOC.reset();
    engine_large.train(&large, 2, batch_size).unwrap();
    let alloc_large = ALLOC.alloc_events();

    assert_eq!(
        alloc_small, alloc_large,
        "expected allocation event count to be independent of the number of batches"
    );
}
