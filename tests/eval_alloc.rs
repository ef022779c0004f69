use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use mnist_mlp::{Dataset, Model, ModelConfig, Training};

struct CountingAlloc {
    allocs: AtomicUsize,
    reallocs: AtomicUsize,
}

impl CountingAlloc {
    const fn new() -> Self {
        Self {
            allocs: AtomicUsize::new(0),
            reallocs: AtomicUsize::new(0),
        }
    }

    fn reset(&self) {
        self.allocs.store(0, Ordering::Relaxed);
        self.reallocs.store(0, Ordering::Relaxed);
    }

    fn alloc_events(&self) -> usize {
        self.allocs.load(Ordering::Relaxed) + self.reallocs.load(Ordering::Relaxed)
    }
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        self.reallocs.fetch_add(1, Ordering::Relaxed);
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc::new();

fn make_training(len: usize, input_dim: usize, num_labels: usize) -> Training {
    let inputs = vec![0.1_f32; len * input_dim];
    let mut targets = vec![0.0_f32; len * num_labels];
    for i in 0..len {
        targets[i * num_labels + i % num_labels] = 1.0;
    }
    let data = Dataset::from_flat(inputs, targets, input_dim, num_labels).unwrap();
    Training::new(data.clone(), data).unwrap()
}

#[test]
fn evaluation_allocations_do_not_grow_with_test_set() {
    let cfg = ModelConfig {
        hidden_size: 16,
        image_pixels: 32,
        num_labels: 4,
    };
    let model = Model::new_with_seed(&cfg, 0).unwrap();

    let small = make_training(8, cfg.image_pixels, cfg.num_labels);
    let large = make_training(8 * 64, cfg.image_pixels, cfg.num_labels);

    ALLOC.reset();
    let a = small.evaluation_step(&model);
    let alloc_small = ALLOC.alloc_events();

    ALLOC.reset();
    let b = large.evaluation_step(&model);
    let alloc_large = ALLOC.alloc_events();

    assert_eq!(
        alloc_small, alloc_large,
        "evaluation should allocate a fixed number of batch buffers"
    );
    assert!(a.hits <= 8);
    assert!(b.hits <= 8 * 64);
}
