//! Shared helpers for the view integration tests.

#![allow(dead_code)]

use ffistruct_view::{CodecConfig, PackWidth, StringCodec, StructView, Value};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Interns strings behind fake, monotonically increasing addresses.
#[derive(Default)]
pub struct StubStrings {
    inner: Mutex<Interner>,
}

#[derive(Default)]
struct Interner {
    by_value: HashMap<String, u64>,
    by_pointer: HashMap<u64, String>,
    next: u64,
}

impl StubStrings {
    pub fn pointer_of(&self, value: &str) -> u64 {
        self.inner.lock().by_value.get(value).copied().unwrap_or(0)
    }

    /// Registers text that some other party placed at `pointer`.
    pub fn register(&self, pointer: u64, value: &str) {
        self.inner.lock().by_pointer.insert(pointer, value.to_string());
    }
}

impl StringCodec for StubStrings {
    fn string_to_pointer(&self, value: &str) -> u64 {
        if value.is_empty() {
            return 0;
        }
        let mut inner = self.inner.lock();
        if let Some(pointer) = inner.by_value.get(value) {
            return *pointer;
        }
        inner.next += 1;
        let pointer = inner.next;
        inner.by_value.insert(value.to_string(), pointer);
        inner.by_pointer.insert(pointer, value.to_string());
        pointer
    }

    fn pointer_to_string(&self, pointer: u64) -> String {
        if pointer == 0 {
            return String::new();
        }
        self.inner
            .lock()
            .by_pointer
            .get(&pointer)
            .cloned()
            .unwrap_or_default()
    }
}

pub fn stub_codec(pack: PackWidth) -> (CodecConfig, Arc<StubStrings>) {
    let strings = Arc::new(StubStrings::default());
    let config = CodecConfig {
        pack,
        strings: strings.clone(),
    };
    (config, strings)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Reads a scalar field, panicking on anything else.
pub fn scalar(view: &StructView, name: &str) -> Value {
    view.get(name)
        .expect("known field")
        .into_value()
        .expect("scalar field")
}
