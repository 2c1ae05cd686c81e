/*
 * measure.rs
 * Copyright (c) 2025 the webpress developers
 */

//! Opaque timing instrumentation.
//!
//! The pipeline reports per-stage wall time to a caller-supplied [`Measure`]
//! when one is configured. The capability may be shared across concurrently
//! running pipelines, so implementations handle their own synchronization.

use std::time::Duration;

pub trait Measure: Send + Sync {
    /// Record that `stage` took `elapsed`.
    fn record(&self, stage: &str, elapsed: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    impl Measure for Recorder {
        fn record(&self, stage: &str, _elapsed: Duration) {
            self.0.lock().expect("lock").push(stage.to_string());
        }
    }

    #[test]
    fn test_measure_is_object_safe() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        let measure: &dyn Measure = &recorder;
        measure.record("parse", Duration::from_millis(1));
        assert_eq!(*recorder.0.lock().expect("lock"), vec!["parse"]);
    }
}
