//! Injected failures.
//!
//! Stages decide whether to fail by comparing a uniform draw against their
//! configured rate. The draw comes from a [`RandomSource`] so tests can pin
//! the outcome.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rand::Rng;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn draw(&self) -> f32;
}

/// Thread-local RNG, reseeded by the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn draw(&self) -> f32 {
        rand::thread_rng().gen::<f32>()
    }
}

/// Replays a fixed sequence of draws, then repeats `fallback` forever.
#[derive(Debug)]
pub struct FixedDraws {
    draws: Mutex<VecDeque<f32>>,
    fallback: f32,
}

impl FixedDraws {
    pub fn new(draws: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            fallback,
        }
    }

    /// A source that never trips a rate below 1.0.
    pub fn always_pass() -> Self {
        Self::new([], 0.999)
    }
}

impl RandomSource for FixedDraws {
    fn draw(&self) -> f32 {
        let mut draws = self.draws.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        draws.pop_front().unwrap_or(self.fallback)
    }
}

/// A failure rate bound to a random source.
#[derive(Clone)]
pub struct FaultInjector {
    rate: f32,
    source: Arc<dyn RandomSource>,
}

impl FaultInjector {
    pub fn new(rate: f32, source: Arc<dyn RandomSource>) -> Self {
        Self { rate, source }
    }

    /// Never fails, regardless of the source.
    pub fn disabled() -> Self {
        Self::new(0.0, Arc::new(ThreadRandom))
    }

    /// Take one draw; true means the caller should fail.
    pub fn trips(&self) -> bool {
        self.source.draw() < self.rate
    }
}

impl std::fmt::Debug for FaultInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultInjector").field("rate", &self.rate).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_draws_then_fallback() {
        let source = FixedDraws::new([0.1, 0.9], 0.5);
        assert_eq!(source.draw(), 0.1);
        assert_eq!(source.draw(), 0.9);
        assert_eq!(source.draw(), 0.5);
        assert_eq!(source.draw(), 0.5);
    }

    #[test]
    fn test_injector_threshold() {
        let injector = FaultInjector::new(0.2, Arc::new(FixedDraws::new([0.19, 0.2, 0.8], 0.0)));
        assert!(injector.trips());
        assert!(!injector.trips());
        assert!(!injector.trips());
    }

    #[test]
    fn test_extreme_rates_are_deterministic() {
        let never = FaultInjector::new(0.0, Arc::new(ThreadRandom));
        let always = FaultInjector::new(1.0, Arc::new(ThreadRandom));
        for _ in 0..1000 {
            assert!(!never.trips());
            assert!(always.trips());
        }
    }

    #[test]
    fn test_thread_random_range() {
        for _ in 0..1000 {
            let draw = ThreadRandom.draw();
            assert!((0.0..1.0).contains(&draw));
        }
    }
}
