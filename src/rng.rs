//! Injectable randomness for the lifecycle engine.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send {
    /// Uniform draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform real in `[0, upper)`.
    fn uniform(&mut self, upper: f64) -> f64 {
        self.next_f64() * upper
    }

    /// Uniform integer in `[0, upper)`.
    fn below(&mut self, upper: u64) -> u64 {
        let v = (self.next_f64() * upper as f64).floor() as u64;
        v.min(upper.saturating_sub(1))
    }
}

/// Thread-local entropy, the default for live runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible stream from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, then repeats `fallback` forever.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            values: values.into_iter().map(clamp_unit).collect(),
            fallback: clamp_unit(fallback),
        }
    }

    pub fn fixed(value: f64) -> Self {
        Self::new(std::iter::empty(), value)
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.values.pop_front().unwrap_or(self.fallback)
    }
}

// Keep scripted draws inside the half-open unit interval.
fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0 - f64::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_replays_then_falls_back() {
        let mut r = ScriptedRandom::new([0.1, 0.2], 0.5);
        assert_eq!(r.next_f64(), 0.1);
        assert_eq!(r.next_f64(), 0.2);
        assert_eq!(r.next_f64(), 0.5);
        assert_eq!(r.next_f64(), 0.5);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_below_stays_in_range() {
        let mut r = ScriptedRandom::fixed(1.0);
        assert_eq!(r.below(1000), 999);
        let mut r = ScriptedRandom::fixed(0.0);
        assert_eq!(r.below(1000), 0);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = SeededRandom::new(7);
        let mut b = SeededRandom::new(7);
        for _ in 0..10 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn test_thread_random_in_unit_interval() {
        let mut r = ThreadRandom;
        for _ in 0..100 {
            let v = r.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
