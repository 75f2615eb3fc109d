//! Random sources for crit and variance rolls

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform rolls in `[0, 1)`
pub trait RandomSource: Send {
    fn roll(&mut self) -> f32;
}

/// Unseeded thread-local generator
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn roll(&mut self) -> f32 {
        rand::thread_rng().gen::<f32>()
    }
}

/// Deterministic generator for replays and tests
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn roll(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// Always returns the same value
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f32);

impl RandomSource for FixedRandom {
    fn roll(&mut self) -> f32 {
        self.0
    }
}

/// Replays a fixed sequence, repeating the last value once exhausted
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }
}

impl RandomSource for SequenceRandom {
    fn roll(&mut self) -> f32 {
        let value = match self.values.get(self.cursor) {
            Some(value) => *value,
            None => self.values.last().copied().unwrap_or(0.5),
        };
        self.cursor += 1;
        value
    }
}
