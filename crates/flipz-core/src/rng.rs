use std::collections::VecDeque;
use std::sync::Mutex;

use rand::Rng;

/// Randomness behind a seam so the composer and metrics emitters can be
/// driven deterministically in tests while production stays truly random.
pub trait RandomSource: Send + Sync {
    /// Uniform pick from a candidate list. Empty list yields `None`.
    fn pick<'a>(&self, items: &'a [&'a str]) -> Option<&'a str>;

    /// Uniform integer in the half-open range `[lo, hi)`.
    fn range_u32(&self, lo: u32, hi: u32) -> u32;

    /// Uniform float in the half-open range `[lo, hi)`.
    fn range_f64(&self, lo: f64, hi: f64) -> f64;
}

#[derive(Debug, Default)]
pub struct ThreadRngSource;

impl RandomSource for ThreadRngSource {
    fn pick<'a>(&self, items: &'a [&'a str]) -> Option<&'a str> {
        if items.is_empty() {
            return None;
        }
        let idx = rand::thread_rng().gen_range(0..items.len());
        Some(items[idx])
    }

    fn range_u32(&self, lo: u32, hi: u32) -> u32 {
        rand::thread_rng().gen_range(lo..hi)
    }

    fn range_f64(&self, lo: f64, hi: f64) -> f64 {
        rand::thread_rng().gen_range(lo..hi)
    }
}

/// Scripted source for tests: picks consume a queue of indices, numeric
/// ranges consume a queue of values. Exhausted queues fall back to the
/// first candidate / the low bound, so tests stay total.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    picks: Mutex<VecDeque<usize>>,
    numbers: Mutex<VecDeque<f64>>,
}

impl ScriptedSource {
    pub fn new(picks: Vec<usize>, numbers: Vec<f64>) -> Self {
        Self {
            picks: Mutex::new(picks.into()),
            numbers: Mutex::new(numbers.into()),
        }
    }
}

impl RandomSource for ScriptedSource {
    fn pick<'a>(&self, items: &'a [&'a str]) -> Option<&'a str> {
        if items.is_empty() {
            return None;
        }
        let idx = self.picks.lock().unwrap().pop_front().unwrap_or(0);
        Some(items[idx % items.len()])
    }

    fn range_u32(&self, lo: u32, hi: u32) -> u32 {
        let n = self.numbers.lock().unwrap().pop_front().unwrap_or(lo as f64) as u32;
        n.clamp(lo, hi.saturating_sub(1))
    }

    fn range_f64(&self, lo: f64, hi: f64) -> f64 {
        let n = self.numbers.lock().unwrap().pop_front().unwrap_or(lo);
        n.clamp(lo, hi)
    }
}
