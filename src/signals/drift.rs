//! Offline weather source: a seeded random walk.

use std::future;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FetchFuture, SignalError, SignalKind, SignalSource};

/// Outdoor temperature that wanders by at most `±max_step_c` per fetch.
///
/// Same seed, same sequence.
#[derive(Debug)]
pub struct DriftingWeather {
    walk: Mutex<Walk>,
    max_step_c: f64,
}

#[derive(Debug)]
struct Walk {
    rng: StdRng,
    current_c: f64,
}

impl DriftingWeather {
    /// Starts a walk at `start_c`.
    ///
    /// # Panics
    ///
    /// Panics if `max_step_c` is negative or not finite.
    pub fn new(start_c: f64, max_step_c: f64, seed: u64) -> Self {
        assert!(
            max_step_c.is_finite() && max_step_c >= 0.0,
            "max_step_c must be finite and >= 0"
        );
        Self {
            walk: Mutex::new(Walk {
                rng: StdRng::seed_from_u64(seed),
                current_c: start_c,
            }),
            max_step_c,
        }
    }

    fn step(&self) -> Result<f64, SignalError> {
        let mut walk = self
            .walk
            .lock()
            .map_err(|_| SignalError::Transport("drift state poisoned".into()))?;
        let delta = walk.rng.random_range(-self.max_step_c..=self.max_step_c);
        walk.current_c += delta;
        Ok(walk.current_c)
    }
}

impl SignalSource for DriftingWeather {
    fn kind(&self) -> SignalKind {
        SignalKind::OutdoorTemp
    }

    fn name(&self) -> &str {
        "drift"
    }

    fn fetch(&self) -> FetchFuture<'_> {
        Box::pin(future::ready(self.step()))
    }
}
