//! Reconnect delay policies for the market data feed

use rand::Rng;
use std::fmt::Debug;
use std::time::Duration;

/// Delay to wait before reconnect attempt `attempt` (1-based)
///
/// `reset` is called once a session has been established so the next
/// failure starts the schedule over.
pub trait BackoffPolicy: Send + Sync + Debug {
    fn delay(&mut self, attempt: u32) -> Duration;

    fn reset(&mut self) {}
}

/// Same delay after every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff {
    delay: Duration,
}

impl ConstantBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for ConstantBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

impl BackoffPolicy for ConstantBackoff {
    fn delay(&mut self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// Exponential delay with a cap and optional jitter
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Delay for the first attempt
    pub initial: Duration,
    /// Upper bound before jitter
    pub max: Duration,
    /// Multiplier per attempt (2.0 doubles)
    pub multiplier: f64,
    /// Random jitter as a fraction of the delay (0.1 = ±10%)
    pub jitter_fraction: f64,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            multiplier: 2.0,
            jitter_fraction: 0.0,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    fn base_delay_ms(&self, attempt: u32) -> f64 {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let raw = self.initial.as_millis() as f64 * self.multiplier.powi(exponent);
        raw.min(self.max.as_millis() as f64)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60)).with_jitter(0.1)
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn delay(&mut self, attempt: u32) -> Duration {
        let base = self.base_delay_ms(attempt);
        let jitter_range = base * self.jitter_fraction;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        Duration::from_millis((base + jitter).max(0.0) as u64)
    }
}
