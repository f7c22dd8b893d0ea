//! Back-off sequences for retrying batch requests that report unprocessed items.
//!
//! A sequence yields wait multipliers; [`BackoffConfig`] multiplies each one by
//! a time slot to get the delay before the next attempt.

use std::time;

/// Restartable producer of wait multipliers.
pub trait Backoff: Iterator<Item = u32> + Send {
    /// Restart the sequence from its first multiplier.
    fn reset(&mut self);
}

/// `0, 1, 2, 4, 8, ...`, capped at `max_multiplier`.
///
/// ```rust
/// use dynamodb_mapper::backoff::ExponentialBackoff;
///
/// let multipliers: Vec<u32> = ExponentialBackoff::new(8).take(7).collect();
/// assert_eq!(multipliers, vec![0, 1, 2, 4, 8, 8, 8]);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExponentialBackoff {
    attempt: u32,
    max_multiplier: u32,
}

impl ExponentialBackoff {
    /// Sequence capped at `max_multiplier`.
    pub fn new(max_multiplier: u32) -> Self {
        Self {
            attempt: 0,
            max_multiplier,
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(u32::MAX)
    }
}

impl Iterator for ExponentialBackoff {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let multiplier = match self.attempt {
            0 => 0,
            attempt => 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX),
        };
        self.attempt = self.attempt.saturating_add(1);
        Some(multiplier.min(self.max_multiplier))
    }
}

impl Backoff for ExponentialBackoff {
    fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// The same multiplier forever.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FixedBackoff {
    multiplier: u32,
}

impl FixedBackoff {
    /// Sequence repeating `multiplier`.
    pub fn new(multiplier: u32) -> Self {
        Self { multiplier }
    }
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Iterator for FixedBackoff {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.multiplier)
    }
}

impl Backoff for FixedBackoff {
    fn reset(&mut self) {}
}

/// `0, 1, 2, 3, ...`, capped at `max_multiplier`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinearBackoff {
    attempt: u32,
    max_multiplier: u32,
}

impl LinearBackoff {
    /// Sequence capped at `max_multiplier`.
    pub fn new(max_multiplier: u32) -> Self {
        Self {
            attempt: 0,
            max_multiplier,
        }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(u32::MAX)
    }
}

impl Iterator for LinearBackoff {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let multiplier = self.attempt.min(self.max_multiplier);
        self.attempt = self.attempt.saturating_add(1);
        Some(multiplier)
    }
}

impl Backoff for LinearBackoff {
    fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Which sequence a batch request retries with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BackoffStrategy {
    /// [`ExponentialBackoff`] capped at the given multiplier.
    Exponential {
        /// Largest multiplier.
        max_multiplier: u32,
    },
    /// [`FixedBackoff`] with the given multiplier.
    Fixed {
        /// Multiplier of every wait.
        multiplier: u32,
    },
    /// [`LinearBackoff`] capped at the given multiplier.
    Linear {
        /// Largest multiplier.
        max_multiplier: u32,
    },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            max_multiplier: u32::MAX,
        }
    }
}

impl BackoffStrategy {
    /// Fresh sequence for this strategy.
    pub fn sequence(self) -> Box<dyn Backoff> {
        match self {
            Self::Exponential { max_multiplier } => Box::new(ExponentialBackoff::new(max_multiplier)),
            Self::Fixed { multiplier } => Box::new(FixedBackoff::new(multiplier)),
            Self::Linear { max_multiplier } => Box::new(LinearBackoff::new(max_multiplier)),
        }
    }
}

/// Retry policy of batch requests.
///
/// ```rust
/// use dynamodb_mapper::backoff::BackoffConfig;
/// use std::time::Duration;
///
/// let config = BackoffConfig {
///     time_slot: Duration::from_millis(100),
///     max_attempts: 4,
///     ..Default::default()
/// };
/// let delays: Vec<Duration> = config.delays().collect();
/// assert_eq!(
///     delays,
///     vec![0, 100, 200, 400].into_iter().map(Duration::from_millis).collect::<Vec<_>>()
/// );
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BackoffConfig {
    /// Duration a multiplier of one stands for.
    pub time_slot: time::Duration,
    /// Retries after the first attempt.
    pub max_attempts: usize,
    /// Multiplier sequence.
    pub strategy: BackoffStrategy,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            time_slot: time::Duration::from_millis(1000),
            max_attempts: 5,
            strategy: BackoffStrategy::default(),
        }
    }
}

impl BackoffConfig {
    /// Delay for one multiplier.
    pub fn delay(&self, multiplier: u32) -> time::Duration {
        self.time_slot.saturating_mul(multiplier)
    }

    /// Delays before each retry, at most `max_attempts` of them.
    pub fn delays(&self) -> impl Iterator<Item = time::Duration> + Send + use<> {
        let config = *self;
        config
            .strategy
            .sequence()
            .take(config.max_attempts)
            .map(move |multiplier| config.delay(multiplier))
    }

    /// No retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }
}

/// Sleep for the next delay, returning `false` once retries are exhausted.
pub(crate) async fn wait(delays: &mut (impl Iterator<Item = time::Duration> + Send)) -> bool {
    match delays.next() {
        Some(delay) => {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::uncapped(ExponentialBackoff::default(), vec![0, 1, 2, 4, 8, 16])]
    #[case::capped(ExponentialBackoff::new(4), vec![0, 1, 2, 4, 4, 4])]
    fn test_exponential(#[case] backoff: ExponentialBackoff, #[case] expected: Vec<u32>) {
        assert_eq!(backoff.take(6).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_exponential_saturates() {
        let mut backoff = ExponentialBackoff::default();
        assert_eq!(backoff.nth(40), Some(u32::MAX));
    }

    #[test]
    fn test_linear() {
        let multipliers: Vec<u32> = LinearBackoff::new(3).take(6).collect();
        assert_eq!(multipliers, vec![0, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn test_fixed() {
        let multipliers: Vec<u32> = FixedBackoff::new(2).take(3).collect();
        assert_eq!(multipliers, vec![2, 2, 2]);
    }

    #[test]
    fn test_reset_restarts() {
        let mut backoff = ExponentialBackoff::default();
        backoff.by_ref().take(4).for_each(drop);
        backoff.reset();
        assert_eq!(backoff.by_ref().take(3).collect::<Vec<_>>(), vec![0, 1, 2]);
        let mut sequence = BackoffStrategy::Linear { max_multiplier: 9 }.sequence();
        sequence.next();
        sequence.reset();
        assert_eq!(sequence.next(), Some(0));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut backoff = ExponentialBackoff::default();
        backoff.next();
        let mut cloned = backoff.clone();
        assert_eq!(cloned.next(), Some(1));
        assert_eq!(backoff.next(), Some(1));
    }

    #[rstest]
    #[case::exponential(BackoffStrategy::Exponential { max_multiplier: 2 }, vec![0, 10, 20, 20])]
    #[case::fixed(BackoffStrategy::Fixed { multiplier: 3 }, vec![30, 30, 30, 30])]
    #[case::linear(BackoffStrategy::Linear { max_multiplier: 5 }, vec![0, 10, 20, 30])]
    fn test_delays(#[case] strategy: BackoffStrategy, #[case] expected: Vec<u64>) {
        let config = BackoffConfig {
            time_slot: time::Duration::from_millis(10),
            max_attempts: 4,
            strategy,
        };
        let expected: Vec<_> = expected.into_iter().map(time::Duration::from_millis).collect();
        assert_eq!(config.delays().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_disabled() {
        assert_eq!(BackoffConfig::disabled().delays().count(), 0);
    }
}
