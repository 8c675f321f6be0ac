use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Exponent cap, so long runs cannot overflow the delay.
const MAX_EXPONENT: u32 = 10;

/// How long to wait before retrying a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// The base delay every time.
    #[default]
    Fixed,
    /// `base * 2^attempt` with ±30% jitter.
    Exponential,
}

impl Backoff {
    /// Delay before the attempt after `attempt` (zero-based) failed.
    pub fn delay(self, attempt: u32, base: Duration) -> Duration {
        match self {
            Backoff::Fixed => base,
            Backoff::Exponential => exponential_delay(attempt, base),
        }
    }
}

fn exponential_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 2_u32.saturating_pow(attempt.min(MAX_EXPONENT));
    let delay = base.saturating_mul(factor);

    let jitter_factor = rand::thread_rng().gen_range(0.7..1.3);
    Duration::from_millis((delay.as_millis() as f64 * jitter_factor).round() as u64)
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backoff::Fixed => f.write_str("fixed"),
            Backoff::Exponential => f.write_str("exponential"),
        }
    }
}

impl FromStr for Backoff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Backoff::Fixed),
            "exponential" => Ok(Backoff::Exponential),
            other => Err(format!("expected 'fixed' or 'exponential', got '{other}'")),
        }
    }
}
