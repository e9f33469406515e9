//! Failure classification for the retry executor.

use crate::client::RemoteError;
use std::time::Duration;

const RATE_LIMITED: &str = "rate limited";
const TOO_MANY_REQUESTS: &str = "Too Many Requests";
const TRY_AGAIN_IN: &str = "Try again in";

/// How the executor should treat a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Retrying will not help.
    Terminal,
    /// Server throttling. `retry_after` is the wait it suggested, if any.
    RateLimited { retry_after: Option<Duration> },
}

impl Classification {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Classification::RateLimited { .. })
    }
}

/// Errors the retry executor knows how to classify.
pub trait Classify {
    fn classify(&self) -> Classification;
}

impl Classify for RemoteError {
    fn classify(&self) -> Classification {
        match self {
            RemoteError::RateLimited { retry_after } => Classification::RateLimited {
                retry_after: retry_after.filter(|d| !d.is_zero()),
            },
            RemoteError::Other(message) => classify_message(message),
            RemoteError::NotFound => Classification::Terminal,
        }
    }
}

impl Classify for String {
    fn classify(&self) -> Classification {
        classify_message(self)
    }
}

impl Classify for &str {
    fn classify(&self) -> Classification {
        classify_message(self)
    }
}

/// Classify opaque error text.
///
/// Throttling is recognised by case-sensitive substrings. When the text also
/// says "Try again in", the first run of digits is read as seconds.
pub fn classify_message(text: &str) -> Classification {
    if !text.contains(RATE_LIMITED) && !text.contains(TOO_MANY_REQUESTS) {
        return Classification::Terminal;
    }

    let retry_after = if text.contains(TRY_AGAIN_IN) {
        first_integer(text)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    } else {
        None
    };

    Classification::RateLimited { retry_after }
}

/// First run of ASCII digits in `text`, if it fits a u64.
fn first_integer(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits = &text[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}
