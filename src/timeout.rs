use std::time::{Duration, Instant};

/// Sentinel millisecond value meaning "block forever".
pub const INFINITE_MS: u32 = u32::MAX;

/// How long a blocking queue operation may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeout {
    /// Fail immediately if the queue is not ready.
    #[default]
    None,
    /// Wait until the queue is ready.
    Infinite,
    /// Wait for at most the specified duration.
    After(Duration),
}

impl Timeout {
    pub const fn from_millis(ms: u32) -> Self {
        match ms {
            0 => Self::None,
            INFINITE_MS => Self::Infinite,
            ms => Self::After(Duration::from_millis(ms as u64)),
        }
    }

    /// The millisecond encoding of this timeout, saturating below the sentinel.
    pub fn as_millis(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Infinite => INFINITE_MS,
            Self::After(d) => match u32::try_from(d.as_millis()) {
                Ok(ms) if ms < INFINITE_MS => ms.max(1),
                _ => INFINITE_MS - 1,
            },
        }
    }

    /// Folds a zero [`Timeout::After`] into [`Timeout::None`]: no budget
    /// means no wait.
    pub(crate) fn normalize(self) -> Self {
        match self {
            Self::After(d) if d.is_zero() => Self::None,
            timeout => timeout,
        }
    }

    /// Absolute deadline measured from `now`.
    ///
    /// `None` for [`Timeout::Infinite`] and [`Timeout::None`]; a duration too
    /// large to represent is treated as infinite.
    pub(crate) fn deadline(&self, now: Instant) -> Option<Instant> {
        match self {
            Self::After(d) => now.checked_add(*d),
            _ => None,
        }
    }
}

impl From<u32> for Timeout {
    fn from(ms: u32) -> Self {
        Self::from_millis(ms)
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Self::None
        } else {
            Self::After(d)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_is_no_wait() {
        assert_eq!(Timeout::After(Duration::ZERO).normalize(), Timeout::None);
        let one = Timeout::After(Duration::from_millis(1));
        assert_eq!(one.normalize(), one);
        assert_eq!(Timeout::Infinite.normalize(), Timeout::Infinite);
        assert_eq!(Timeout::from(Duration::ZERO), Timeout::None);
    }

    #[test]
    fn unrepresentable_deadline() {
        let now = Instant::now();
        assert_eq!(Timeout::After(Duration::MAX).deadline(now), None);
        assert_eq!(
            Timeout::After(Duration::from_secs(1)).deadline(now),
            Some(now + Duration::from_secs(1))
        );
    }
}
