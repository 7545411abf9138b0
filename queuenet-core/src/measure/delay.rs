use crate::time::DurationParseError;
use std::{fmt, str::FromStr, time::Duration};

/// A fixed amount of simulated time, kept in microseconds.
///
/// Used for the service time of a link, the interval between two
/// arrivals and, in command lines, for timeouts. There is no default
/// value: each use has its own, see [`defaults`](crate::defaults).
///
/// ```
/// # use queuenet_core::measure::Delay;
/// # use std::time::Duration;
/// let delay: Delay = "1s 250ms".parse().unwrap();
/// assert_eq!(delay.into_duration(), Duration::from_millis(1_250));
/// assert_eq!(delay.to_string(), "1s250ms");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Delay(u64);

impl Delay {
    pub const ZERO: Self = Self(0);

    /// The longest representable delay, a bit more than 584 000 years.
    pub const MAX: Self = Self(u64::MAX);

    /// Sub-microsecond precision is truncated, durations beyond
    /// [`Delay::MAX`] saturate.
    ///
    /// ```
    /// # use queuenet_core::measure::Delay;
    /// # use std::time::Duration;
    /// let delay = Delay::new(Duration::from_nanos(987_654_321));
    /// assert_eq!(delay.into_duration(), Duration::from_micros(987_654));
    ///
    /// assert_eq!(Delay::new(Duration::MAX), Delay::MAX);
    /// ```
    pub const fn new(duration: Duration) -> Self {
        match Self::checked_new(duration) {
            Some(delay) => delay,
            None => Self::MAX,
        }
    }

    const fn checked_new(duration: Duration) -> Option<Self> {
        let micros = duration.as_micros();
        if micros > u64::MAX as u128 {
            None
        } else {
            Some(Self(micros as u64))
        }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000))
    }

    #[inline]
    pub fn into_duration(self) -> Duration {
        Duration::from_micros(self.0)
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<Delay> for Duration {
    fn from(value: Delay) -> Self {
        value.into_duration()
    }
}

impl From<Duration> for Delay {
    fn from(value: Duration) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::time::Duration::new(self.into_duration()).fmt(f)
    }
}

/// Same syntax as the lexer in [`time`](crate::time). A value that does
/// not fit in [`Delay::MAX`] is rejected with
/// [`DurationParseError::Overflow`] rather than saturated.
impl FromStr for Delay {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let duration = crate::time::Duration::from_str(s)?.into_duration();

        Self::checked_new(duration).ok_or_else(|| DurationParseError::Overflow {
            input: s.to_owned(),
        })
    }
}
