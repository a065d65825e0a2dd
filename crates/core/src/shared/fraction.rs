use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid fraction '{0}', expected N/D")]
pub struct ParseFractionError(pub String);

/// A framerate expressed as `numer / denom` frames per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fraction {
    pub numer: i32,
    pub denom: i32,
}

impl Fraction {
    pub const fn new(numer: i32, denom: i32) -> Self {
        Self { numer, denom }
    }

    /// `0/1`, the "variable or unknown framerate" value.
    pub const fn zero() -> Self {
        Self::new(0, 1)
    }

    pub fn is_zero(&self) -> bool {
        self.numer == 0
    }

    /// Presentation time of frame number `frame`, or `None` for a zero or
    /// malformed framerate.
    pub fn timestamp(&self, frame: u64) -> Option<Duration> {
        if self.numer <= 0 || self.denom <= 0 {
            return None;
        }
        let nanos = frame as u128 * 1_000_000_000 * self.denom as u128 / self.numer as u128;
        u64::try_from(nanos).ok().map(Duration::from_nanos)
    }

    /// Duration of frame number `frame`. Computed from the neighbouring
    /// timestamps so rounding never accumulates.
    pub fn frame_duration(&self, frame: u64) -> Option<Duration> {
        Some(self.timestamp(frame + 1)? - self.timestamp(frame)?)
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

impl FromStr for Fraction {
    type Err = ParseFractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFractionError(s.to_string());
        let (numer, denom) = match s.split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s.trim(), "1"),
        };
        let numer = numer.parse::<i32>().map_err(|_| err())?;
        let denom = denom.parse::<i32>().map_err(|_| err())?;
        if denom == 0 {
            return Err(err());
        }
        Ok(Self::new(numer, denom))
    }
}
