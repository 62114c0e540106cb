use crate::error::RequestError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sentinel used on the wire for "draw a fresh random seed".
pub const RANDOM_SEED: i64 = -1;

/// A seed as callers send it: the sentinel `-1` or any value in `0..=u64::MAX`.
///
/// Unsigned is tried first, so every seed the compiler resolves can be sent back as-is.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum WireSeed {
    Unsigned(u64),
    Signed(i64),
}

impl Default for WireSeed {
    fn default() -> Self {
        WireSeed::Signed(RANDOM_SEED)
    }
}

impl From<u64> for WireSeed {
    fn from(value: u64) -> Self {
        WireSeed::Unsigned(value)
    }
}

impl From<i64> for WireSeed {
    fn from(value: i64) -> Self {
        WireSeed::Signed(value)
    }
}

impl FromStr for WireSeed {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.parse::<u64>()
            .map(WireSeed::Unsigned)
            .or_else(|_| s.parse::<i64>().map(WireSeed::Signed))
            .map_err(|_| RequestError::InvalidParameter {
                field: "seed",
                message: format!("'{}' is not an integer seed", s),
            })
    }
}

/// The seed a request asks for.
///
/// Fixed seeds and random draws share the full `u64` range the sampler accepts. On the wire
/// `-1` means random; any other negative value is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seed {
    #[default]
    Random,
    Fixed(u64),
}

impl Seed {
    pub fn from_wire(value: WireSeed) -> Result<Self, RequestError> {
        match value {
            WireSeed::Unsigned(v) => Ok(Seed::Fixed(v)),
            WireSeed::Signed(RANDOM_SEED) => Ok(Seed::Random),
            WireSeed::Signed(v) if v >= 0 => Ok(Seed::Fixed(v as u64)),
            WireSeed::Signed(v) => Err(RequestError::InvalidParameter {
                field: "seed",
                message: format!("{} is negative and not the random sentinel -1", v),
            }),
        }
    }

    /// Resolves to a concrete sampler seed. Called once per compilation.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> u64 {
        match self {
            Seed::Random => rng.random::<u64>(),
            Seed::Fixed(value) => value,
        }
    }
}
