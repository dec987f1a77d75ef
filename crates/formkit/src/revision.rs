//! Revision tokens for optimistic concurrency

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Version marker of one application's form configuration
///
/// Revisions are totally ordered; a larger value is newer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

impl Revision {
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The newer of an optional held revision and an observed one
    pub fn newest(held: Option<Self>, observed: Self) -> Self {
        match held {
            Some(current) if current > observed => current,
            _ => observed,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Revision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(Revision)
            .map_err(|e| Error::malformed("revision", format!("{s:?}: {e}")))
    }
}

impl From<u64> for Revision {
    fn from(value: u64) -> Self {
        Revision(value)
    }
}
