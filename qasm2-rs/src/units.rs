// Copyright 2024 Rigetti Computing
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Units of time and of phase.

use std::{fmt, str::FromStr};

/// A phase measured in whole turns.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cycles<T>(pub T);

/// A phase measured in radians.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Radians<T>(pub T);

impl From<Cycles<f64>> for Radians<f64> {
    fn from(cycles: Cycles<f64>) -> Self {
        Radians(cycles.0 * 2.0 * std::f64::consts::PI)
    }
}

impl From<Radians<f64>> for Cycles<f64> {
    fn from(radians: Radians<f64>) -> Self {
        Cycles(radians.0 / (2.0 * std::f64::consts::PI))
    }
}

/// The unit in which a duration is expressed: either samples of the backend (`dt`) or an SI
/// unit of seconds.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum TimeUnit {
    #[default]
    #[strum(serialize = "dt")]
    #[serde(rename = "dt")]
    Dt,
    #[strum(serialize = "s")]
    #[serde(rename = "s")]
    Seconds,
    #[strum(serialize = "ms")]
    #[serde(rename = "ms")]
    Milliseconds,
    #[strum(serialize = "us")]
    #[serde(rename = "us")]
    Microseconds,
    #[strum(serialize = "ns")]
    #[serde(rename = "ns")]
    Nanoseconds,
    #[strum(serialize = "ps")]
    #[serde(rename = "ps")]
    Picoseconds,
}

impl TimeUnit {
    /// The number of seconds in one of this unit, or `None` for `dt`, whose length depends on the
    /// backend.
    pub fn seconds(self) -> Option<f64> {
        match self {
            Self::Dt => None,
            Self::Seconds => Some(1.0),
            Self::Milliseconds => Some(1e-3),
            Self::Microseconds => Some(1e-6),
            Self::Nanoseconds => Some(1e-9),
            Self::Picoseconds => Some(1e-12),
        }
    }

    pub fn is_si(self) -> bool {
        self.seconds().is_some()
    }
}

/// A length of time in a given unit.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Duration {
    pub value: f64,
    pub unit: TimeUnit,
}

impl Duration {
    pub fn new(value: f64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    pub fn dt(samples: u64) -> Self {
        Self::new(samples as f64, TimeUnit::Dt)
    }

    /// This duration in seconds, if its unit is an SI one.
    pub fn to_seconds(&self) -> Option<f64> {
        self.unit.seconds().map(|scale| self.value * scale)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("'{0}' is not a duration; expected a number followed by one of dt, s, ms, us, ns, ps")]
pub struct ParseDurationError(String);

impl FromStr for Duration {
    type Err = ParseDurationError;

    /// Parse a duration such as `160dt` or `35.5ns`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .trim_end_matches(|chr: char| chr.is_ascii_alphabetic())
            .len();
        let (value, unit) = trimmed.split_at(split);
        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|_| ParseDurationError(s.to_owned()))?;
        let unit = unit
            .parse::<TimeUnit>()
            .map_err(|_| ParseDurationError(s.to_owned()))?;
        Ok(Self::new(value, unit))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::{Cycles, Duration, Radians, TimeUnit};

    #[test]
    fn phase_units() {
        let radians: Radians<f64> = Cycles(0.25).into();
        assert_relative_eq!(radians.0, PI / 2.0);
        let cycles: Cycles<f64> = Radians(PI).into();
        assert_relative_eq!(cycles.0, 0.5);
    }

    #[rstest]
    #[case("160dt", Duration::new(160.0, TimeUnit::Dt))]
    #[case("35.5ns", Duration::new(35.5, TimeUnit::Nanoseconds))]
    #[case(" 2 us", Duration::new(2.0, TimeUnit::Microseconds))]
    #[case("1e-3s", Duration::new(1e-3, TimeUnit::Seconds))]
    fn parses_durations(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(input.parse::<Duration>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("ns")]
    #[case("10 parsecs")]
    fn rejects_durations(#[case] input: &str) {
        assert!(input.parse::<Duration>().is_err());
    }

    #[test]
    fn si_scales() {
        assert_eq!(TimeUnit::Dt.seconds(), None);
        assert_relative_eq!(Duration::new(20.0, TimeUnit::Nanoseconds).to_seconds().unwrap(), 2e-8);
    }
}
