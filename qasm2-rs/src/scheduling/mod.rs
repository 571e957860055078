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

//! Instruction durations and the passes which make a circuit's timing consistent.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::units::{Duration, TimeUnit};

mod time_unit_conversion;

pub use time_unit_conversion::TimeUnitConversion;

/// Rounding SI durations to whole samples is reported when it moves them by more than this many
/// seconds.
const ROUNDING_TOLERANCE_SECONDS: f64 = 1e-15;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    #[error("failed to unify time units in delays: SI units and dt must not be mixed when dt is not supplied")]
    MixedDelayUnits,
    #[error("failed to unify time units in instruction durations: SI units and dt must not be mixed when dt is not supplied")]
    MixedDurationUnits,
    #[error("failed to unify time units: SI units and dt must not be mixed when dt is not supplied")]
    MixedUnits,
    #[error("dt is necessary to convert durations from '{from}' to '{to}'")]
    MissingDt { from: TimeUnit, to: TimeUnit },
    #[error("the duration {0} is negative or not finite")]
    InvalidDuration(Duration),
}

/// The durations of instructions on a backend, optionally per set of qubits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstructionDurations {
    /// The length of one sample of the backend, in seconds.
    pub dt: Option<f64>,
    durations: HashMap<(String, Option<Vec<usize>>), Duration>,
}

impl InstructionDurations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    /// Set the duration of `name` on exactly `qubits`, or on any qubits when `qubits` is `None`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        qubits: Option<Vec<usize>>,
        duration: Duration,
    ) -> Result<(), SchedulingError> {
        if !duration.value.is_finite() || duration.value < 0.0 {
            return Err(SchedulingError::InvalidDuration(duration));
        }
        self.durations.insert((name.into(), qubits), duration);
        Ok(())
    }

    pub fn with_duration(
        mut self,
        name: impl Into<String>,
        qubits: Option<Vec<usize>>,
        duration: Duration,
    ) -> Result<Self, SchedulingError> {
        self.insert(name, qubits, duration)?;
        Ok(self)
    }

    /// The duration of `name` on `qubits`, preferring an entry for exactly those qubits over one
    /// for any qubits.
    pub fn get(&self, name: &str, qubits: &[usize]) -> Option<Duration> {
        self.durations
            .get(&(name.to_owned(), Some(qubits.to_vec())))
            .or_else(|| self.durations.get(&(name.to_owned(), None)))
            .copied()
    }

    pub fn units_used(&self) -> HashSet<TimeUnit> {
        self.durations.values().map(|duration| duration.unit).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Express `duration` in the unit `to`.
    ///
    /// Converting between `dt` and an SI unit needs [`dt`](Self::dt). SI durations are rounded to
    /// the nearest whole sample, with a warning if that changes them.
    pub fn convert(&self, duration: Duration, to: TimeUnit) -> Result<Duration, SchedulingError> {
        if duration.unit == to {
            return Ok(duration);
        }
        match (duration.to_seconds(), to.seconds()) {
            (Some(seconds), Some(scale)) => Ok(Duration::new(seconds / scale, to)),
            (Some(seconds), None) => {
                let dt = self.dt.ok_or(SchedulingError::MissingDt {
                    from: duration.unit,
                    to,
                })?;
                let samples = (seconds / dt).round();
                let rounding_error = (seconds - samples * dt).abs();
                if rounding_error > ROUNDING_TOLERANCE_SECONDS {
                    warn!(
                        %duration,
                        samples,
                        rounding_error,
                        "duration is not a whole number of samples and has been rounded"
                    );
                }
                Ok(Duration::new(samples, TimeUnit::Dt))
            }
            (None, Some(scale)) => {
                let dt = self.dt.ok_or(SchedulingError::MissingDt {
                    from: duration.unit,
                    to,
                })?;
                Ok(Duration::new(duration.value * dt / scale, to))
            }
            (None, None) => Ok(duration),
        }
    }
}

/// How a set of time units can be reconciled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnitFamily {
    Dt,
    Si,
    Mixed,
}

impl UnitFamily {
    pub(crate) fn of(units: &HashSet<TimeUnit>) -> Self {
        if units.iter().all(|unit| *unit == TimeUnit::Dt) {
            Self::Dt
        } else if units.iter().all(|unit| unit.is_si()) {
            Self::Si
        } else {
            Self::Mixed
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::{InstructionDurations, SchedulingError, UnitFamily};
    use crate::units::{Duration, TimeUnit};

    #[test]
    fn specific_qubits_take_precedence() {
        let durations = InstructionDurations::new()
            .with_duration("cx", None, Duration::dt(300))
            .unwrap()
            .with_duration("cx", Some(vec![1, 0]), Duration::dt(400))
            .unwrap();
        assert_eq!(durations.get("cx", &[1, 0]), Some(Duration::dt(400)));
        assert_eq!(durations.get("cx", &[0, 1]), Some(Duration::dt(300)));
        assert_eq!(durations.get("x", &[0]), None);
    }

    #[test]
    fn rejects_negative_durations() {
        let mut durations = InstructionDurations::new();
        assert!(matches!(
            durations.insert("x", None, Duration::new(-1.0, TimeUnit::Dt)),
            Err(SchedulingError::InvalidDuration(_))
        ));
    }

    #[rstest]
    #[case(&[], UnitFamily::Dt)]
    #[case(&[TimeUnit::Dt], UnitFamily::Dt)]
    #[case(&[TimeUnit::Nanoseconds, TimeUnit::Seconds], UnitFamily::Si)]
    #[case(&[TimeUnit::Dt, TimeUnit::Microseconds], UnitFamily::Mixed)]
    fn unit_families(#[case] units: &[TimeUnit], #[case] expected: UnitFamily) {
        let units = units.iter().copied().collect::<HashSet<_>>();
        assert_eq!(UnitFamily::of(&units), expected);
    }

    #[test]
    fn conversions() {
        let durations = InstructionDurations::new().with_dt(2e-9);
        let converted = durations
            .convert(Duration::new(100.0, TimeUnit::Nanoseconds), TimeUnit::Dt)
            .unwrap();
        assert_eq!(converted, Duration::dt(50));

        let converted = durations
            .convert(Duration::dt(50), TimeUnit::Microseconds)
            .unwrap();
        assert_relative_eq!(converted.value, 0.1);

        let converted = durations
            .convert(Duration::new(1.5, TimeUnit::Milliseconds), TimeUnit::Seconds)
            .unwrap();
        assert_relative_eq!(converted.value, 1.5e-3);
    }

    #[test]
    fn rounds_to_whole_samples() {
        let durations = InstructionDurations::new().with_dt(2e-9);
        let converted = durations
            .convert(Duration::new(101.2, TimeUnit::Nanoseconds), TimeUnit::Dt)
            .unwrap();
        assert_eq!(converted, Duration::dt(51));
    }

    #[test]
    fn conversion_needs_dt() {
        assert_eq!(
            InstructionDurations::new().convert(Duration::dt(10), TimeUnit::Seconds),
            Err(SchedulingError::MissingDt {
                from: TimeUnit::Dt,
                to: TimeUnit::Seconds
            })
        );
    }
}
