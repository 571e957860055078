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

use std::collections::HashSet;

use tracing::debug;

use crate::{
    circuit::{Circuit, Operation},
    units::{Duration, TimeUnit},
};

use super::{InstructionDurations, SchedulingError, UnitFamily};

/// Choose the time unit used by later timing-aware passes, and bring every delay in a circuit
/// into that unit.
///
/// If `dt` is known the unit is `dt`. Otherwise it depends on the units of the circuit's delays
/// and of the known instruction durations: `dt` if they all use `dt` (or there are none), `s` if
/// they all use SI units. A mixture of the two cannot be reconciled without `dt` and is an error.
///
/// Every instruction whose duration is known is annotated with it, in the chosen unit. Durations
/// given to the pass take priority over those of the circuit's own calibrations, which are in
/// `dt`.
#[derive(Clone, Debug, Default)]
pub struct TimeUnitConversion {
    durations: InstructionDurations,
}

impl TimeUnitConversion {
    pub fn new(durations: InstructionDurations) -> Self {
        Self { durations }
    }

    /// Choose a unit without modifying the circuit.
    pub fn choose_unit(&self, circuit: &Circuit) -> Result<TimeUnit, SchedulingError> {
        if self.durations.dt.is_some() {
            return Ok(TimeUnit::Dt);
        }

        let delay_units = circuit
            .instructions()
            .iter()
            .filter_map(|instruction| match instruction.operation {
                Operation::Delay(duration) => Some(duration.unit),
                _ => None,
            })
            .collect::<HashSet<_>>();
        if UnitFamily::of(&delay_units) == UnitFamily::Mixed {
            return Err(SchedulingError::MixedDelayUnits);
        }
        let mut duration_units = self.durations.units_used();
        if !circuit.calibrations().is_empty() {
            duration_units.insert(TimeUnit::Dt);
        }
        if UnitFamily::of(&duration_units) == UnitFamily::Mixed {
            return Err(SchedulingError::MixedDurationUnits);
        }

        let all_units = delay_units.union(&duration_units).copied().collect();
        match UnitFamily::of(&all_units) {
            UnitFamily::Dt => Ok(TimeUnit::Dt),
            UnitFamily::Si => Ok(TimeUnit::Seconds),
            UnitFamily::Mixed => Err(SchedulingError::MixedUnits),
        }
    }

    /// Convert the circuit's delays to a single unit and annotate its instructions with their
    /// durations, returning the unit chosen.
    pub fn run(&self, circuit: &mut Circuit) -> Result<TimeUnit, SchedulingError> {
        let unit = self.choose_unit(circuit)?;
        let calibrated = circuit
            .instructions()
            .iter()
            .map(|instruction| {
                circuit
                    .instruction_calibration(instruction)
                    .map(|schedule| Duration::dt(schedule.duration()))
            })
            .collect::<Vec<_>>();
        let mut annotated = 0usize;
        for (instruction, calibrated) in circuit.instructions_mut().iter_mut().zip(calibrated) {
            let duration = match instruction.operation {
                Operation::Delay(duration) => {
                    let converted = self.durations.convert(duration, unit)?;
                    instruction.operation = Operation::Delay(converted);
                    Some(converted)
                }
                _ => self
                    .durations
                    .get(instruction.operation.name(), &instruction.qubits)
                    .or(calibrated)
                    .map(|duration| self.durations.convert(duration, unit))
                    .transpose()?,
            };
            if duration.is_some() {
                annotated += 1;
            }
            instruction.duration = duration;
        }
        debug!(%unit, annotated, "converted circuit time units");
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::TimeUnitConversion;
    use crate::circuit::{Circuit, CircuitInstruction, Operation};
    use crate::pulse::{Channel, Constant, PulseInstruction, Schedule};
    use crate::scheduling::{InstructionDurations, SchedulingError};
    use crate::units::{Duration, TimeUnit};

    fn circuit_with_delays(delays: &[Duration]) -> Circuit {
        let mut circuit = Circuit::new();
        circuit.add_qreg("q", 2).unwrap();
        circuit
            .append(CircuitInstruction::gate("cx", vec![], vec![0, 1]))
            .unwrap();
        for &delay in delays {
            circuit.delay(delay, [0]).unwrap();
        }
        circuit
    }

    fn delays(circuit: &Circuit) -> Vec<Duration> {
        circuit
            .instructions()
            .iter()
            .filter_map(|instruction| match instruction.operation {
                Operation::Delay(duration) => Some(duration),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn known_dt_converts_to_samples() {
        let durations = InstructionDurations::new()
            .with_dt(1e-9)
            .with_duration("cx", None, Duration::new(0.3, TimeUnit::Microseconds))
            .unwrap();
        let mut circuit = circuit_with_delays(&[
            Duration::new(100.0, TimeUnit::Nanoseconds),
            Duration::dt(7),
        ]);

        let unit = TimeUnitConversion::new(durations).run(&mut circuit).unwrap();

        assert_eq!(unit, TimeUnit::Dt);
        assert_eq!(delays(&circuit), vec![Duration::dt(100), Duration::dt(7)]);
        assert_eq!(circuit.instructions()[0].duration, Some(Duration::dt(300)));
        assert_eq!(circuit.instructions()[1].duration, Some(Duration::dt(100)));
    }

    #[test]
    fn si_units_become_seconds() {
        let durations = InstructionDurations::new()
            .with_duration("cx", Some(vec![0, 1]), Duration::new(300.0, TimeUnit::Nanoseconds))
            .unwrap();
        let mut circuit = circuit_with_delays(&[Duration::new(2.0, TimeUnit::Microseconds)]);

        let unit = TimeUnitConversion::new(durations).run(&mut circuit).unwrap();

        assert_eq!(unit, TimeUnit::Seconds);
        approx::assert_relative_eq!(delays(&circuit)[0].value, 2e-6);
        approx::assert_relative_eq!(circuit.instructions()[0].duration.unwrap().value, 3e-7);
    }

    #[test]
    fn unknown_durations_are_left_unset() {
        let mut circuit = circuit_with_delays(&[Duration::dt(5)]);
        let unit = TimeUnitConversion::default().run(&mut circuit).unwrap();
        assert_eq!(unit, TimeUnit::Dt);
        assert_eq!(circuit.instructions()[0].duration, None);
        assert_eq!(circuit.instructions()[1].duration, Some(Duration::dt(5)));
    }

    #[rstest]
    #[case(
        &[Duration::dt(5), Duration::new(1.0, TimeUnit::Nanoseconds)],
        None,
        SchedulingError::MixedDelayUnits
    )]
    #[case(
        &[],
        Some(vec![("x", Duration::dt(5)), ("sx", Duration::new(1.0, TimeUnit::Nanoseconds))]),
        SchedulingError::MixedDurationUnits
    )]
    #[case(
        &[Duration::dt(5)],
        Some(vec![("x", Duration::new(1.0, TimeUnit::Nanoseconds))]),
        SchedulingError::MixedUnits
    )]
    fn mixed_units_without_dt(
        #[case] delays: &[Duration],
        #[case] known: Option<Vec<(&str, Duration)>>,
        #[case] expected: SchedulingError,
    ) {
        let mut durations = InstructionDurations::new();
        for (name, duration) in known.unwrap_or_default() {
            durations.insert(name, None, duration).unwrap();
        }
        let mut circuit = circuit_with_delays(delays);
        assert_eq!(
            TimeUnitConversion::new(durations).run(&mut circuit),
            Err(expected)
        );
    }

    fn calibration(duration: u64) -> Schedule {
        let mut schedule = Schedule::new("cx");
        schedule
            .append(PulseInstruction::play(
                Constant {
                    duration,
                    amp: 0.1,
                    angle: 0.0,
                },
                Channel::Control(0),
            ))
            .unwrap();
        schedule
    }

    #[test]
    fn calibrations_give_durations() {
        let mut circuit = circuit_with_delays(&[Duration::dt(5)]);
        circuit
            .add_calibration("cx", vec![0, 1], vec![], calibration(1000))
            .unwrap();
        // A calibration on other qubits does not apply.
        circuit
            .append(CircuitInstruction::gate("cx", vec![], vec![1, 0]))
            .unwrap();

        let unit = TimeUnitConversion::default().run(&mut circuit).unwrap();

        assert_eq!(unit, TimeUnit::Dt);
        assert_eq!(circuit.instructions()[0].duration, Some(Duration::dt(1000)));
        assert_eq!(circuit.instructions()[2].duration, None);
    }

    #[test]
    fn given_durations_override_calibrations() {
        let mut circuit = circuit_with_delays(&[]);
        circuit
            .add_calibration("cx", vec![0, 1], vec![], calibration(1000))
            .unwrap();
        let durations = InstructionDurations::new()
            .with_duration("cx", Some(vec![0, 1]), Duration::dt(300))
            .unwrap();

        TimeUnitConversion::new(durations).run(&mut circuit).unwrap();
        assert_eq!(circuit.instructions()[0].duration, Some(Duration::dt(300)));
    }

    #[test]
    fn calibrations_are_in_dt() {
        let mut circuit = circuit_with_delays(&[]);
        circuit
            .add_calibration("cx", vec![0, 1], vec![], calibration(1000))
            .unwrap();
        let durations = InstructionDurations::new()
            .with_duration("x", None, Duration::new(1.0, TimeUnit::Nanoseconds))
            .unwrap();
        assert_eq!(
            TimeUnitConversion::new(durations).run(&mut circuit),
            Err(SchedulingError::MixedDurationUnits)
        );

        let durations = InstructionDurations::new()
            .with_dt(2e-9)
            .with_duration("x", None, Duration::new(20.0, TimeUnit::Nanoseconds))
            .unwrap();
        assert_eq!(
            TimeUnitConversion::new(durations).run(&mut circuit),
            Ok(TimeUnit::Dt)
        );
        assert_eq!(circuit.instructions()[0].duration, Some(Duration::dt(1000)));
    }
}
