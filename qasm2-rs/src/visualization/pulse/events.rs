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

//! The events of a schedule, gathered by channel: waveforms, frame changes, and barriers.

use std::collections::BTreeMap;

use num_complex::Complex64;

use crate::pulse::{Channel, PulseInstruction, Schedule};

/// Something drawn as a filled envelope: a played waveform or an acquisition window.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformEvent {
    pub t0: u64,
    pub channel: Channel,
    pub name: String,
    pub samples: Vec<Complex64>,
    pub parameters: Vec<(&'static str, f64)>,
    pub is_acquire: bool,
}

impl WaveformEvent {
    pub fn duration(&self) -> u64 {
        self.samples.len() as u64
    }
}

/// The combined effect of all frame instructions on a channel at one time.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameEvent {
    pub t0: u64,
    pub channel: Channel,
    /// Change in phase, in radians
    pub phase_shift: f64,
    /// Change in frequency, in Hz
    pub frequency_shift: f64,
    /// Phase after the change
    pub phase: f64,
    /// Frequency after the change
    pub frequency: f64,
    /// How many instructions were merged into this event.
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarrierEvent {
    pub t0: u64,
    pub channels: Vec<Channel>,
}

/// The events on a single channel, in time order.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelEvents {
    pub channel: Channel,
    pub waveforms: Vec<WaveformEvent>,
    pub frames: Vec<FrameEvent>,
}

impl ChannelEvents {
    /// Gather the events of `channel`, whose frame starts at `initial_frequency`.
    pub fn from_schedule(schedule: &Schedule, channel: Channel, initial_frequency: f64) -> Self {
        let mut waveforms = Vec::new();
        let mut frame_changes: BTreeMap<u64, Vec<&PulseInstruction>> = BTreeMap::new();

        for item in schedule.items() {
            match &item.instruction {
                PulseInstruction::Play {
                    waveform,
                    channel: target,
                } if *target == channel => waveforms.push(WaveformEvent {
                    t0: item.t0,
                    channel,
                    name: waveform.display_name().to_owned(),
                    samples: waveform.samples(),
                    parameters: waveform.parameters(),
                    is_acquire: false,
                }),
                PulseInstruction::Acquire {
                    duration,
                    channel: target,
                    mem_slot,
                } if *target == channel => waveforms.push(WaveformEvent {
                    t0: item.t0,
                    channel,
                    name: match mem_slot {
                        Some(slot) => format!("Acquire(m{slot})"),
                        None => "Acquire".to_owned(),
                    },
                    samples: vec![Complex64::new(1.0, 0.0); *duration as usize],
                    parameters: vec![("duration", *duration as f64)],
                    is_acquire: true,
                }),
                PulseInstruction::ShiftPhase { channel: target, .. }
                | PulseInstruction::SetPhase { channel: target, .. }
                | PulseInstruction::ShiftFrequency { channel: target, .. }
                | PulseInstruction::SetFrequency { channel: target, .. }
                    if *target == channel =>
                {
                    frame_changes
                        .entry(item.t0)
                        .or_default()
                        .push(&item.instruction);
                }
                _ => {}
            }
        }

        let mut phase = 0.0;
        let mut frequency = initial_frequency;
        let frames = frame_changes
            .into_iter()
            .map(|(t0, instructions)| {
                let (start_phase, start_frequency) = (phase, frequency);
                for instruction in &instructions {
                    match instruction {
                        PulseInstruction::ShiftPhase { phase: shift, .. } => phase += shift,
                        PulseInstruction::SetPhase { phase: value, .. } => phase = *value,
                        PulseInstruction::ShiftFrequency {
                            frequency: shift, ..
                        } => frequency += shift,
                        PulseInstruction::SetFrequency {
                            frequency: value, ..
                        } => frequency = *value,
                        _ => {}
                    }
                }
                FrameEvent {
                    t0,
                    channel,
                    phase_shift: phase - start_phase,
                    frequency_shift: frequency - start_frequency,
                    phase,
                    frequency,
                    count: instructions.len(),
                }
            })
            .collect();

        Self {
            channel,
            waveforms,
            frames,
        }
    }

    /// Whether nothing visible happens on the channel.
    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty() && self.frames.is_empty()
    }

    /// The largest magnitude of any real or imaginary part of a sample.
    pub fn max_amplitude(&self) -> f64 {
        self.waveforms
            .iter()
            .flat_map(|event| event.samples.iter())
            .map(|sample| sample.re.abs().max(sample.im.abs()))
            .fold(0.0, f64::max)
    }
}

pub fn barriers(schedule: &Schedule) -> Vec<BarrierEvent> {
    schedule
        .items()
        .iter()
        .filter_map(|item| match &item.instruction {
            PulseInstruction::Barrier { channels } => Some(BarrierEvent {
                t0: item.t0,
                channels: channels.clone(),
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    use super::{barriers, ChannelEvents};
    use crate::pulse::{Channel, Constant, PulseInstruction, Schedule};

    fn schedule() -> Schedule {
        let mut schedule = Schedule::new("events");
        let d0 = Channel::Drive(0);
        schedule
            .insert(0, PulseInstruction::ShiftPhase { phase: 1.0, channel: d0 })
            .unwrap();
        schedule
            .insert(0, PulseInstruction::ShiftPhase { phase: 0.5, channel: d0 })
            .unwrap();
        schedule
            .insert(0, PulseInstruction::ShiftFrequency { frequency: 1e6, channel: d0 })
            .unwrap();
        schedule
            .append(PulseInstruction::play(
                Constant { duration: 10, amp: 0.4, angle: 0.0 },
                d0,
            ))
            .unwrap();
        schedule
            .append(PulseInstruction::SetPhase { phase: 0.25, channel: d0 })
            .unwrap();
        schedule
            .append(PulseInstruction::Barrier { channels: vec![d0, Channel::Acquire(0)] })
            .unwrap();
        schedule
            .insert(
                0,
                PulseInstruction::Acquire { duration: 5, channel: Channel::Acquire(0), mem_slot: Some(2) },
            )
            .unwrap();
        schedule
    }

    #[test]
    fn frame_changes_at_one_time_are_merged() {
        let events = ChannelEvents::from_schedule(&schedule(), Channel::Drive(0), 5e9);
        assert_eq!(events.frames.len(), 2);

        let first = &events.frames[0];
        assert_eq!((first.t0, first.count), (0, 3));
        assert_relative_eq!(first.phase_shift, 1.5);
        assert_relative_eq!(first.frequency_shift, 1e6);
        assert_relative_eq!(first.frequency, 5.001e9);

        let second = &events.frames[1];
        assert_eq!(second.t0, 10);
        assert_relative_eq!(second.phase_shift, -1.25);
        assert_relative_eq!(second.phase, 0.25);
    }

    #[test]
    fn waveforms_and_acquisitions() {
        let schedule = schedule();
        let drive = ChannelEvents::from_schedule(&schedule, Channel::Drive(0), 0.0);
        assert_eq!(drive.waveforms.len(), 1);
        assert_eq!(drive.waveforms[0].name, "Constant");
        assert_relative_eq!(drive.max_amplitude(), 0.4);

        let acquire = ChannelEvents::from_schedule(&schedule, Channel::Acquire(0), 0.0);
        assert!(acquire.waveforms[0].is_acquire);
        assert_eq!(acquire.waveforms[0].name, "Acquire(m2)");
        assert_eq!(acquire.waveforms[0].duration(), 5);

        assert!(ChannelEvents::from_schedule(&schedule, Channel::Drive(1), 0.0).is_empty());
    }

    #[test]
    fn barrier_events() {
        let barriers = barriers(&schedule());
        assert_eq!(barriers.len(), 1);
        assert_eq!(barriers[0].t0, 10);
    }
}
