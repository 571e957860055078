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

use serde::{Deserialize, Serialize};

use super::{Channel, ChannelKind, PulseError, Waveform};

/// An instruction in a pulse schedule. Times are in samples (`dt`), phases in radians and
/// frequencies in Hz.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PulseInstruction {
    Play {
        waveform: Waveform,
        channel: Channel,
    },
    Delay {
        duration: u64,
        channel: Channel,
    },
    ShiftPhase {
        phase: f64,
        channel: Channel,
    },
    SetPhase {
        phase: f64,
        channel: Channel,
    },
    ShiftFrequency {
        frequency: f64,
        channel: Channel,
    },
    SetFrequency {
        frequency: f64,
        channel: Channel,
    },
    Acquire {
        duration: u64,
        channel: Channel,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mem_slot: Option<u32>,
    },
    Barrier {
        channels: Vec<Channel>,
    },
}

impl PulseInstruction {
    pub fn play(waveform: impl Into<Waveform>, channel: Channel) -> Self {
        Self::Play {
            waveform: waveform.into(),
            channel,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Play { .. } => "play",
            Self::Delay { .. } => "delay",
            Self::ShiftPhase { .. } => "shift_phase",
            Self::SetPhase { .. } => "set_phase",
            Self::ShiftFrequency { .. } => "shift_frequency",
            Self::SetFrequency { .. } => "set_frequency",
            Self::Acquire { .. } => "acquire",
            Self::Barrier { .. } => "barrier",
        }
    }

    /// Length of the instruction in samples. Phase, frequency and barrier instructions take no
    /// time.
    pub fn duration(&self) -> u64 {
        match self {
            Self::Play { waveform, .. } => waveform.duration(),
            Self::Delay { duration, .. } | Self::Acquire { duration, .. } => *duration,
            Self::ShiftPhase { .. }
            | Self::SetPhase { .. }
            | Self::ShiftFrequency { .. }
            | Self::SetFrequency { .. }
            | Self::Barrier { .. } => 0,
        }
    }

    pub fn channels(&self) -> Vec<Channel> {
        match self {
            Self::Play { channel, .. }
            | Self::Delay { channel, .. }
            | Self::ShiftPhase { channel, .. }
            | Self::SetPhase { channel, .. }
            | Self::ShiftFrequency { channel, .. }
            | Self::SetFrequency { channel, .. }
            | Self::Acquire { channel, .. } => vec![*channel],
            Self::Barrier { channels } => channels.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), PulseError> {
        match self {
            Self::Play { waveform, channel } => {
                if channel.kind() == ChannelKind::Acquire {
                    return Err(PulseError::InvalidChannel {
                        instruction: self.name(),
                        channel: *channel,
                    });
                }
                waveform.validate()
            }
            Self::Acquire { channel, .. } if channel.kind() != ChannelKind::Acquire => {
                Err(PulseError::InvalidChannel {
                    instruction: self.name(),
                    channel: *channel,
                })
            }
            Self::ShiftPhase { phase, .. } | Self::SetPhase { phase, .. } if !phase.is_finite() => {
                Err(PulseError::InvalidParameter {
                    name: "phase",
                    value: *phase,
                })
            }
            Self::ShiftFrequency { frequency, .. } | Self::SetFrequency { frequency, .. }
                if !frequency.is_finite() =>
            {
                Err(PulseError::InvalidParameter {
                    name: "frequency",
                    value: *frequency,
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::PulseInstruction;
    use crate::pulse::{Channel, Constant, PulseError};

    #[test]
    fn durations_and_channels() {
        let play = PulseInstruction::play(
            Constant {
                duration: 32,
                amp: 0.1,
                angle: 0.0,
            },
            Channel::Drive(0),
        );
        assert_eq!(play.duration(), 32);
        assert_eq!(play.channels(), vec![Channel::Drive(0)]);

        let shift = PulseInstruction::ShiftPhase {
            phase: 1.0,
            channel: Channel::Control(1),
        };
        assert_eq!(shift.duration(), 0);

        let barrier = PulseInstruction::Barrier {
            channels: vec![Channel::Drive(0), Channel::Measure(0)],
        };
        assert_eq!(barrier.channels().len(), 2);
    }

    #[test]
    fn channel_kinds_are_checked() {
        let acquire = PulseInstruction::Acquire {
            duration: 100,
            channel: Channel::Measure(0),
            mem_slot: None,
        };
        assert_eq!(
            acquire.validate(),
            Err(PulseError::InvalidChannel {
                instruction: "acquire",
                channel: Channel::Measure(0)
            })
        );
        let play = PulseInstruction::play(
            Constant {
                duration: 4,
                amp: 0.1,
                angle: 0.0,
            },
            Channel::Acquire(0),
        );
        assert!(play.validate().is_err());
    }

    #[test]
    fn serde_tags() {
        let instruction: PulseInstruction = serde_json::from_str(
            r#"{"type": "set_frequency", "frequency": 5.1e9, "channel": "d3"}"#,
        )
        .unwrap();
        assert_eq!(
            instruction,
            PulseInstruction::SetFrequency {
                frequency: 5.1e9,
                channel: Channel::Drive(3)
            }
        );
        insta::assert_snapshot!(
            serde_json::to_string(&PulseInstruction::Delay { duration: 16, channel: Channel::Drive(0) }).unwrap(),
            @r###"{"type":"delay","duration":16,"channel":"d0"}"###
        );
    }
}
