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

//! Pulse schedules: instructions on hardware channels, each starting at a given sample.

mod channel;
mod instruction;
mod schedule;
pub mod waveform;

pub use channel::{Channel, ChannelKind, ParseChannelError};
pub use instruction::PulseInstruction;
pub use schedule::{Schedule, ScheduleItem};
pub use waveform::{Constant, Drag, Gaussian, GaussianSquare, ParametricShape, Waveform, WaveformShape};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PulseError {
    #[error("the amplitude {0} is greater than one")]
    AmplitudeTooLarge(f64),
    #[error("invalid value {value} for the parameter '{name}'")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("'{instruction}' cannot be applied to the channel {channel}")]
    InvalidChannel {
        instruction: &'static str,
        channel: Channel,
    },
    #[error("an instruction at time {t0} overlaps the instruction on {channel} from {existing_start} to {existing_stop}")]
    Overlap {
        channel: Channel,
        t0: u64,
        existing_start: u64,
        existing_stop: u64,
    },
    #[error("an instruction of duration {duration} starting at {t0} ends past the last representable time")]
    TimeOverflow { t0: u64, duration: u64 },
}
