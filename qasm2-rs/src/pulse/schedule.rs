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

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Channel, PulseError, PulseInstruction};

/// An instruction and the time, in samples, at which it starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub t0: u64,
    pub instruction: PulseInstruction,
}

impl ScheduleItem {
    /// Saturates for items which never passed through [`Schedule::insert`].
    pub fn stop_time(&self) -> u64 {
        self.t0.saturating_add(self.instruction.duration())
    }

    /// Whether this item and `other` both take time and share a channel during it.
    fn overlaps(&self, other: &ScheduleItem) -> Option<Channel> {
        if self.instruction.duration() == 0 || other.instruction.duration() == 0 {
            return None;
        }
        if self.t0 >= other.stop_time() || other.t0 >= self.stop_time() {
            return None;
        }
        let channels = other.instruction.channels();
        self.instruction
            .channels()
            .into_iter()
            .find(|channel| channels.contains(channel))
    }
}

#[derive(Deserialize)]
struct RawSchedule {
    #[serde(default)]
    name: String,
    #[serde(default)]
    items: Vec<ScheduleItem>,
}

impl TryFrom<RawSchedule> for Schedule {
    type Error = PulseError;

    fn try_from(raw: RawSchedule) -> Result<Self, Self::Error> {
        Schedule::from_items(raw.name, raw.items)
    }
}

/// A timed sequence of pulse instructions. Items are kept ordered by start time, and no two
/// items which take time overlap on a channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule")]
pub struct Schedule {
    pub name: String,
    items: Vec<ScheduleItem>,
}

impl Schedule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn from_items(
        name: impl Into<String>,
        items: impl IntoIterator<Item = ScheduleItem>,
    ) -> Result<Self, PulseError> {
        let mut schedule = Self::new(name);
        for item in items {
            schedule.insert(item.t0, item.instruction)?;
        }
        Ok(schedule)
    }

    pub fn items(&self) -> &[ScheduleItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert an instruction starting at `t0`.
    ///
    /// # Errors
    ///
    /// Fails if the instruction is invalid, ends past `u64::MAX`, or would overlap an existing
    /// instruction on one of its channels.
    pub fn insert(&mut self, t0: u64, instruction: PulseInstruction) -> Result<(), PulseError> {
        instruction.validate()?;
        let duration = instruction.duration();
        if t0.checked_add(duration).is_none() {
            return Err(PulseError::TimeOverflow { t0, duration });
        }
        let item = ScheduleItem { t0, instruction };
        for existing in &self.items {
            if let Some(channel) = item.overlaps(existing) {
                return Err(PulseError::Overlap {
                    channel,
                    t0,
                    existing_start: existing.t0,
                    existing_stop: existing.stop_time(),
                });
            }
        }
        let position = self.items.partition_point(|existing| existing.t0 <= t0);
        self.items.insert(position, item);
        Ok(())
    }

    /// Insert an instruction once everything already scheduled on its channels has finished,
    /// returning the time it starts.
    pub fn append(&mut self, instruction: PulseInstruction) -> Result<u64, PulseError> {
        let t0 = self.stop_time(&instruction.channels());
        self.insert(t0, instruction)?;
        Ok(t0)
    }

    /// The time at which the last instruction finishes.
    pub fn duration(&self) -> u64 {
        self.items
            .iter()
            .map(ScheduleItem::stop_time)
            .max()
            .unwrap_or(0)
    }

    /// Every channel used by the schedule, in order.
    pub fn channels(&self) -> Vec<Channel> {
        self.items
            .iter()
            .flat_map(|item| item.instruction.channels())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The time at which the last instruction on any of `channels` finishes.
    pub fn stop_time(&self, channels: &[Channel]) -> u64 {
        self.items_on(channels)
            .map(ScheduleItem::stop_time)
            .max()
            .unwrap_or(0)
    }

    /// The time at which the first instruction on any of `channels` starts.
    pub fn start_time(&self, channels: &[Channel]) -> u64 {
        self.items_on(channels)
            .map(|item| item.t0)
            .min()
            .unwrap_or(0)
    }

    fn items_on<'a>(&'a self, channels: &'a [Channel]) -> impl Iterator<Item = &'a ScheduleItem> {
        self.items.iter().filter(move |item| {
            item.instruction
                .channels()
                .iter()
                .any(|channel| channels.contains(channel))
        })
    }

    /// The part of this schedule on `channels`. Barriers keep only the channels selected.
    pub fn filter(&self, channels: &[Channel]) -> Schedule {
        let items = self
            .items_on(channels)
            .map(|item| match &item.instruction {
                PulseInstruction::Barrier { channels: barrier } => ScheduleItem {
                    t0: item.t0,
                    instruction: PulseInstruction::Barrier {
                        channels: barrier
                            .iter()
                            .filter(|channel| channels.contains(channel))
                            .copied()
                            .collect(),
                    },
                },
                _ => item.clone(),
            })
            .collect();
        Schedule {
            name: self.name.clone(),
            items,
        }
    }

    /// This schedule delayed by `time` samples.
    ///
    /// # Errors
    ///
    /// Fails with [`PulseError::TimeOverflow`] if an instruction would end past `u64::MAX`.
    pub fn shift(&self, time: u64) -> Result<Schedule, PulseError> {
        let items = self
            .items
            .iter()
            .map(|item| {
                let duration = item.instruction.duration();
                item.t0
                    .checked_add(time)
                    .filter(|t0| t0.checked_add(duration).is_some())
                    .map(|t0| ScheduleItem {
                        t0,
                        instruction: item.instruction.clone(),
                    })
                    .ok_or(PulseError::TimeOverflow {
                        t0: item.t0.saturating_add(time),
                        duration,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Schedule {
            name: self.name.clone(),
            items,
        })
    }
}
