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

use crate::{pulse::Channel, units::TimeUnit};

use super::device::DeviceInfo;

/// How channels are ordered into charts, from top to bottom.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ChannelLayout {
    /// The channels of each qubit together: `d0, u0, m0, a0, d1, ...`
    #[default]
    IndexGrouped,
    /// Channels of each kind together: `d0, d1, u0, u1, ...`
    TypeGrouped,
}

impl ChannelLayout {
    pub fn order_channels(self, channels: &[Channel]) -> Vec<Channel> {
        let mut ordered = channels.to_vec();
        match self {
            Self::IndexGrouped => ordered.sort_by_key(|channel| (channel.index(), channel.kind())),
            Self::TypeGrouped => ordered.sort(),
        }
        ordered.dedup();
        ordered
    }
}

/// Evenly spaced tick positions between `start` and `end`, at most `count` of them, on multiples
/// of 1, 2 or 5 times a power of ten.
pub fn time_ticks(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 0 || !(end > start) {
        return vec![start];
    }
    let step = nice_step((end - start) / count as f64);
    let first = (start / step).ceil() as i64;
    let last = (end / step).floor() as i64;
    (first..=last).map(|tick| tick as f64 * step).collect()
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Format a time for an axis label or title: whole samples for `dt`, otherwise up to three
/// decimal places.
pub fn format_time(time: f64, unit: TimeUnit) -> String {
    match unit {
        TimeUnit::Dt => format!("{}", time.round() as i64),
        _ => {
            let formatted = format!("{time:.3}");
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
            match trimmed {
                "-0" => "0".to_owned(),
                other => other.to_owned(),
            }
        }
    }
}

pub fn figure_title(name: &str, duration: f64, unit: TimeUnit, device: &DeviceInfo) -> String {
    let mut parts = Vec::new();
    if !name.is_empty() {
        parts.push(format!("Name: {name}"));
    }
    parts.push(format!("Duration: {} {unit}", format_time(duration, unit)));
    if let Some(backend) = &device.name {
        parts.push(format!("Backend: {backend}"));
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{figure_title, format_time, time_ticks, ChannelLayout};
    use crate::pulse::Channel;
    use crate::units::TimeUnit;
    use crate::visualization::pulse::device::DeviceInfo;

    fn channels() -> Vec<Channel> {
        vec![
            Channel::Acquire(0),
            Channel::Drive(1),
            Channel::Control(0),
            Channel::Drive(0),
            Channel::Measure(0),
        ]
    }

    #[test]
    fn index_grouped() {
        let names = ChannelLayout::IndexGrouped
            .order_channels(&channels())
            .iter()
            .map(Channel::to_string)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["d0", "u0", "m0", "a0", "d1"]);
    }

    #[test]
    fn type_grouped() {
        let names = ChannelLayout::TypeGrouped
            .order_channels(&channels())
            .iter()
            .map(Channel::to_string)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["d0", "d1", "u0", "m0", "a0"]);
    }

    #[rstest]
    #[case(0.0, 1000.0, 6, vec![0.0, 200.0, 400.0, 600.0, 800.0, 1000.0])]
    #[case(0.0, 160.0, 6, vec![0.0, 50.0, 100.0, 150.0])]
    #[case(15.0, 45.0, 3, vec![20.0, 30.0, 40.0])]
    fn ticks(#[case] start: f64, #[case] end: f64, #[case] count: usize, #[case] expected: Vec<f64>) {
        assert_eq!(time_ticks(start, end, count), expected);
    }

    #[rstest]
    #[case(160.0, TimeUnit::Dt, "160")]
    #[case(35.55, TimeUnit::Nanoseconds, "35.55")]
    #[case(2.0, TimeUnit::Microseconds, "2")]
    fn times(#[case] time: f64, #[case] unit: TimeUnit, #[case] expected: &str) {
        assert_eq!(format_time(time, unit), expected);
    }

    #[test]
    fn title() {
        let device = DeviceInfo::default().with_name("fake_armonk");
        assert_eq!(
            figure_title("x90", 160.0, TimeUnit::Dt, &device),
            "Name: x90, Duration: 160 dt, Backend: fake_armonk"
        );
        assert_eq!(
            figure_title("", 35.5, TimeUnit::Nanoseconds, &DeviceInfo::default()),
            "Duration: 35.5 ns"
        );
    }
}
