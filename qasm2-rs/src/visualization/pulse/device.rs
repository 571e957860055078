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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pulse::Channel;

/// What the drawer knows about the backend a schedule runs on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub name: Option<String>,
    /// The length of one sample, in seconds. Needed to draw times in seconds.
    #[serde(default)]
    pub dt: Option<f64>,
    /// The initial frequency of each channel, in Hz.
    #[serde(default)]
    pub channel_frequencies: BTreeMap<Channel, f64>,
}

impl DeviceInfo {
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_frequency(mut self, channel: Channel, frequency: f64) -> Self {
        self.channel_frequencies.insert(channel, frequency);
        self
    }

    pub fn frequency(&self, channel: Channel) -> Option<f64> {
        self.channel_frequencies.get(&channel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::DeviceInfo;
    use crate::pulse::Channel;

    #[test]
    fn deserializes_frequencies_by_channel_name() {
        let device: DeviceInfo = serde_json::from_str(
            r#"{"name": "fake", "dt": 2.2e-10, "channel_frequencies": {"d0": 5.1e9}}"#,
        )
        .unwrap();
        assert_eq!(device.frequency(Channel::Drive(0)), Some(5.1e9));
        assert_eq!(device.frequency(Channel::Drive(1)), None);
        assert_eq!(device.dt, Some(2.2e-10));
    }
}
