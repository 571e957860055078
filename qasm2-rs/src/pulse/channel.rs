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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The kind of hardware signal a channel carries.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Drive,
    Control,
    Measure,
    Acquire,
}

impl ChannelKind {
    pub fn prefix(self) -> char {
        match self {
            Self::Drive => 'd',
            Self::Control => 'u',
            Self::Measure => 'm',
            Self::Acquire => 'a',
        }
    }

    fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'd' => Some(Self::Drive),
            'u' => Some(Self::Control),
            'm' => Some(Self::Measure),
            'a' => Some(Self::Acquire),
            _ => None,
        }
    }
}

/// A channel of the backend, written `d0`, `u0`, `m0` or `a0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Channel {
    Drive(u32),
    Control(u32),
    Measure(u32),
    Acquire(u32),
}

impl Channel {
    pub fn new(kind: ChannelKind, index: u32) -> Self {
        match kind {
            ChannelKind::Drive => Self::Drive(index),
            ChannelKind::Control => Self::Control(index),
            ChannelKind::Measure => Self::Measure(index),
            ChannelKind::Acquire => Self::Acquire(index),
        }
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            Self::Drive(_) => ChannelKind::Drive,
            Self::Control(_) => ChannelKind::Control,
            Self::Measure(_) => ChannelKind::Measure,
            Self::Acquire(_) => ChannelKind::Acquire,
        }
    }

    pub fn index(&self) -> u32 {
        match self {
            Self::Drive(index)
            | Self::Control(index)
            | Self::Measure(index)
            | Self::Acquire(index) => *index,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind().prefix(), self.index())
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("'{0}' is not a channel; expected one of d, u, m or a followed by an index")]
pub struct ParseChannelError(String);

impl FromStr for Channel {
    type Err = ParseChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = chars
            .next()
            .and_then(ChannelKind::from_prefix)
            .ok_or_else(|| ParseChannelError(s.to_owned()))?;
        let index = chars
            .as_str()
            .parse::<u32>()
            .map_err(|_| ParseChannelError(s.to_owned()))?;
        Ok(Self::new(kind, index))
    }
}

impl TryFrom<String> for Channel {
    type Error = ParseChannelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Channel, ChannelKind};

    #[rstest]
    #[case("d0", Channel::Drive(0))]
    #[case("u12", Channel::Control(12))]
    #[case("m3", Channel::Measure(3))]
    #[case("a1", Channel::Acquire(1))]
    fn parse_and_print(#[case] text: &str, #[case] channel: Channel) {
        assert_eq!(text.parse::<Channel>().unwrap(), channel);
        assert_eq!(channel.to_string(), text);
    }

    #[rstest]
    #[case("")]
    #[case("d")]
    #[case("x0")]
    #[case("d-1")]
    fn rejects(#[case] text: &str) {
        assert!(text.parse::<Channel>().is_err());
    }

    #[test]
    fn serializes_as_name() {
        assert_eq!(
            serde_json::to_string(&Channel::Measure(2)).unwrap(),
            "\"m2\""
        );
        let channels: Vec<Channel> = serde_json::from_str(r#"["d1", "a0"]"#).unwrap();
        assert_eq!(channels, vec![Channel::Drive(1), Channel::Acquire(0)]);
        assert_eq!(Channel::Acquire(0).kind(), ChannelKind::Acquire);
    }
}
