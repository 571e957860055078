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

//! Drawing pulse schedules.
//!
//! [`draw`] collects the events on each channel of a [`Schedule`], turns them into drawings with
//! the generators the [`Stylesheet`] enables, arranges those into one chart per channel, and
//! returns a [`Figure`] which can be written out as SVG.
//!
//! ```
//! use qasm2_rs::pulse::{Channel, Gaussian, PulseInstruction, Schedule};
//! use qasm2_rs::visualization::pulse::{draw, DrawOptions};
//!
//! let mut schedule = Schedule::new("x90");
//! schedule
//!     .append(PulseInstruction::play(
//!         Gaussian { duration: 160, amp: 0.1, sigma: 40.0, angle: 0.0 },
//!         Channel::Drive(0),
//!     ))
//!     .unwrap();
//!
//! let figure = draw(&schedule, &DrawOptions::default()).unwrap();
//! assert!(figure.to_svg().contains("x90"));
//! ```

use std::path::PathBuf;

use tracing::debug;

use crate::{
    pulse::{Channel, Schedule},
    units::TimeUnit,
};

mod canvas;
mod device;
mod drawings;
mod events;
mod figure;
mod generators;
mod layouts;
mod stylesheet;

pub use device::DeviceInfo;
pub use figure::Figure;
pub use generators::{BarrierGenerator, ChartGenerator, FrameGenerator, WaveformGenerator};
pub use layouts::ChannelLayout;
pub use stylesheet::{
    Alphas, AxisBreak, ChannelScaling, Colors, ComplexColor, Control, Formatter, General,
    Generators, Layout, LineStyles, LineWidths, Margins, StylePreset, Stylesheet, TextSizes,
    UnicodeSymbols, WaveformColors,
};

#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("the schedule has nothing to draw")]
    EmptySchedule,
    #[error("drawing in '{unit}' needs the device's sample time (dt)")]
    MissingDt { unit: TimeUnit },
    #[error("invalid time range from {start} to {end}")]
    InvalidTimeRange { start: f64, end: f64 },
    #[error("invalid stylesheet: {0}")]
    InvalidStylesheet(String),
    #[error("cannot save a figure as '{0}'; only .svg is supported")]
    UnsupportedFormat(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything that controls a drawing apart from the schedule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawOptions {
    pub style: Stylesheet,
    pub device: DeviceInfo,
    /// The part of the schedule to draw, in `time_unit`.
    pub time_range: Option<(f64, f64)>,
    pub time_unit: TimeUnit,
    pub disable_channels: Vec<Channel>,
}

impl DrawOptions {
    pub fn with_style(mut self, style: Stylesheet) -> Self {
        self.style = style;
        self
    }

    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    pub fn with_time_range(mut self, start: f64, end: f64) -> Self {
        self.time_range = Some((start, end));
        self
    }

    pub fn with_time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }

    pub fn with_disabled_channels(mut self, channels: Vec<Channel>) -> Self {
        self.disable_channels = channels;
        self
    }
}

/// Draw a schedule.
///
/// # Errors
///
/// Fails if nothing in the schedule would be drawn, the time range is empty or reversed, or
/// `time_unit` is a unit of seconds but the device's `dt` is unknown.
pub fn draw(schedule: &Schedule, options: &DrawOptions) -> Result<Figure, DrawError> {
    debug!(
        schedule = %schedule.name,
        items = schedule.items().len(),
        unit = %options.time_unit,
        "drawing schedule"
    );
    options.style.validate()?;
    let canvas = canvas::Canvas::new(schedule, options)?;
    Ok(Figure::from_canvas(&canvas, &options.style))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{draw, DeviceInfo, DrawError, DrawOptions, StylePreset, Stylesheet};
    use crate::pulse::{Channel, Drag, GaussianSquare, PulseInstruction, Schedule};
    use crate::units::TimeUnit;

    fn measurement() -> Schedule {
        let mut schedule = Schedule::new("measure");
        schedule
            .append(PulseInstruction::play(
                Drag {
                    duration: 160,
                    amp: 0.2,
                    sigma: 40.0,
                    beta: 1.5,
                    angle: 0.0,
                },
                Channel::Drive(0),
            ))
            .unwrap();
        schedule
            .insert(
                160,
                PulseInstruction::play(
                    GaussianSquare {
                        duration: 1200,
                        amp: 0.3,
                        sigma: 64.0,
                        width: 1000.0,
                        angle: 0.0,
                    },
                    Channel::Measure(0),
                ),
            )
            .unwrap();
        schedule
            .insert(
                160,
                PulseInstruction::Acquire {
                    duration: 1200,
                    channel: Channel::Acquire(0),
                    mem_slot: Some(0),
                },
            )
            .unwrap();
        schedule
    }

    #[rstest]
    #[case(StylePreset::IqxStandard)]
    #[case(StylePreset::IqxSimple)]
    #[case(StylePreset::IqxDebugging)]
    fn every_preset_draws(#[case] preset: StylePreset) {
        let options = DrawOptions::default().with_style(Stylesheet::preset(preset));
        let svg = draw(&measurement(), &options).unwrap().to_svg();
        assert!(svg.contains(">d0</text>"));
        assert!(svg.contains(">m0</text>"));
        assert_eq!(
            svg.contains(">a0</text>"),
            preset != StylePreset::IqxSimple
        );
    }

    #[test]
    fn drag_has_an_imaginary_part() {
        let svg = draw(&measurement(), &DrawOptions::default())
            .unwrap()
            .to_svg();
        assert!(svg.contains(r#"class="waveform-imaginary""#));
    }

    #[test]
    fn nanoseconds() {
        let options = DrawOptions::default()
            .with_time_unit(TimeUnit::Nanoseconds)
            .with_device(DeviceInfo::default().with_dt(2.0e-9).with_name("fake"));
        let svg = draw(&measurement(), &options).unwrap().to_svg();
        assert!(svg.contains("Duration: 2720 ns, Backend: fake"));
        assert!(svg.contains(">Time (ns)</text>"));
    }

    #[test]
    fn invalid_stylesheet() {
        let mut style = Stylesheet::default();
        style.formatter.color.background = "white".to_owned();
        let options = DrawOptions::default().with_style(style);
        assert!(matches!(
            draw(&measurement(), &options),
            Err(DrawError::InvalidStylesheet(_))
        ));
    }

    #[test]
    fn everything_disabled() {
        let options = DrawOptions::default().with_disabled_channels(vec![
            Channel::Drive(0),
            Channel::Measure(0),
            Channel::Acquire(0),
        ]);
        assert!(matches!(
            draw(&measurement(), &options),
            Err(DrawError::EmptySchedule)
        ));
    }
}
