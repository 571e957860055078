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

//! Generators turn events into drawings. Each one is enabled by naming it in the stylesheet.

use serde::{Deserialize, Serialize};

use crate::{
    pulse::Channel,
    units::{Cycles, Radians},
};

use super::{
    device::DeviceInfo,
    drawings::{DataKind, Drawing, Shape, Style, TextAnchor, XCoordinate, YCoordinate},
    events::{BarrierEvent, FrameEvent, WaveformEvent},
    stylesheet::Stylesheet,
};

/// Imaginary parts smaller than this are not drawn.
const IMAGINARY_TOLERANCE: f64 = 1e-12;

const MAX_PHASE_DENOMINATOR: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformGenerator {
    /// The real and imaginary parts of the samples, filled to the baseline.
    Filled,
    /// The waveform's name, above it.
    Name,
    /// The parameters of a parametric waveform, below it.
    Parameters,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameGenerator {
    Symbol,
    /// The phase shift in multiples of π and the frequency shift in MHz.
    Label,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartGenerator {
    Baseline,
    Name,
    Scale,
    /// The channel's initial frequency, when the device provides it.
    Frequency,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierGenerator {
    Line,
}

/// What chart generators need to know about the chart they decorate.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartContext {
    pub channels: Vec<Channel>,
    pub scale: f64,
}

impl WaveformGenerator {
    pub fn generate(self, event: &WaveformEvent, style: &Stylesheet) -> Vec<Drawing> {
        let formatter = &style.formatter;
        let center = event.t0 as f64 + event.duration() as f64 / 2.0;
        let text_style = Style {
            color: formatter.color.annotate.clone(),
            alpha: 1.0,
            font_size: formatter.text_size.annotate,
            ..Style::default()
        };

        match self {
            Self::Filled => {
                if event.samples.is_empty() {
                    return vec![];
                }
                let colors = formatter.color.waveforms.for_kind(event.channel.kind());
                let x = (0..=event.samples.len())
                    .map(|index| (event.t0 + index as u64) as f64)
                    .collect::<Vec<_>>();
                let area = |kind, y: Vec<f64>, color: &str| Drawing {
                    kind,
                    channels: vec![event.channel],
                    shape: Shape::FilledArea { x: x.clone(), y },
                    style: Style {
                        color: color.to_owned(),
                        alpha: formatter.alpha.fill_waveform,
                        line_width: formatter.line_width.fill_waveform,
                        ..Style::default()
                    },
                    scaled: true,
                };

                let mut drawings = vec![area(
                    DataKind::WaveformReal,
                    event.samples.iter().map(|sample| sample.re).collect(),
                    colors.real.as_str(),
                )];
                if event
                    .samples
                    .iter()
                    .any(|sample| sample.im.abs() > IMAGINARY_TOLERANCE)
                {
                    drawings.push(area(
                        DataKind::WaveformImaginary,
                        event.samples.iter().map(|sample| sample.im).collect(),
                        colors.imaginary.as_str(),
                    ));
                }
                drawings
            }
            Self::Name => vec![Drawing {
                kind: DataKind::WaveformName,
                channels: vec![event.channel],
                shape: Shape::Text {
                    x: XCoordinate::Time(center),
                    y: YCoordinate::Value(1.05),
                    text: event.name.clone(),
                    anchor: TextAnchor::Middle,
                },
                style: text_style,
                scaled: false,
            }],
            Self::Parameters => {
                if event.parameters.is_empty() || event.is_acquire {
                    return vec![];
                }
                let text = event
                    .parameters
                    .iter()
                    .filter(|(name, _)| *name != "duration")
                    .map(|(name, value)| format!("{name}={}", format_number(*value)))
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![Drawing {
                    kind: DataKind::WaveformParameters,
                    channels: vec![event.channel],
                    shape: Shape::Text {
                        x: XCoordinate::Time(center),
                        y: YCoordinate::Value(-1.2),
                        text,
                        anchor: TextAnchor::Middle,
                    },
                    style: text_style,
                    scaled: false,
                }]
            }
        }
    }
}

impl FrameGenerator {
    pub fn generate(self, event: &FrameEvent, style: &Stylesheet) -> Vec<Drawing> {
        let formatter = &style.formatter;
        let x = XCoordinate::Time(event.t0 as f64);
        match self {
            Self::Symbol => vec![Drawing {
                kind: DataKind::FrameSymbol,
                channels: vec![event.channel],
                shape: Shape::Text {
                    x,
                    y: YCoordinate::Value(0.0),
                    text: formatter.unicode_symbol.frame_change.clone(),
                    anchor: TextAnchor::Middle,
                },
                style: Style {
                    color: formatter.color.frame_change.clone(),
                    alpha: 1.0,
                    font_size: formatter.text_size.frame_change,
                    ..Style::default()
                },
                scaled: false,
            }],
            Self::Label => {
                let mut parts = Vec::new();
                if event.phase_shift != 0.0 {
                    parts.push(format_phase(Radians(event.phase_shift)));
                }
                if event.frequency_shift != 0.0 {
                    parts.push(format!("{:+.2} MHz", event.frequency_shift / 1e6));
                }
                if parts.is_empty() {
                    return vec![];
                }
                vec![Drawing {
                    kind: DataKind::FrameLabel,
                    channels: vec![event.channel],
                    shape: Shape::Text {
                        x,
                        y: YCoordinate::Value(-0.45),
                        text: parts.join(", "),
                        anchor: TextAnchor::Middle,
                    },
                    style: Style {
                        color: formatter.color.annotate.clone(),
                        alpha: 1.0,
                        font_size: formatter.text_size.annotate,
                        ..Style::default()
                    },
                    scaled: false,
                }]
            }
        }
    }
}

impl ChartGenerator {
    pub fn generate(
        self,
        chart: &ChartContext,
        style: &Stylesheet,
        device: &DeviceInfo,
    ) -> Vec<Drawing> {
        let formatter = &style.formatter;
        let label = |kind, y, text: String, font_size| Drawing {
            kind,
            channels: chart.channels.clone(),
            shape: Shape::Text {
                x: XCoordinate::Left,
                y: YCoordinate::Value(y),
                text,
                anchor: TextAnchor::End,
            },
            style: Style {
                color: formatter.color.axis_label.clone(),
                alpha: 1.0,
                font_size,
                ..Style::default()
            },
            scaled: false,
        };

        match self {
            Self::Baseline => vec![Drawing {
                kind: DataKind::Baseline,
                channels: chart.channels.clone(),
                shape: Shape::Line {
                    x: vec![XCoordinate::Left, XCoordinate::Right],
                    y: vec![YCoordinate::Value(0.0), YCoordinate::Value(0.0)],
                },
                style: Style {
                    color: formatter.color.baseline.clone(),
                    alpha: formatter.alpha.baseline,
                    line_width: formatter.line_width.baseline,
                    dash: formatter.line_style.baseline.clone(),
                    ..Style::default()
                },
                scaled: false,
            }],
            Self::Name => vec![label(
                DataKind::ChartName,
                0.0,
                chart
                    .channels
                    .iter()
                    .map(Channel::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                formatter.text_size.axis_label,
            )],
            Self::Scale => vec![label(
                DataKind::ChartScale,
                -0.6,
                format!("x{:.1}", chart.scale),
                formatter.text_size.annotate,
            )],
            Self::Frequency => chart
                .channels
                .iter()
                .find_map(|&channel| device.frequency(channel))
                .map(|frequency| {
                    label(
                        DataKind::ChartFrequency,
                        0.6,
                        format!("{:.2} GHz", frequency / 1e9),
                        formatter.text_size.annotate,
                    )
                })
                .into_iter()
                .collect(),
        }
    }
}

impl BarrierGenerator {
    pub fn generate(self, event: &BarrierEvent, style: &Stylesheet) -> Vec<Drawing> {
        let formatter = &style.formatter;
        match self {
            Self::Line => vec![Drawing {
                kind: DataKind::Barrier,
                channels: event.channels.clone(),
                shape: Shape::Line {
                    x: vec![
                        XCoordinate::Time(event.t0 as f64),
                        XCoordinate::Time(event.t0 as f64),
                    ],
                    y: vec![YCoordinate::Top, YCoordinate::Bottom],
                },
                style: Style {
                    color: formatter.color.barrier.clone(),
                    alpha: formatter.alpha.barrier,
                    line_width: formatter.line_width.barrier,
                    dash: formatter.line_style.barrier.clone(),
                    ..Style::default()
                },
                scaled: false,
            }],
        }
    }
}

/// Write a phase as a rational multiple of π where possible, such as `-π/2`.
pub fn format_phase(phase: Radians<f64>) -> String {
    // Half turns are multiples of π.
    let half_turns = Cycles::from(phase).0 * 2.0;
    for denominator in 1..=MAX_PHASE_DENOMINATOR {
        let numerator = half_turns * denominator as f64;
        let rounded = numerator.round();
        if (numerator - rounded).abs() > 1e-6 {
            continue;
        }
        let numerator = rounded as i64;
        let sign = if numerator < 0 { "-" } else { "" };
        let coefficient = match numerator.abs() {
            0 => return "0".to_owned(),
            1 => "π".to_owned(),
            magnitude => format!("{magnitude}π"),
        };
        return match denominator {
            1 => format!("{sign}{coefficient}"),
            _ => format!("{sign}{coefficient}/{denominator}"),
        };
    }
    format!("{:.2}", phase.0)
}

/// Write a number briefly, without trailing zeros.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        let formatted = format!("{value:.3}");
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use num_complex::Complex64;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{
        format_number, format_phase, BarrierGenerator, ChartContext, ChartGenerator,
        FrameGenerator, WaveformGenerator,
    };
    use crate::pulse::Channel;
    use crate::units::Radians;
    use crate::visualization::pulse::{
        device::DeviceInfo,
        drawings::{DataKind, Shape},
        events::{BarrierEvent, FrameEvent, WaveformEvent},
        stylesheet::Stylesheet,
    };

    fn waveform(samples: Vec<Complex64>) -> WaveformEvent {
        WaveformEvent {
            t0: 10,
            channel: Channel::Drive(0),
            name: "x90".to_owned(),
            samples,
            parameters: vec![("duration", 3.0), ("amp", 0.25), ("sigma", 1.5)],
            is_acquire: false,
        }
    }

    #[test]
    fn filled_waveform_is_stepwise() {
        let style = Stylesheet::default();
        let event = waveform(vec![Complex64::new(0.5, 0.0); 3]);
        let drawings = WaveformGenerator::Filled.generate(&event, &style);
        assert_eq!(drawings.len(), 1);
        assert_eq!(drawings[0].kind, DataKind::WaveformReal);
        assert_eq!(
            drawings[0].shape,
            Shape::FilledArea {
                x: vec![10.0, 11.0, 12.0, 13.0],
                y: vec![0.5, 0.5, 0.5]
            }
        );
        assert_eq!(drawings[0].style.color, style.formatter.color.waveforms.drive.real);
        assert!(drawings[0].scaled);
    }

    #[test]
    fn imaginary_part_only_when_present() {
        let event = waveform(vec![Complex64::new(0.5, 0.1); 3]);
        let kinds = WaveformGenerator::Filled
            .generate(&event, &Stylesheet::default())
            .into_iter()
            .map(|drawing| drawing.kind)
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![DataKind::WaveformReal, DataKind::WaveformImaginary]);
    }

    #[test]
    fn waveform_parameters_label() {
        let event = waveform(vec![Complex64::new(0.5, 0.0); 3]);
        let drawings = WaveformGenerator::Parameters.generate(&event, &Stylesheet::default());
        match &drawings[0].shape {
            Shape::Text { text, .. } => assert_eq!(text, "amp=0.25, sigma=1.5"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[rstest]
    #[case(PI, "π")]
    #[case(-PI / 2.0, "-π/2")]
    #[case(3.0 * PI / 4.0, "3π/4")]
    #[case(0.0, "0")]
    #[case(1.0, "1.00")]
    fn phases(#[case] phase: f64, #[case] expected: &str) {
        assert_eq!(format_phase(Radians(phase)), expected);
    }

    #[rstest]
    #[case(160.0, "160")]
    #[case(0.125, "0.125")]
    #[case(1.5, "1.5")]
    fn numbers(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value), expected);
    }

    #[test]
    fn frame_label() {
        let event = FrameEvent {
            t0: 0,
            channel: Channel::Drive(0),
            phase_shift: PI / 2.0,
            frequency_shift: 1.5e6,
            phase: PI / 2.0,
            frequency: 5.0015e9,
            count: 2,
        };
        let drawings = FrameGenerator::Label.generate(&event, &Stylesheet::default());
        match &drawings[0].shape {
            Shape::Text { text, .. } => assert_eq!(text, "π/2, +1.50 MHz"),
            other => panic!("expected text, got {other:?}"),
        }
        let unchanged = FrameEvent {
            phase_shift: 0.0,
            frequency_shift: 0.0,
            ..event
        };
        assert!(FrameGenerator::Label
            .generate(&unchanged, &Stylesheet::default())
            .is_empty());
    }

    #[test]
    fn chart_labels() {
        let chart = ChartContext {
            channels: vec![Channel::Control(1)],
            scale: 2.5,
        };
        let device = DeviceInfo::default().with_frequency(Channel::Control(1), 5.25e9);
        let style = Stylesheet::default();
        let texts = [ChartGenerator::Name, ChartGenerator::Scale, ChartGenerator::Frequency]
            .into_iter()
            .flat_map(|generator| generator.generate(&chart, &style, &device))
            .map(|drawing| match drawing.shape {
                Shape::Text { text, .. } => text,
                other => panic!("expected text, got {other:?}"),
            })
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["u1", "x2.5", "5.25 GHz"]);
        assert!(ChartGenerator::Frequency
            .generate(&chart, &style, &DeviceInfo::default())
            .is_empty());
    }

    #[test]
    fn barrier_line_spans_chart() {
        let event = BarrierEvent {
            t0: 40,
            channels: vec![Channel::Drive(0), Channel::Drive(1)],
        };
        let drawings = BarrierGenerator::Line.generate(&event, &Stylesheet::default());
        assert_eq!(drawings[0].channels.len(), 2);
        assert_eq!(drawings[0].style.dash.as_deref(), Some("4,3"));
    }
}
