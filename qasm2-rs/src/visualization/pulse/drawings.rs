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

//! Drawing primitives, positioned in schedule time and chart values, before any layout.

use crate::pulse::Channel;

/// A horizontal position: a time in samples, or one of the edges of the chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum XCoordinate {
    Time(f64),
    /// The left edge of the chart, where channel names are written.
    Left,
    Right,
}

/// A vertical position within a chart: a value (full scale is one), or one of its edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum YCoordinate {
    Value(f64),
    Top,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TextAnchor {
    Start,
    #[default]
    Middle,
    End,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// The area between a stepwise curve and the baseline. `y` holds one value per sample and
    /// `x` one more time than `y`, bounding the samples.
    FilledArea { x: Vec<f64>, y: Vec<f64> },
    Line {
        x: Vec<XCoordinate>,
        y: Vec<YCoordinate>,
    },
    Text {
        x: XCoordinate,
        y: YCoordinate,
        text: String,
        anchor: TextAnchor,
    },
}

/// What a drawing represents. Used as the SVG class of the element drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DataKind {
    WaveformReal,
    WaveformImaginary,
    WaveformName,
    WaveformParameters,
    FrameSymbol,
    FrameLabel,
    Baseline,
    ChartName,
    ChartScale,
    ChartFrequency,
    Barrier,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
    pub color: String,
    pub alpha: f64,
    pub line_width: f64,
    pub dash: Option<String>,
    pub font_size: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Drawing {
    pub kind: DataKind,
    pub channels: Vec<Channel>,
    pub shape: Shape,
    pub style: Style,
    /// Whether `Value` coordinates are multiplied by the chart's scale.
    pub scaled: bool,
}

impl Drawing {
    /// The times this drawing covers, if it has any.
    pub fn time_extent(&self) -> Option<(f64, f64)> {
        let times: Vec<f64> = match &self.shape {
            Shape::FilledArea { x, .. } => x.clone(),
            Shape::Line { x, .. } => x
                .iter()
                .filter_map(|coordinate| match coordinate {
                    XCoordinate::Time(time) => Some(*time),
                    _ => None,
                })
                .collect(),
            Shape::Text { x, .. } => match x {
                XCoordinate::Time(time) => vec![*time],
                _ => vec![],
            },
        };
        let start = times.iter().copied().reduce(f64::min)?;
        let end = times.iter().copied().reduce(f64::max)?;
        Some((start, end))
    }
}
