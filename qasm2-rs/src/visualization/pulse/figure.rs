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

//! The finished drawing, written as SVG.

use std::{fmt, path::Path};

use tracing::debug;

use super::{
    canvas::{Canvas, Chart, TimeAxis},
    drawings::{Drawing, Shape, Style, TextAnchor, XCoordinate, YCoordinate},
    stylesheet::Stylesheet,
    DrawError,
};

// Write every element from an iterable
macro_rules! write_many {
    ($f:expr, $iter:expr) => {{
        for item in $iter {
            write!($f, "{item}")?;
        }

        Ok(())
    }};
}

/// Values drawn within a chart span this many full scales above and below the baseline.
const CHART_VALUE_RANGE: f64 = 1.3;

/// Space between the plot and labels written at its edges.
const LABEL_PADDING: f64 = 6.0;

const TICK_LENGTH: f64 = 5.0;

/// A number written with at most two decimal places.
#[derive(Clone, Copy, Debug)]
struct Number(f64);

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = format!("{:.2}", self.0);
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        match trimmed {
            "-0" | "" => write!(f, "0"),
            other => write!(f, "{other}"),
        }
    }
}

/// Text with the characters SVG reserves escaped.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chr in self.0.chars() {
            match chr {
                '&' => write!(f, "&amp;")?,
                '<' => write!(f, "&lt;")?,
                '>' => write!(f, "&gt;")?,
                '"' => write!(f, "&quot;")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

/// How an outline or line is painted.
#[derive(Clone, Debug, PartialEq)]
struct Stroke {
    color: String,
    width: f64,
    opacity: f64,
    dash: Option<String>,
}

impl Stroke {
    fn from_style(style: &Style) -> Self {
        Self {
            color: style.color.clone(),
            width: style.line_width,
            opacity: style.alpha,
            dash: style.dash.clone(),
        }
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#" stroke="{}" stroke-width="{}" stroke-opacity="{}""#,
            self.color,
            Number(self.width),
            Number(self.opacity)
        )?;
        if let Some(dash) = &self.dash {
            write!(f, r#" stroke-dasharray="{dash}""#)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
enum SvgElement {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: String,
    },
    /// A closed, filled outline.
    Area {
        class: String,
        points: Vec<(f64, f64)>,
        fill: String,
        opacity: f64,
        stroke: Stroke,
    },
    Polyline {
        class: String,
        points: Vec<(f64, f64)>,
        stroke: Stroke,
    },
    Text {
        class: String,
        x: f64,
        y: f64,
        text: String,
        anchor: TextAnchor,
        size: f64,
        fill: String,
    },
    ClipPath {
        id: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Group {
        class: String,
        clip: Option<String>,
        children: Vec<SvgElement>,
    },
}

struct Points<'a>(&'a [(f64, f64)]);

impl fmt::Display for Points<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut points = self.0.iter().peekable();
        while let Some((x, y)) = points.next() {
            write!(f, "{},{}", Number(*x), Number(*y))?;
            if points.peek().is_some() {
                write!(f, " ")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for SvgElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvgElement::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => writeln!(
                f,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}"/>"#,
                Number(*x),
                Number(*y),
                Number(*width),
                Number(*height)
            ),
            SvgElement::Area {
                class,
                points,
                fill,
                opacity,
                stroke,
            } => writeln!(
                f,
                r#"<polygon class="{class}" points="{}" fill="{fill}" fill-opacity="{}"{stroke}/>"#,
                Points(points),
                Number(*opacity)
            ),
            SvgElement::Polyline {
                class,
                points,
                stroke,
            } => writeln!(
                f,
                r#"<polyline class="{class}" points="{}" fill="none"{stroke}/>"#,
                Points(points)
            ),
            SvgElement::Text {
                class,
                x,
                y,
                text,
                anchor,
                size,
                fill,
            } => writeln!(
                f,
                r#"<text class="{class}" x="{}" y="{}" text-anchor="{anchor}" dominant-baseline="middle" font-size="{}" fill="{fill}">{}</text>"#,
                Number(*x),
                Number(*y),
                Number(*size),
                Escaped(text)
            ),
            SvgElement::ClipPath {
                id,
                x,
                y,
                width,
                height,
            } => writeln!(
                f,
                r#"<clipPath id="{id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath>"#,
                Number(*x),
                Number(*y),
                Number(*width),
                Number(*height)
            ),
            SvgElement::Group {
                class,
                clip,
                children,
            } => {
                write!(f, r#"<g class="{class}""#)?;
                if let Some(clip) = clip {
                    write!(f, r#" clip-path="url(#{clip})""#)?;
                }
                writeln!(f, ">")?;
                write_many!(f, children)?;
                writeln!(f, "</g>")
            }
        }
    }
}

/// Pixel positions of the plotted area, shared by every chart.
struct Frame<'a> {
    left: f64,
    right: f64,
    time: &'a TimeAxis,
}

impl Frame<'_> {
    fn x(&self, coordinate: XCoordinate) -> f64 {
        match coordinate {
            XCoordinate::Left => self.left,
            XCoordinate::Right => self.right,
            XCoordinate::Time(time) => {
                let length = self.time.length();
                let fraction = if length > 0.0 {
                    self.time.position(time) / length
                } else {
                    0.0
                };
                self.left + fraction * (self.right - self.left)
            }
        }
    }
}

/// The vertical extent of one chart.
struct Row {
    top: f64,
    height: f64,
    scale: f64,
}

impl Row {
    fn y(&self, coordinate: YCoordinate, scaled: bool) -> f64 {
        match coordinate {
            YCoordinate::Top => self.top,
            YCoordinate::Bottom => self.top + self.height,
            YCoordinate::Value(value) => {
                let value = if scaled { value * self.scale } else { value };
                let half = self.height / 2.0;
                let value = value.clamp(-CHART_VALUE_RANGE, CHART_VALUE_RANGE);
                self.top + half - value / CHART_VALUE_RANGE * half
            }
        }
    }
}

/// A drawn schedule. Write it out with [`Figure::to_svg`] or [`Figure::save`].
#[derive(Clone, Debug, PartialEq)]
pub struct Figure {
    width: f64,
    height: f64,
    elements: Vec<SvgElement>,
}

impl Figure {
    pub(crate) fn from_canvas(canvas: &Canvas, style: &Stylesheet) -> Self {
        let formatter = &style.formatter;
        let margin = &formatter.margin;
        let text_size = &formatter.text_size;
        let chart_height = formatter.general.fig_chart_height;
        let width = formatter.general.fig_width;

        let title_height = if canvas.title.is_some() {
            text_size.fig_title * 2.0
        } else {
            0.0
        };
        let charts_top = margin.top + title_height;
        let chart_count = canvas.charts.len() as f64;
        let charts_bottom = charts_top
            + chart_count * chart_height
            + (chart_count - 1.0).max(0.0) * margin.between_channel;
        let axis_height = TICK_LENGTH + text_size.axis_tick * 3.0;
        let height = charts_bottom + axis_height + margin.bottom;

        let frame = Frame {
            left: margin.left,
            right: (width - margin.right).max(margin.left + 1.0),
            time: &canvas.time,
        };

        let mut elements = vec![SvgElement::Rect {
            x: 0.0,
            y: 0.0,
            width,
            height,
            fill: formatter.color.background.clone(),
        }];

        if let Some(title) = &canvas.title {
            elements.push(SvgElement::Text {
                class: "figure-title".to_owned(),
                x: width / 2.0,
                y: margin.top + text_size.fig_title / 2.0,
                text: title.clone(),
                anchor: TextAnchor::Middle,
                size: text_size.fig_title,
                fill: formatter.color.fig_title.clone(),
            });
        }

        for (index, chart) in canvas.charts.iter().enumerate() {
            let row = Row {
                top: charts_top + index as f64 * (chart_height + margin.between_channel),
                height: chart_height,
                scale: chart.scale,
            };
            elements.extend(chart_elements(index, chart, &frame, &row));
        }

        for axis_break in &canvas.time.breaks {
            let center = frame.x(XCoordinate::Time((axis_break.start + axis_break.end) / 2.0));
            let half = formatter.line_width.axis_break / 2.0;
            elements.push(SvgElement::Rect {
                x: center - half,
                y: charts_top,
                width: half * 2.0,
                height: charts_bottom - charts_top,
                fill: formatter.color.background.clone(),
            });
            for offset in [-half, half] {
                elements.push(SvgElement::Polyline {
                    class: "axis-break".to_owned(),
                    points: vec![
                        (center + offset - 3.0, charts_bottom + 4.0),
                        (center + offset + 3.0, charts_bottom - 4.0),
                    ],
                    stroke: Stroke {
                        color: formatter.color.axis_label.clone(),
                        width: 1.0,
                        opacity: 1.0,
                        dash: None,
                    },
                });
            }
        }

        elements.push(time_axis(
            &canvas.time,
            &frame,
            charts_bottom,
            style,
        ));

        Self {
            width,
            height,
            elements,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn to_svg(&self) -> String {
        self.to_string()
    }

    /// Write the figure to `path`, which must name an `.svg` file.
    ///
    /// # Errors
    ///
    /// Fails with [`DrawError::UnsupportedFormat`] for any other extension, or
    /// [`DrawError::Io`] if the file can't be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DrawError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .unwrap_or_default();
        if !extension.eq_ignore_ascii_case("svg") {
            return Err(DrawError::UnsupportedFormat(extension.to_owned()));
        }
        std::fs::write(path, self.to_svg()).map_err(|source| DrawError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "saved figure");
        Ok(())
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
            w = Number(self.width),
            h = Number(self.height)
        )?;
        write_many!(f, &self.elements)?;
        writeln!(f, "</svg>")
    }
}

fn chart_elements(index: usize, chart: &Chart, frame: &Frame, row: &Row) -> Vec<SvgElement> {
    let clip_id = format!("chart-{index}");
    let mut clipped = Vec::new();
    let mut labels = Vec::new();
    for drawing in &chart.drawings {
        let element = drawing_element(drawing, frame, row);
        match drawing.shape {
            Shape::Text {
                x: XCoordinate::Left | XCoordinate::Right,
                ..
            } => labels.push(element),
            _ => clipped.push(element),
        }
    }

    vec![
        SvgElement::ClipPath {
            id: clip_id.clone(),
            x: frame.left,
            y: row.top,
            width: frame.right - frame.left,
            height: row.height,
        },
        SvgElement::Group {
            class: "chart".to_owned(),
            clip: Some(clip_id),
            children: clipped,
        },
        SvgElement::Group {
            class: "chart-labels".to_owned(),
            clip: None,
            children: labels,
        },
    ]
}

fn drawing_element(drawing: &Drawing, frame: &Frame, row: &Row) -> SvgElement {
    let class = drawing.kind.to_string();
    let style = &drawing.style;
    match &drawing.shape {
        Shape::FilledArea { x, y } => {
            let baseline = row.y(YCoordinate::Value(0.0), false);
            let mut points = Vec::with_capacity(2 * x.len() + 2);
            if let Some(first) = x.first() {
                points.push((frame.x(XCoordinate::Time(*first)), baseline));
            }
            for (step, value) in x.windows(2).zip(y) {
                let level = row.y(YCoordinate::Value(*value), drawing.scaled);
                points.push((frame.x(XCoordinate::Time(step[0])), level));
                points.push((frame.x(XCoordinate::Time(step[1])), level));
            }
            if let Some(last) = x.last() {
                points.push((frame.x(XCoordinate::Time(*last)), baseline));
            }
            SvgElement::Area {
                class,
                points,
                fill: style.color.clone(),
                opacity: style.alpha,
                stroke: Stroke::from_style(style),
            }
        }
        Shape::Line { x, y } => SvgElement::Polyline {
            class,
            points: x
                .iter()
                .zip(y)
                .map(|(x, y)| (frame.x(*x), row.y(*y, drawing.scaled)))
                .collect(),
            stroke: Stroke::from_style(style),
        },
        Shape::Text { x, y, text, anchor } => {
            let offset = match x {
                XCoordinate::Left => -LABEL_PADDING,
                XCoordinate::Right => LABEL_PADDING,
                XCoordinate::Time(_) => 0.0,
            };
            SvgElement::Text {
                class,
                x: frame.x(*x) + offset,
                y: row.y(*y, drawing.scaled),
                text: text.clone(),
                anchor: *anchor,
                size: style.font_size,
                fill: style.color.clone(),
            }
        }
    }
}

fn time_axis(time: &TimeAxis, frame: &Frame, top: f64, style: &Stylesheet) -> SvgElement {
    let formatter = &style.formatter;
    let stroke = Stroke {
        color: formatter.color.axis_label.clone(),
        width: 1.0,
        opacity: 1.0,
        dash: None,
    };
    let size = formatter.text_size.axis_tick;

    let mut children = vec![SvgElement::Polyline {
        class: "time-axis".to_owned(),
        points: vec![(frame.left, top), (frame.right, top)],
        stroke: stroke.clone(),
    }];
    for (position, label) in time.ticks(formatter.general.time_ticks) {
        let length = time.length();
        let x = if length > 0.0 {
            frame.left + position / length * (frame.right - frame.left)
        } else {
            frame.left
        };
        children.push(SvgElement::Polyline {
            class: "time-tick".to_owned(),
            points: vec![(x, top), (x, top + TICK_LENGTH)],
            stroke: stroke.clone(),
        });
        children.push(SvgElement::Text {
            class: "time-tick-label".to_owned(),
            x,
            y: top + TICK_LENGTH + size,
            text: label,
            anchor: TextAnchor::Middle,
            size,
            fill: formatter.color.axis_label.clone(),
        });
    }
    children.push(SvgElement::Text {
        class: "time-axis-label".to_owned(),
        x: (frame.left + frame.right) / 2.0,
        y: top + TICK_LENGTH + size * 2.5,
        text: format!("Time ({})", time.unit),
        anchor: TextAnchor::Middle,
        size,
        fill: formatter.color.axis_label.clone(),
    });

    SvgElement::Group {
        class: "time-axis".to_owned(),
        clip: None,
        children,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{Escaped, Number};
    use crate::pulse::{Channel, Gaussian, PulseInstruction, Schedule};
    use crate::visualization::pulse::{draw, DrawError, DrawOptions};

    fn schedule() -> Schedule {
        let mut schedule = Schedule::new("x & y");
        schedule
            .append(PulseInstruction::play(
                Gaussian {
                    duration: 160,
                    amp: 0.2,
                    sigma: 40.0,
                    angle: 0.0,
                },
                Channel::Drive(0),
            ))
            .unwrap();
        schedule
            .append(PulseInstruction::ShiftPhase {
                phase: std::f64::consts::FRAC_PI_2,
                channel: Channel::Drive(0),
            })
            .unwrap();
        schedule
    }

    #[rstest]
    #[case(1.0, "1")]
    #[case(0.126, "0.13")]
    #[case(-0.001, "0")]
    #[case(90.5, "90.5")]
    fn numbers(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(Number(value).to_string(), expected);
    }

    #[test]
    fn escaping() {
        assert_eq!(Escaped("<a & \"b\">").to_string(), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn svg_document() {
        let figure = draw(&schedule(), &DrawOptions::default()).unwrap();
        let svg = figure.to_svg();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Name: x &amp; y, Duration: 160 dt"));
        assert!(svg.contains(r#"class="waveform-real""#));
        assert!(svg.contains(r#"clip-path="url(#chart-0)""#));
        assert!(svg.contains(">d0</text>"));
        assert!(svg.contains(">π/2</text>"));
        assert!(svg.contains(">Time (dt)</text>"));
        assert_eq!(svg.matches("<svg").count(), 1);
    }

    #[test]
    fn save_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.svg");
        let figure = draw(&schedule(), &DrawOptions::default()).unwrap();
        figure.save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), figure.to_svg());
    }

    #[rstest]
    #[case("schedule.png", "png")]
    #[case("schedule", "")]
    fn unsupported_formats(#[case] name: &str, #[case] expected: &str) {
        let dir = tempfile::tempdir().unwrap();
        let figure = draw(&schedule(), &DrawOptions::default()).unwrap();
        match figure.save(dir.path().join(name)) {
            Err(DrawError::UnsupportedFormat(extension)) => assert_eq!(extension, expected),
            other => panic!("expected an unsupported format, got {other:?}"),
        }
    }

    #[test]
    fn unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let figure = draw(&schedule(), &DrawOptions::default()).unwrap();
        let result = figure.save(dir.path().join("missing").join("schedule.svg"));
        assert!(matches!(result, Err(DrawError::Io { .. })));
    }
}
