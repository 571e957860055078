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

//! The appearance of a drawing: colours, sizes, which elements to generate, and layout choices.
//!
//! A stylesheet starts from one of the [presets](StylePreset) and may be adjusted with JSON
//! overrides, given either as nested objects or with dotted keys:
//!
//! ```
//! use qasm2_rs::visualization::pulse::{StylePreset, Stylesheet};
//!
//! let style = Stylesheet::preset(StylePreset::IqxSimple)
//!     .with_overrides(&serde_json::json!({
//!         "formatter.color.background": "#000000",
//!         "formatter": { "general": { "fig_width": 1200.0 } },
//!     }))
//!     .unwrap();
//! assert_eq!(style.formatter.color.background, "#000000");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::pulse::ChannelKind;

use super::{
    generators::{BarrierGenerator, ChartGenerator, FrameGenerator, WaveformGenerator},
    layouts::ChannelLayout,
    DrawError,
};

static COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid regex")
});

/// The built-in stylesheets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum StylePreset {
    /// Waveforms with their names, frame changes with their values, and charts with scales.
    #[default]
    #[strum(serialize = "iqx-standard")]
    IqxStandard,
    /// Only waveforms, frame symbols and channel names, hiding acquisition and empty channels.
    #[strum(serialize = "iqx-simple")]
    IqxSimple,
    /// Everything, including waveform parameters, with no rescaling and no axis breaks.
    #[strum(serialize = "iqx-debugging")]
    IqxDebugging,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stylesheet {
    pub formatter: Formatter,
    pub generator: Generators,
    pub layout: Layout,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Formatter {
    pub general: General,
    pub color: Colors,
    pub alpha: Alphas,
    pub margin: Margins,
    pub text_size: TextSizes,
    pub line_width: LineWidths,
    pub line_style: LineStyles,
    pub channel_scaling: ChannelScaling,
    pub axis_break: AxisBreak,
    pub control: Control,
    pub unicode_symbol: UnicodeSymbols,
}

/// Sizes of the figure, in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct General {
    pub fig_width: f64,
    /// Height of the chart of each channel
    pub fig_chart_height: f64,
    /// Upper bound for automatic chart scaling
    pub max_scale: f64,
    /// Approximate number of ticks on the time axis
    pub time_ticks: usize,
}

/// The colours of the real and imaginary parts of a waveform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplexColor {
    pub real: String,
    pub imaginary: String,
}

impl ComplexColor {
    fn new(real: &str, imaginary: &str) -> Self {
        Self {
            real: real.to_owned(),
            imaginary: imaginary.to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveformColors {
    pub drive: ComplexColor,
    pub control: ComplexColor,
    pub measure: ComplexColor,
    pub acquire: ComplexColor,
}

impl WaveformColors {
    pub fn for_kind(&self, kind: ChannelKind) -> &ComplexColor {
        match kind {
            ChannelKind::Drive => &self.drive,
            ChannelKind::Control => &self.control,
            ChannelKind::Measure => &self.measure,
            ChannelKind::Acquire => &self.acquire,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Colors {
    pub waveforms: WaveformColors,
    pub baseline: String,
    pub barrier: String,
    pub background: String,
    pub fig_title: String,
    pub axis_label: String,
    pub frame_change: String,
    pub annotate: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Alphas {
    pub fill_waveform: f64,
    pub baseline: f64,
    pub barrier: f64,
}

/// Space around and between charts, in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
    pub between_channel: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextSizes {
    pub axis_label: f64,
    pub annotate: f64,
    pub frame_change: f64,
    pub fig_title: f64,
    pub axis_tick: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineWidths {
    pub fill_waveform: f64,
    pub baseline: f64,
    pub barrier: f64,
    pub axis_break: f64,
}

/// SVG dash arrays, such as `4,3`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineStyles {
    pub baseline: Option<String>,
    pub barrier: Option<String>,
}

/// Fixed chart scales by channel kind, used when automatic scaling is off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelScaling {
    pub drive: f64,
    pub control: f64,
    pub measure: f64,
    pub acquire: f64,
}

impl ChannelScaling {
    pub fn for_kind(&self, kind: ChannelKind) -> f64 {
        match kind {
            ChannelKind::Drive => self.drive,
            ChannelKind::Control => self.control,
            ChannelKind::Measure => self.measure,
            ChannelKind::Acquire => self.acquire,
        }
    }
}

/// Idle intervals longer than `length` samples are shortened to `max_length`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisBreak {
    pub length: u64,
    pub max_length: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Control {
    pub show_acquire_channel: bool,
    /// Draw charts for channels with nothing but delays and barriers.
    pub show_empty_channel: bool,
    pub auto_chart_scaling: bool,
    pub axis_break: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnicodeSymbols {
    pub frame_change: String,
}

/// Which drawings are generated for each kind of event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Generators {
    pub waveform: Vec<WaveformGenerator>,
    pub frame: Vec<FrameGenerator>,
    pub chart: Vec<ChartGenerator>,
    pub barrier: Vec<BarrierGenerator>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layout {
    pub chart_channel_map: ChannelLayout,
    pub figure_title: bool,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::preset(StylePreset::default())
    }
}

impl Stylesheet {
    pub fn preset(preset: StylePreset) -> Self {
        let mut style = Self::standard();
        match preset {
            StylePreset::IqxStandard => {}
            StylePreset::IqxSimple => {
                style.generator = Generators {
                    waveform: vec![WaveformGenerator::Filled],
                    frame: vec![FrameGenerator::Symbol],
                    chart: vec![ChartGenerator::Baseline, ChartGenerator::Name],
                    barrier: vec![],
                };
                style.formatter.control.show_acquire_channel = false;
                style.formatter.control.show_empty_channel = false;
                style.layout.figure_title = false;
            }
            StylePreset::IqxDebugging => {
                style.generator = Generators {
                    waveform: vec![
                        WaveformGenerator::Filled,
                        WaveformGenerator::Name,
                        WaveformGenerator::Parameters,
                    ],
                    frame: vec![FrameGenerator::Symbol, FrameGenerator::Label],
                    chart: vec![
                        ChartGenerator::Baseline,
                        ChartGenerator::Name,
                        ChartGenerator::Scale,
                        ChartGenerator::Frequency,
                    ],
                    barrier: vec![BarrierGenerator::Line],
                };
                style.formatter.control.auto_chart_scaling = false;
                style.formatter.control.axis_break = false;
            }
        }
        style
    }

    /// Look up a preset by name, such as `iqx-standard`.
    pub fn named(name: &str) -> Result<Self, DrawError> {
        let preset = name
            .parse::<StylePreset>()
            .map_err(|_| DrawError::InvalidStylesheet(format!("unknown stylesheet '{name}'")))?;
        Ok(Self::preset(preset))
    }

    fn standard() -> Self {
        Self {
            formatter: Formatter {
                general: General {
                    fig_width: 960.0,
                    fig_chart_height: 110.0,
                    max_scale: 100.0,
                    time_ticks: 6,
                },
                color: Colors {
                    waveforms: WaveformColors {
                        drive: ComplexColor::new("#648fff", "#002999"),
                        control: ComplexColor::new("#ffb000", "#994a00"),
                        measure: ComplexColor::new("#dc267f", "#760019"),
                        acquire: ComplexColor::new("#04d4b4", "#05847c"),
                    },
                    baseline: "#000000".to_owned(),
                    barrier: "#222222".to_owned(),
                    background: "#f2f3f4".to_owned(),
                    fig_title: "#000000".to_owned(),
                    axis_label: "#000000".to_owned(),
                    frame_change: "#000000".to_owned(),
                    annotate: "#222222".to_owned(),
                },
                alpha: Alphas {
                    fill_waveform: 0.3,
                    baseline: 1.0,
                    barrier: 0.7,
                },
                margin: Margins {
                    top: 40.0,
                    bottom: 40.0,
                    left: 90.0,
                    right: 20.0,
                    between_channel: 10.0,
                },
                text_size: TextSizes {
                    axis_label: 14.0,
                    annotate: 11.0,
                    frame_change: 16.0,
                    fig_title: 15.0,
                    axis_tick: 11.0,
                },
                line_width: LineWidths {
                    fill_waveform: 1.0,
                    baseline: 1.0,
                    barrier: 1.0,
                    axis_break: 6.0,
                },
                line_style: LineStyles {
                    baseline: None,
                    barrier: Some("4,3".to_owned()),
                },
                channel_scaling: ChannelScaling {
                    drive: 1.0,
                    control: 1.0,
                    measure: 1.0,
                    acquire: 1.0,
                },
                axis_break: AxisBreak {
                    length: 3000,
                    max_length: 1000,
                },
                control: Control {
                    show_acquire_channel: true,
                    show_empty_channel: true,
                    auto_chart_scaling: true,
                    axis_break: true,
                },
                unicode_symbol: UnicodeSymbols {
                    frame_change: "\u{21BA}".to_owned(),
                },
            },
            generator: Generators {
                waveform: vec![WaveformGenerator::Filled, WaveformGenerator::Name],
                frame: vec![FrameGenerator::Symbol, FrameGenerator::Label],
                chart: vec![
                    ChartGenerator::Baseline,
                    ChartGenerator::Name,
                    ChartGenerator::Scale,
                ],
                barrier: vec![BarrierGenerator::Line],
            },
            layout: Layout {
                chart_channel_map: ChannelLayout::IndexGrouped,
                figure_title: true,
            },
        }
    }

    /// This stylesheet with `overrides` merged over it.
    ///
    /// Keys containing dots name nested entries, so `{"formatter.color.background": "#000000"}`
    /// is the same as `{"formatter": {"color": {"background": "#000000"}}}`.
    ///
    /// # Errors
    ///
    /// Fails if an override names an entry which doesn't exist, has a value of the wrong type,
    /// or makes a colour invalid.
    pub fn with_overrides(&self, overrides: &Value) -> Result<Self, DrawError> {
        let overrides = expand_dotted_keys(overrides)?;
        let mut merged = serde_json::to_value(self)
            .map_err(|err| DrawError::InvalidStylesheet(err.to_string()))?;
        merge(&mut merged, overrides);
        let style: Self = serde_json::from_value(merged)
            .map_err(|err| DrawError::InvalidStylesheet(err.to_string()))?;
        style.validate()?;
        debug!(
            changed_sections = changed_sections(&style, self),
            "resolved stylesheet"
        );
        Ok(style)
    }

    /// Check that every colour is a hex colour, and that sizes are positive.
    pub fn validate(&self) -> Result<(), DrawError> {
        let color = &self.formatter.color;
        let waveforms = &color.waveforms;
        let colors = [
            ("formatter.color.waveforms.drive.real", &waveforms.drive.real),
            ("formatter.color.waveforms.drive.imaginary", &waveforms.drive.imaginary),
            ("formatter.color.waveforms.control.real", &waveforms.control.real),
            ("formatter.color.waveforms.control.imaginary", &waveforms.control.imaginary),
            ("formatter.color.waveforms.measure.real", &waveforms.measure.real),
            ("formatter.color.waveforms.measure.imaginary", &waveforms.measure.imaginary),
            ("formatter.color.waveforms.acquire.real", &waveforms.acquire.real),
            ("formatter.color.waveforms.acquire.imaginary", &waveforms.acquire.imaginary),
            ("formatter.color.baseline", &color.baseline),
            ("formatter.color.barrier", &color.barrier),
            ("formatter.color.background", &color.background),
            ("formatter.color.fig_title", &color.fig_title),
            ("formatter.color.axis_label", &color.axis_label),
            ("formatter.color.frame_change", &color.frame_change),
            ("formatter.color.annotate", &color.annotate),
        ];
        if let Some((key, value)) = colors.iter().find(|(_, value)| !COLOR.is_match(value)) {
            return Err(DrawError::InvalidStylesheet(format!(
                "'{value}' is not a valid colour for {key}; expected #rgb, #rrggbb or #rrggbbaa"
            )));
        }

        let general = &self.formatter.general;
        for (key, value) in [
            ("formatter.general.fig_width", general.fig_width),
            ("formatter.general.fig_chart_height", general.fig_chart_height),
            ("formatter.general.max_scale", general.max_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(DrawError::InvalidStylesheet(format!(
                    "{key} must be positive, not {value}"
                )));
            }
        }
        if self.formatter.axis_break.max_length > self.formatter.axis_break.length {
            return Err(DrawError::InvalidStylesheet(
                "formatter.axis_break.max_length must not exceed formatter.axis_break.length"
                    .to_owned(),
            ));
        }
        Ok(())
    }
}

/// The number of top-level sections which differ between two stylesheets.
fn changed_sections(style: &Stylesheet, base: &Stylesheet) -> usize {
    [
        style.formatter != base.formatter,
        style.generator != base.generator,
        style.layout != base.layout,
    ]
    .into_iter()
    .filter(|changed| *changed)
    .count()
}

/// Turn `{"a.b": 1}` into `{"a": {"b": 1}}`, recursively.
fn expand_dotted_keys(value: &Value) -> Result<Value, DrawError> {
    let Value::Object(object) = value else {
        return Err(DrawError::InvalidStylesheet(
            "stylesheet overrides must be a JSON object".to_owned(),
        ));
    };
    let mut expanded = Value::Object(Map::new());
    for (key, value) in object {
        let value = match value {
            Value::Object(_) => expand_dotted_keys(value)?,
            other => other.clone(),
        };
        let nested = key
            .split('.')
            .rev()
            .fold(value, |inner, part| {
                let mut map = Map::new();
                map.insert(part.to_owned(), inner);
                Value::Object(map)
            });
        merge(&mut expanded, nested);
    }
    Ok(expanded)
}

/// Merge `overrides` into `base`: objects are merged key by key, anything else is replaced.
fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::{StylePreset, Stylesheet};
    use crate::visualization::pulse::{
        generators::WaveformGenerator, layouts::ChannelLayout, DrawError,
    };

    #[rstest]
    #[case("iqx-standard", StylePreset::IqxStandard)]
    #[case("iqx-simple", StylePreset::IqxSimple)]
    #[case("iqx-debugging", StylePreset::IqxDebugging)]
    fn presets_by_name(#[case] name: &str, #[case] preset: StylePreset) {
        assert_eq!(Stylesheet::named(name).unwrap(), Stylesheet::preset(preset));
        Stylesheet::preset(preset).validate().unwrap();
    }

    #[test]
    fn unknown_preset() {
        assert!(matches!(
            Stylesheet::named("iqx-fancy"),
            Err(DrawError::InvalidStylesheet(_))
        ));
    }

    #[test]
    fn presets_differ() {
        let simple = Stylesheet::preset(StylePreset::IqxSimple);
        let debugging = Stylesheet::preset(StylePreset::IqxDebugging);
        assert!(!simple.formatter.control.show_acquire_channel);
        assert!(debugging
            .generator
            .waveform
            .contains(&WaveformGenerator::Parameters));
        assert!(!debugging.formatter.control.axis_break);
    }

    #[test]
    fn dotted_and_nested_overrides() {
        let style = Stylesheet::default()
            .with_overrides(&json!({
                "formatter.color.waveforms.drive.real": "#112233",
                "formatter": {"axis_break.length": 500, "axis_break": {"max_length": 100}},
                "layout.chart_channel_map": "type-grouped",
                "generator.waveform": ["filled"],
            }))
            .unwrap();
        assert_eq!(style.formatter.color.waveforms.drive.real, "#112233");
        assert_eq!(style.formatter.axis_break.length, 500);
        assert_eq!(style.formatter.axis_break.max_length, 100);
        assert_eq!(style.layout.chart_channel_map, ChannelLayout::TypeGrouped);
        assert_eq!(style.generator.waveform, vec![WaveformGenerator::Filled]);
        // Untouched entries keep their preset values.
        assert_eq!(
            style.formatter.color.background,
            Stylesheet::default().formatter.color.background
        );
    }

    #[rstest]
    #[case(json!({"formatter.color.background": "blue"}))]
    #[case(json!({"formatter.color.background": "#12345"}))]
    #[case(json!({"formatter.colour.background": "#123456"}))]
    #[case(json!({"formatter.general.fig_width": "wide"}))]
    #[case(json!({"formatter.general.fig_width": -3.0}))]
    #[case(json!({"generator.waveform": ["sparkles"]}))]
    #[case(json!({"formatter.axis_break.max_length": 5000}))]
    #[case(json!(["not", "an", "object"]))]
    fn invalid_overrides(#[case] overrides: serde_json::Value) {
        assert!(matches!(
            Stylesheet::default().with_overrides(&overrides),
            Err(DrawError::InvalidStylesheet(_))
        ));
    }

    #[test]
    fn serialized_names() {
        let value = serde_json::to_value(Stylesheet::preset(StylePreset::IqxSimple)).unwrap();
        assert_eq!(
            value["generator"],
            json!({
                "waveform": ["filled"],
                "frame": ["symbol"],
                "chart": ["baseline", "name"],
                "barrier": [],
            })
        );
    }
}
