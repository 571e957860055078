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

//! Arranging drawings into charts on a shared, possibly broken, time axis.

use tracing::debug;

use crate::{
    pulse::{Channel, ChannelKind, PulseInstruction, Schedule},
    units::TimeUnit,
};

use super::{
    drawings::Drawing,
    events::{barriers, ChannelEvents},
    generators::ChartContext,
    layouts::{figure_title, format_time, time_ticks},
    DrawError, DrawOptions,
};

/// A stretch of idle time drawn shorter than it is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisBreak {
    pub start: f64,
    pub end: f64,
    /// The length of axis the break occupies.
    pub kept: f64,
}

impl AxisBreak {
    fn removed(&self) -> f64 {
        self.end - self.start - self.kept
    }
}

/// Maps schedule time, in samples, to a position along the drawn axis, which starts at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeAxis {
    pub start: f64,
    pub end: f64,
    pub breaks: Vec<AxisBreak>,
    pub unit: TimeUnit,
    /// The length of a sample in `unit`.
    pub unit_per_sample: f64,
}

impl TimeAxis {
    pub fn position(&self, time: f64) -> f64 {
        let mut removed = 0.0;
        for axis_break in &self.breaks {
            if time >= axis_break.end {
                removed += axis_break.removed();
            } else if time > axis_break.start {
                let ratio = axis_break.kept / (axis_break.end - axis_break.start);
                return axis_break.start - self.start - removed + (time - axis_break.start) * ratio;
            } else {
                break;
            }
        }
        time - self.start - removed
    }

    pub fn length(&self) -> f64 {
        self.position(self.end)
    }

    /// Axis positions and labels of the ticks, skipping those hidden by a break.
    pub fn ticks(&self, count: usize) -> Vec<(f64, String)> {
        let start = self.start * self.unit_per_sample;
        let end = self.end * self.unit_per_sample;
        time_ticks(start, end, count)
            .into_iter()
            .filter_map(|tick| {
                let time = tick / self.unit_per_sample;
                let hidden = self
                    .breaks
                    .iter()
                    .any(|axis_break| time > axis_break.start && time < axis_break.end);
                (!hidden).then(|| (self.position(time), format_time(tick, self.unit)))
            })
            .collect()
    }

    /// The duration of a number of samples in the axis unit.
    pub fn in_unit(&self, samples: f64) -> f64 {
        samples * self.unit_per_sample
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub channels: Vec<Channel>,
    pub scale: f64,
    pub drawings: Vec<Drawing>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    pub title: Option<String>,
    pub charts: Vec<Chart>,
    pub time: TimeAxis,
}

impl Canvas {
    pub fn new(schedule: &Schedule, options: &DrawOptions) -> Result<Self, DrawError> {
        if schedule.is_empty() {
            return Err(DrawError::EmptySchedule);
        }
        let style = &options.style;
        let formatter = &style.formatter;
        let unit_per_sample = unit_per_sample(options.time_unit, options.device.dt)?;
        let (start, end) = time_range(schedule, options, unit_per_sample)?;

        let mut channel_events = style
            .layout
            .chart_channel_map
            .order_channels(&schedule.channels())
            .into_iter()
            .filter(|channel| !options.disable_channels.contains(channel))
            .filter(|channel| {
                formatter.control.show_acquire_channel || channel.kind() != ChannelKind::Acquire
            })
            .map(|channel| {
                let frequency = options.device.frequency(channel).unwrap_or(0.0);
                ChannelEvents::from_schedule(schedule, channel, frequency)
            })
            .collect::<Vec<_>>();
        if !formatter.control.show_empty_channel {
            channel_events.retain(|events| !events.is_empty());
        }
        if channel_events.is_empty() {
            return Err(DrawError::EmptySchedule);
        }

        let visible = channel_events
            .iter()
            .map(|events| events.channel)
            .collect::<Vec<_>>();
        let breaks = if formatter.control.axis_break {
            axis_breaks(
                schedule,
                &visible,
                (start, end),
                formatter.axis_break.length as f64,
                formatter.axis_break.max_length as f64,
            )
        } else {
            vec![]
        };
        let time = TimeAxis {
            start,
            end,
            breaks,
            unit: options.time_unit,
            unit_per_sample,
        };

        let barrier_events = barriers(schedule);
        let charts = channel_events
            .iter()
            .map(|events| {
                let scale = if formatter.control.auto_chart_scaling {
                    let amplitude = events.max_amplitude();
                    if amplitude > 0.0 {
                        (1.0 / amplitude).min(formatter.general.max_scale)
                    } else {
                        1.0
                    }
                } else {
                    formatter.channel_scaling.for_kind(events.channel.kind())
                };
                let context = ChartContext {
                    channels: vec![events.channel],
                    scale,
                };

                let mut drawings = Vec::new();
                for generator in &style.generator.chart {
                    drawings.extend(generator.generate(&context, style, &options.device));
                }
                for event in &events.waveforms {
                    for generator in &style.generator.waveform {
                        drawings.extend(generator.generate(event, style));
                    }
                }
                for event in &events.frames {
                    for generator in &style.generator.frame {
                        drawings.extend(generator.generate(event, style));
                    }
                }
                for event in barrier_events
                    .iter()
                    .filter(|event| event.channels.contains(&events.channel))
                {
                    for generator in &style.generator.barrier {
                        drawings.extend(generator.generate(event, style));
                    }
                }
                drawings.retain(|drawing| match drawing.time_extent() {
                    Some((first, last)) => last >= start && first <= end,
                    None => true,
                });

                Chart {
                    channels: context.channels,
                    scale,
                    drawings,
                }
            })
            .collect::<Vec<_>>();

        let title = style.layout.figure_title.then(|| {
            figure_title(
                &schedule.name,
                time.in_unit(end - start),
                options.time_unit,
                &options.device,
            )
        });

        debug!(
            charts = charts.len(),
            axis_breaks = time.breaks.len(),
            drawings = charts.iter().map(|chart| chart.drawings.len()).sum::<usize>(),
            "laid out schedule"
        );
        Ok(Self {
            title,
            charts,
            time,
        })
    }
}

/// The length of one sample in `unit`.
fn unit_per_sample(unit: TimeUnit, dt: Option<f64>) -> Result<f64, DrawError> {
    match unit.seconds() {
        None => Ok(1.0),
        Some(seconds) => match dt {
            Some(dt) => Ok(dt / seconds),
            None => Err(DrawError::MissingDt { unit }),
        },
    }
}

/// The range of schedule time to draw, in samples.
fn time_range(
    schedule: &Schedule,
    options: &DrawOptions,
    unit_per_sample: f64,
) -> Result<(f64, f64), DrawError> {
    match options.time_range {
        None => Ok((0.0, schedule.duration().max(1) as f64)),
        Some((start, end)) => {
            if !(start.is_finite() && end.is_finite() && start >= 0.0 && start < end) {
                return Err(DrawError::InvalidTimeRange { start, end });
            }
            Ok((start / unit_per_sample, end / unit_per_sample))
        }
    }
}

/// Find the idle stretches longer than `length` within `range`, each to be drawn `kept` long.
fn axis_breaks(
    schedule: &Schedule,
    channels: &[Channel],
    (start, end): (f64, f64),
    length: f64,
    kept: f64,
) -> Vec<AxisBreak> {
    let mut busy = schedule
        .items()
        .iter()
        .filter(|item| !matches!(item.instruction, PulseInstruction::Delay { .. }))
        .filter(|item| {
            item.instruction
                .channels()
                .iter()
                .any(|channel| channels.contains(channel))
        })
        .map(|item| (item.t0 as f64, item.stop_time() as f64))
        .collect::<Vec<_>>();
    busy.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut breaks = Vec::new();
    let mut idle_from = start;
    for (busy_start, busy_stop) in busy {
        if busy_start >= end {
            break;
        }
        let busy_start = busy_start.max(start);
        if busy_start - idle_from > length {
            breaks.push(AxisBreak {
                start: idle_from,
                end: busy_start,
                kept,
            });
        }
        idle_from = idle_from.max(busy_stop);
        if idle_from >= end {
            break;
        }
    }
    if end - idle_from > length {
        breaks.push(AxisBreak {
            start: idle_from,
            end,
            kept,
        });
    }
    breaks
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    use super::{AxisBreak, Canvas, TimeAxis};
    use crate::pulse::{Channel, Constant, PulseInstruction, Schedule};
    use crate::units::TimeUnit;
    use crate::visualization::pulse::{
        device::DeviceInfo, drawings::DataKind, DrawError, DrawOptions, StylePreset, Stylesheet,
    };

    fn play(duration: u64, amp: f64, channel: Channel) -> PulseInstruction {
        PulseInstruction::play(
            Constant {
                duration,
                amp,
                angle: 0.0,
            },
            channel,
        )
    }

    fn schedule() -> Schedule {
        let mut schedule = Schedule::new("test");
        schedule.append(play(100, 0.5, Channel::Drive(0))).unwrap();
        schedule
            .insert(5100, play(100, 0.2, Channel::Drive(0)))
            .unwrap();
        schedule
            .insert(
                0,
                PulseInstruction::Acquire {
                    duration: 50,
                    channel: Channel::Acquire(0),
                    mem_slot: Some(0),
                },
            )
            .unwrap();
        schedule
    }

    #[test]
    fn charts_follow_layout_and_visibility() {
        let canvas = Canvas::new(&schedule(), &DrawOptions::default()).unwrap();
        let channels = canvas
            .charts
            .iter()
            .flat_map(|chart| chart.channels.clone())
            .collect::<Vec<_>>();
        assert_eq!(channels, vec![Channel::Drive(0), Channel::Acquire(0)]);

        let simple = DrawOptions::default().with_style(Stylesheet::preset(StylePreset::IqxSimple));
        let canvas = Canvas::new(&schedule(), &simple).unwrap();
        assert_eq!(canvas.charts.len(), 1);
        assert_eq!(canvas.title, None);

        let disabled = DrawOptions::default().with_disabled_channels(vec![Channel::Acquire(0)]);
        let canvas = Canvas::new(&schedule(), &disabled).unwrap();
        assert_eq!(canvas.charts.len(), 1);
        assert_eq!(
            canvas.title.as_deref(),
            Some("Name: test, Duration: 5200 dt")
        );
    }

    #[test]
    fn auto_scaling() {
        let canvas = Canvas::new(&schedule(), &DrawOptions::default()).unwrap();
        assert_relative_eq!(canvas.charts[0].scale, 2.0);

        let fixed = DrawOptions::default().with_style(Stylesheet::preset(StylePreset::IqxDebugging));
        let canvas = Canvas::new(&schedule(), &fixed).unwrap();
        assert_relative_eq!(canvas.charts[0].scale, 1.0);
        assert!(canvas.time.breaks.is_empty());
    }

    #[test]
    fn long_idle_time_is_broken() {
        let canvas = Canvas::new(&schedule(), &DrawOptions::default()).unwrap();
        assert_eq!(
            canvas.time.breaks,
            vec![AxisBreak {
                start: 100.0,
                end: 5100.0,
                kept: 1000.0
            }]
        );
        assert_relative_eq!(canvas.time.position(5100.0), 1100.0);
        assert_relative_eq!(canvas.time.position(2600.0), 600.0);
        assert_relative_eq!(canvas.time.length(), 1200.0);
    }

    #[test]
    fn instructions_after_the_time_range_do_not_break_the_axis() {
        let options = DrawOptions::default().with_time_range(0.0, 1000.0);
        let canvas = Canvas::new(&schedule(), &options).unwrap();
        assert!(canvas.time.breaks.is_empty());
        assert_relative_eq!(canvas.time.length(), 1000.0);
        assert_relative_eq!(canvas.time.position(1000.0), 1000.0);
    }

    #[test]
    fn ticks_skip_breaks() {
        let time = TimeAxis {
            start: 0.0,
            end: 1000.0,
            breaks: vec![AxisBreak {
                start: 100.0,
                end: 900.0,
                kept: 100.0,
            }],
            unit: TimeUnit::Dt,
            unit_per_sample: 1.0,
        };
        let ticks = time.ticks(10);
        assert_eq!(
            ticks,
            vec![
                (0.0, "0".to_owned()),
                (100.0, "100".to_owned()),
                (200.0, "900".to_owned()),
                (300.0, "1000".to_owned())
            ]
        );
    }

    #[test]
    fn si_units_need_dt() {
        let options = DrawOptions::default().with_time_unit(TimeUnit::Nanoseconds);
        assert!(matches!(
            Canvas::new(&schedule(), &options),
            Err(DrawError::MissingDt {
                unit: TimeUnit::Nanoseconds
            })
        ));

        let options = options.with_device(DeviceInfo::default().with_dt(0.5e-9));
        let canvas = Canvas::new(&schedule(), &options).unwrap();
        assert_eq!(
            canvas.title.as_deref(),
            Some("Name: test, Duration: 2600 ns")
        );
    }

    #[test]
    fn time_range() {
        let options = DrawOptions::default().with_time_range(0.0, 50.0);
        let canvas = Canvas::new(&schedule(), &options).unwrap();
        assert!(canvas.charts[0]
            .drawings
            .iter()
            .filter(|drawing| drawing.kind == DataKind::WaveformReal)
            .all(|drawing| drawing.time_extent().unwrap().0 < 50.0));

        let backwards = DrawOptions::default().with_time_range(50.0, 10.0);
        assert!(matches!(
            Canvas::new(&schedule(), &backwards),
            Err(DrawError::InvalidTimeRange { start, end }) if start == 50.0 && end == 10.0
        ));
    }

    #[test]
    fn empty_schedule() {
        assert!(matches!(
            Canvas::new(&Schedule::new("empty"), &DrawOptions::default()),
            Err(DrawError::EmptySchedule)
        ));
    }
}
