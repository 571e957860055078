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

//! Pulse envelopes, either as explicit samples or as one of a few parametric shapes.

use ndarray::Array;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::PulseError;

const J: Complex64 = Complex64::new(0f64, 1f64);

/// Sampled amplitudes may exceed one by this much, to allow for rounding in their source.
const AMPLITUDE_TOLERANCE: f64 = 1e-7;

/// A Gaussian centered at `center` with width `sigma`, shifted and rescaled so that it is zero
/// at `zero_at` and still one at its center.
fn lifted_gaussian(time: f64, center: f64, zero_at: f64, sigma: f64) -> f64 {
    let gaussian = |t: f64| (-0.5 * ((t - center) / sigma).powi(2)).exp();
    let offset = gaussian(zero_at);
    (gaussian(time) - offset) / (1.0 - offset)
}

/// Sample a shape at the midpoint of each of its `duration` samples.
fn sample(duration: u64, envelope: impl Fn(f64) -> Complex64) -> Vec<Complex64> {
    let times = Array::<f64, _>::range(0f64, duration as f64, 1f64) + 0.5;
    times.mapv(envelope).to_vec()
}

fn check_amplitude(amp: f64) -> Result<(), PulseError> {
    if amp.is_finite() && amp.abs() <= 1.0 {
        Ok(())
    } else {
        Err(PulseError::AmplitudeTooLarge(amp))
    }
}

fn check_sigma(sigma: f64) -> Result<(), PulseError> {
    if sigma.is_finite() && sigma > 0.0 {
        Ok(())
    } else {
        Err(PulseError::InvalidParameter {
            name: "sigma",
            value: sigma,
        })
    }
}

/// A parametric pulse whose envelope is computed from a few numbers.
pub trait ParametricShape {
    fn duration(&self) -> u64;

    /// The complex amplitude at `time`, measured in samples from the start of the pulse.
    fn envelope(&self, time: f64) -> Complex64;

    /// The parameters of this shape, by name, for display.
    fn parameters(&self) -> Vec<(&'static str, f64)>;

    fn validate(&self) -> Result<(), PulseError>;

    fn samples(&self) -> Vec<Complex64> {
        sample(self.duration(), |time| self.envelope(time))
    }
}

/// A Gaussian, lifted so that it starts and ends at zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    /// Length of the pulse in samples
    pub duration: u64,
    /// Peak magnitude
    pub amp: f64,
    /// Standard deviation in samples
    pub sigma: f64,
    /// Rotation of the pulse in the IQ plane, in radians
    #[serde(default)]
    pub angle: f64,
}

impl ParametricShape for Gaussian {
    fn duration(&self) -> u64 {
        self.duration
    }

    fn envelope(&self, time: f64) -> Complex64 {
        let duration = self.duration as f64;
        let gaussian = lifted_gaussian(time, duration / 2.0, duration + 1.0, self.sigma);
        self.amp * (J * self.angle).exp() * gaussian
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("duration", self.duration as f64),
            ("amp", self.amp),
            ("sigma", self.sigma),
            ("angle", self.angle),
        ]
    }

    fn validate(&self) -> Result<(), PulseError> {
        check_amplitude(self.amp)?;
        check_sigma(self.sigma)
    }
}

/// A flat top of length `width` with lifted Gaussian rising and falling edges.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianSquare {
    pub duration: u64,
    pub amp: f64,
    pub sigma: f64,
    /// Length of the flat top in samples
    pub width: f64,
    #[serde(default)]
    pub angle: f64,
}

impl ParametricShape for GaussianSquare {
    fn duration(&self) -> u64 {
        self.duration
    }

    fn envelope(&self, time: f64) -> Complex64 {
        let duration = self.duration as f64;
        let center = duration / 2.0;
        let rise_end = center - self.width / 2.0;
        let fall_start = center + self.width / 2.0;
        let magnitude = if time <= rise_end {
            lifted_gaussian(time, rise_end, -1.0, self.sigma)
        } else if time >= fall_start {
            lifted_gaussian(time, fall_start, duration + 1.0, self.sigma)
        } else {
            1.0
        };
        self.amp * (J * self.angle).exp() * magnitude
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("duration", self.duration as f64),
            ("amp", self.amp),
            ("sigma", self.sigma),
            ("width", self.width),
            ("angle", self.angle),
        ]
    }

    fn validate(&self) -> Result<(), PulseError> {
        check_amplitude(self.amp)?;
        check_sigma(self.sigma)?;
        if self.width.is_finite() && (0.0..=self.duration as f64).contains(&self.width) {
            Ok(())
        } else {
            Err(PulseError::InvalidParameter {
                name: "width",
                value: self.width,
            })
        }
    }
}

/// A Gaussian with a DRAG correction: an imaginary component proportional to the derivative of
/// the Gaussian, scaled by `beta`.
///
/// See Motzoi F. et al., Phys. Rev. Lett., 103 (2009) 110501. for details.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drag {
    pub duration: u64,
    pub amp: f64,
    pub sigma: f64,
    /// DRAG parameter - controls strength of the imaginary term
    pub beta: f64,
    #[serde(default)]
    pub angle: f64,
}

impl ParametricShape for Drag {
    fn duration(&self) -> u64 {
        self.duration
    }

    fn envelope(&self, time: f64) -> Complex64 {
        let duration = self.duration as f64;
        let center = duration / 2.0;
        let gaussian = lifted_gaussian(time, center, duration + 1.0, self.sigma);
        let derivative = -(time - center) / self.sigma.powi(2)
            * (-0.5 * ((time - center) / self.sigma).powi(2)).exp();
        self.amp * (J * self.angle).exp() * (gaussian + J * self.beta * derivative)
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("duration", self.duration as f64),
            ("amp", self.amp),
            ("sigma", self.sigma),
            ("beta", self.beta),
            ("angle", self.angle),
        ]
    }

    fn validate(&self) -> Result<(), PulseError> {
        check_amplitude(self.amp)?;
        check_sigma(self.sigma)?;
        if self.beta.is_finite() {
            Ok(())
        } else {
            Err(PulseError::InvalidParameter {
                name: "beta",
                value: self.beta,
            })
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub duration: u64,
    pub amp: f64,
    #[serde(default)]
    pub angle: f64,
}

impl ParametricShape for Constant {
    fn duration(&self) -> u64 {
        self.duration
    }

    fn envelope(&self, _time: f64) -> Complex64 {
        self.amp * (J * self.angle).exp()
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("duration", self.duration as f64),
            ("amp", self.amp),
            ("angle", self.angle),
        ]
    }

    fn validate(&self) -> Result<(), PulseError> {
        check_amplitude(self.amp)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum WaveformShape {
    Sampled { samples: Vec<Complex64> },
    Gaussian(Gaussian),
    GaussianSquare(GaussianSquare),
    Drag(Drag),
    Constant(Constant),
}

impl WaveformShape {
    fn parametric(&self) -> Option<&dyn ParametricShape> {
        match self {
            Self::Sampled { .. } => None,
            Self::Gaussian(shape) => Some(shape),
            Self::GaussianSquare(shape) => Some(shape),
            Self::Drag(shape) => Some(shape),
            Self::Constant(shape) => Some(shape),
        }
    }

    /// The name of the shape, such as `Gaussian`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sampled { .. } => "Waveform",
            Self::Gaussian(_) => "Gaussian",
            Self::GaussianSquare(_) => "GaussianSquare",
            Self::Drag(_) => "Drag",
            Self::Constant(_) => "Constant",
        }
    }
}

/// The envelope of a pulse played on a channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub shape: WaveformShape,
}

impl Waveform {
    pub fn sampled(samples: Vec<Complex64>) -> Self {
        WaveformShape::Sampled { samples }.into()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Length of the waveform in samples.
    pub fn duration(&self) -> u64 {
        match &self.shape {
            WaveformShape::Sampled { samples } => samples.len() as u64,
            shape => shape
                .parametric()
                .map(|shape| shape.duration())
                .unwrap_or_default(),
        }
    }

    pub fn samples(&self) -> Vec<Complex64> {
        match &self.shape {
            WaveformShape::Sampled { samples } => samples.clone(),
            shape => shape
                .parametric()
                .map(|shape| shape.samples())
                .unwrap_or_default(),
        }
    }

    /// The parameters of a parametric waveform; empty for sampled ones.
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        self.shape
            .parametric()
            .map(|shape| shape.parameters())
            .unwrap_or_default()
    }

    /// The waveform's own name, or else the name of its shape.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.shape.kind())
    }

    pub fn is_parametric(&self) -> bool {
        self.shape.parametric().is_some()
    }

    /// Check that the waveform's amplitude never exceeds one and that its parameters make sense.
    pub fn validate(&self) -> Result<(), PulseError> {
        match &self.shape {
            WaveformShape::Sampled { samples } => {
                match samples
                    .iter()
                    .map(|sample| sample.norm())
                    .find(|norm| !norm.is_finite() || *norm > 1.0 + AMPLITUDE_TOLERANCE)
                {
                    Some(norm) => Err(PulseError::AmplitudeTooLarge(norm)),
                    None => Ok(()),
                }
            }
            shape => shape
                .parametric()
                .map(|shape| shape.validate())
                .unwrap_or(Ok(())),
        }
    }
}

impl From<WaveformShape> for Waveform {
    fn from(shape: WaveformShape) -> Self {
        Self { name: None, shape }
    }
}

macro_rules! impl_from_shape {
    ($($shape: ident),*) => {
        $(
            impl From<$shape> for Waveform {
                fn from(shape: $shape) -> Self {
                    WaveformShape::$shape(shape).into()
                }
            }
        )*
    };
}

impl_from_shape!(Gaussian, GaussianSquare, Drag, Constant);
