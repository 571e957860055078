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

//! Rust tooling for [OpenQASM 2](https://arxiv.org/abs/1707.03429) circuits and pulse schedules.
//!
//! Within this crate you'll find:
//!
//! * A [parser] and [serializer] for the OpenQASM 2 language
//! * A [loader] which checks programs and turns them into flat [circuits], with
//!   [`load`] and [`loads`] as its entry points
//! * Conversion of circuits to and from a [DAG], and [time-unit conversion] of their delays
//! * A model of [pulse schedules] and a [drawer] which renders them as SVG
//!
//! [circuits]: crate::circuit::Circuit
//! [DAG]: crate::dag::CircuitDag
//! [drawer]: crate::visualization::pulse::draw
//! [loader]: crate::loader
//! [parser]: crate::program::Program#method.parse
//! [pulse schedules]: crate::pulse::Schedule
//! [serializer]: crate::circuit::Circuit#method.dumps
//! [time-unit conversion]: crate::scheduling::TimeUnitConversion

pub mod circuit;
pub mod dag;
pub mod expression;
pub mod loader;
pub(crate) mod parser;
pub mod program;
pub mod pulse;
pub mod qasm;
pub mod scheduling;
pub mod units;
pub mod visualization;

pub use circuit::Circuit;
pub use loader::{load, loads, CustomInstruction, LoadError, LoadOptions};
pub use program::Program;
pub use visualization::pulse::{draw, DrawOptions, Figure};
