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

use std::fmt;

use nom::Finish;

use crate::parser::{ErrorInput, LexError, ParseError};

use super::SourceLocation;

/// An error in the syntax of an OpenQASM 2 source.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("error while lexing: {0}")]
    LexError(#[from] LexError),
    #[error("error while parsing: {0}")]
    ParseError(#[from] ParseError),
    #[error(transparent)]
    Leftover(#[from] LeftoverError),
}

impl SyntaxError {
    pub fn location(&self) -> SourceLocation {
        match self {
            Self::LexError(err) => err.location(),
            Self::ParseError(err) => err.location(),
            Self::Leftover(err) => err.location,
        }
    }
}

/// The parser returned success, but there was unexpected leftover input.
#[derive(Debug, PartialEq, Eq)]
pub struct LeftoverError {
    location: SourceLocation,
    excerpt: String,
}

impl fmt::Display for LeftoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected input at {} near {}",
            self.location, self.excerpt
        )
    }
}

impl std::error::Error for LeftoverError {}

impl LeftoverError {
    pub(crate) fn new<I>(leftover: I) -> Self
    where
        I: ErrorInput,
    {
        Self {
            location: leftover.location(),
            excerpt: leftover.excerpt(),
        }
    }
}

/// Finish a parse, converting any input left over into an error.
pub(crate) fn disallow_leftover<I, O>(
    result: nom::IResult<I, O, ParseError>,
) -> Result<O, SyntaxError>
where
    I: ErrorInput,
{
    match result.finish() {
        Ok((leftover, parsed)) => {
            if leftover.is_exhausted() {
                Ok(parsed)
            } else {
                Err(LeftoverError::new(leftover).into())
            }
        }
        Err(err) => Err(err.into()),
    }
}
