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

use super::ErrorKind;

/// A failure inside a `nom` combinator, with no more specific meaning.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("internal parsing error: {0:?}")]
pub struct GenericParseError(nom::error::ErrorKind);

impl GenericParseError {
    pub(crate) fn new(kind: nom::error::ErrorKind) -> Self {
        Self(kind)
    }
}

/// The error type threaded through the combinators. It keeps the input itself rather than its
/// location, which is only worked out once parsing has failed for good.
#[derive(Debug)]
pub(crate) struct InternalError<I, E>
where
    E: std::error::Error,
{
    pub(crate) input: I,
    pub(crate) kind: ErrorKind<E>,
    pub(crate) cause: Option<Box<Self>>,
}

impl<I, E> InternalError<I, E>
where
    E: std::error::Error,
{
    pub(crate) fn from_kind(input: I, kind: E) -> Self {
        Self {
            input,
            kind: ErrorKind::Other(kind),
            cause: None,
        }
    }

    pub(crate) fn caused_by(mut self, cause: Self) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl<I, E> nom::error::ParseError<I> for InternalError<I, E>
where
    E: std::error::Error,
{
    fn from_error_kind(input: I, kind: nom::error::ErrorKind) -> Self {
        Self {
            input,
            kind: ErrorKind::Internal(GenericParseError::new(kind)),
            cause: None,
        }
    }

    fn append(_input: I, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}
