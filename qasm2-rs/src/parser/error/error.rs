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

use std::convert::Infallible;
use std::fmt;

use crate::parser::error::kind::ErrorKind;
use crate::parser::error::{ErrorInput, GenericParseError, InternalError};
use crate::program::SourceLocation;

type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure to lex or parse OpenQASM source, with the place in the source where it happened.
///
/// `{}` formats this error alone. `{:#}` also lists every error which led to it, innermost
/// last, which is usually the more useful form to show a user.
#[derive(Debug)]
pub struct Error<E = Infallible>
where
    E: std::error::Error + Send,
{
    location: SourceLocation,
    excerpt: String,
    kind: ErrorKind<E>,
    cause: Option<Cause>,
}

impl<E> Error<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    pub(crate) fn at<I: ErrorInput>(input: &I, kind: ErrorKind<E>) -> Self {
        Self {
            location: input.location(),
            excerpt: input.excerpt(),
            kind,
            cause: None,
        }
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    /// What went wrong, unless the failure came from deep within the parser combinators.
    pub fn kind(&self) -> Option<&E> {
        match &self.kind {
            ErrorKind::Internal(_) => None,
            ErrorKind::Other(kind) => Some(kind),
        }
    }

    pub(crate) fn caused_by<C>(mut self, cause: C) -> Self
    where
        C: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl<I, E> From<InternalError<I, E>> for Error<E>
where
    I: ErrorInput,
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(internal: InternalError<I, E>) -> Self {
        let error = Self::at(&internal.input, internal.kind);
        match internal.cause {
            Some(cause) => error.caused_by(Self::from(*cause)),
            None => error,
        }
    }
}

impl<E> PartialEq for Error<E>
where
    E: std::error::Error + PartialEq + Send,
{
    fn eq(&self, other: &Self) -> bool {
        let causes_match = match (&self.cause, &other.cause) {
            (Some(left), Some(right)) => left.to_string() == right.to_string(),
            (left, right) => left.is_none() && right.is_none(),
        };
        self.location == other.location
            && self.excerpt == other.excerpt
            && self.kind == other.kind
            && causes_match
    }
}

impl<E> fmt::Display for Error<E>
where
    ErrorKind<E>: fmt::Display,
    E: std::error::Error + Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} near {}: {}", self.location, self.excerpt, self.kind)?;
        if f.alternate() {
            let mut cause = self
                .cause
                .as_deref()
                .map(|cause| cause as &(dyn std::error::Error + 'static));
            while let Some(error) = cause {
                // Nested errors of this type print their own location.
                write!(f, "\n\tcaused by {error}")?;
                cause = error.source();
            }
        }
        Ok(())
    }
}

impl<E> std::error::Error for Error<E>
where
    E: std::error::Error + Send,
    Self: fmt::Display + fmt::Debug,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl<I, E> nom::error::ParseError<I> for Error<E>
where
    I: ErrorInput,
    E: std::error::Error + Send + Sync + 'static,
{
    fn from_error_kind(input: I, kind: nom::error::ErrorKind) -> Self {
        Self::at(&input, ErrorKind::Internal(GenericParseError::new(kind)))
    }

    fn append(_input: I, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}
