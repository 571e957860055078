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

use crate::parser::lexer::LexInput;
use crate::parser::ParserInput;
use crate::program::SourceLocation;

/// Where an error was raised: the position of the input not yet consumed, and a short excerpt
/// of it to show in messages.
pub(crate) trait ErrorInput {
    fn location(&self) -> SourceLocation;
    fn excerpt(&self) -> String;
    fn is_exhausted(&self) -> bool;
}

/// At most this many characters of source are quoted in an error.
const EXCERPT_CHARS: usize = 24;

impl ErrorInput for LexInput<'_> {
    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.location_line(),
            column: self.get_utf8_column(),
        }
    }

    fn excerpt(&self) -> String {
        let rest = self.fragment();
        let line = rest.lines().next().unwrap_or_default();
        let quoted = line.chars().take(EXCERPT_CHARS).collect::<String>();
        if quoted.len() < rest.len() {
            format!("{quoted:?}...")
        } else {
            format!("{quoted:?}")
        }
    }

    fn is_exhausted(&self) -> bool {
        self.fragment().is_empty()
    }
}

impl ErrorInput for ParserInput<'_> {
    /// Past the last token there is nothing to point at, so the start of the source stands in.
    fn location(&self) -> SourceLocation {
        self.first()
            .map(|token| token.location())
            .unwrap_or(SourceLocation { line: 1, column: 1 })
    }

    fn excerpt(&self) -> String {
        self.first()
            .map_or_else(|| "end of input".to_owned(), |token| token.token().describe())
    }

    fn is_exhausted(&self) -> bool {
        self.is_empty()
    }
}
