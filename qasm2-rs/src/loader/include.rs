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

use std::path::{Path, PathBuf};

use tracing::debug;

use super::LoadOptions;

/// Where the directory containing the file passed to [`load`](super::load) goes in the list of
/// directories searched for included files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum IncludeInputDirectory {
    /// Search the input's directory after the configured include path.
    #[default]
    Append,
    /// Search the input's directory before the configured include path.
    Prepend,
    /// Do not search the input's directory.
    Ignore,
}

/// The directories to search for included files, in order.
pub(crate) fn search_path(options: &LoadOptions, input_directory: Option<&Path>) -> Vec<PathBuf> {
    let mut path = options.include_path.clone();
    if let Some(directory) = input_directory {
        match options.include_input_directory {
            IncludeInputDirectory::Append => path.push(directory.to_path_buf()),
            IncludeInputDirectory::Prepend => path.insert(0, directory.to_path_buf()),
            IncludeInputDirectory::Ignore => {}
        }
    }
    path
}

/// Find an included file. An absolute `name` is used as is; otherwise the first directory of
/// `search_path` containing it wins.
pub(crate) fn resolve(name: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let found = search_path
        .iter()
        .map(|directory| directory.join(candidate))
        .find(|path| path.is_file());
    debug!(include = name, found = ?found, "resolved include");
    found
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use rstest::rstest;

    use super::{resolve, search_path, IncludeInputDirectory};
    use crate::loader::LoadOptions;

    #[rstest]
    #[case(IncludeInputDirectory::Append, vec!["a", "b", "input"])]
    #[case(IncludeInputDirectory::Prepend, vec!["input", "a", "b"])]
    #[case(IncludeInputDirectory::Ignore, vec!["a", "b"])]
    fn orders_search_path(#[case] policy: IncludeInputDirectory, #[case] expected: Vec<&str>) {
        let options = LoadOptions::default()
            .with_include_path(["a", "b"])
            .with_include_input_directory(policy);
        assert_eq!(
            search_path(&options, Some(&PathBuf::from("input"))),
            expected.into_iter().map(PathBuf::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn first_match_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("lib.inc"), "").unwrap();
        fs::write(first.path().join("other.inc"), "").unwrap();
        let path = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            resolve("lib.inc", &path),
            Some(second.path().join("lib.inc"))
        );
        assert_eq!(resolve("missing.inc", &path), None);

        fs::write(first.path().join("lib.inc"), "").unwrap();
        assert_eq!(resolve("lib.inc", &path), Some(first.path().join("lib.inc")));
    }
}
