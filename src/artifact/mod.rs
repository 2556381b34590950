use std::fs;
use std::path::Path;

use log::{debug, warn};
use regex::{NoExpand, Regex};

use crate::error::{Result, UpdaterError};

/// Naming convention of server builds: `<name>-<build>.<extension>`.
#[derive(Debug, Clone)]
pub struct ArtifactPattern {
    build_file: Regex,
    reference: Regex,
}

impl ArtifactPattern {
    pub fn new(name: &str, extension: &str) -> Self {
        let (n, e) = (regex::escape(name), regex::escape(extension));
        let build_file =
            Regex::new(&format!(r"^{n}-(\d+)\.{e}$")).expect("escaped artifact pattern compiles");
        let reference =
            Regex::new(&format!(r"{n}-\S*?\.{e}")).expect("escaped reference pattern compiles");
        Self {
            build_file,
            reference,
        }
    }

    pub fn paper() -> Self {
        Self::new("paper", "jar")
    }

    /// Build number embedded in `filename`, failing on anything that does not
    /// follow the naming convention.
    pub fn parse_build_number(&self, filename: &str) -> Result<u64> {
        self.build_file
            .captures(filename)
            .and_then(|caps| caps[1].parse().ok())
            .ok_or_else(|| UpdaterError::UnrecognizedArtifact(filename.to_owned()))
    }

    /// Highest build among the entries of `dir`, or `None` if nothing matches.
    pub fn installed_build(&self, dir: &Path) -> Result<Option<u64>> {
        let entries = fs::read_dir(dir)
            .map_err(|e| UpdaterError::io(format!("unable to list {}", dir.display()), e))?;

        let mut names = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => names.push(entry.file_name().to_string_lossy().into_owned()),
                Err(err) => warn!("artifact: skipping unreadable entry in {}: {err}", dir.display()),
            }
        }
        let current = self.newest_build(names.iter().map(String::as_str));
        debug!("artifact: installed build in {} is {current:?}", dir.display());
        Ok(current)
    }

    pub fn newest_build<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Option<u64> {
        names
            .into_iter()
            .filter_map(|name| self.parse_build_number(name).ok())
            .max()
    }

    /// Point every artifact reference in `text` at `filename`.
    /// Returns the rewritten text and how many references were replaced.
    pub fn retarget_references(&self, text: &str, filename: &str) -> (String, usize) {
        let count = self.reference.find_iter(text).count();
        let rewritten = self.reference.replace_all(text, NoExpand(filename));
        (rewritten.into_owned(), count)
    }
}
