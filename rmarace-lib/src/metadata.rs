// BSD 2-Clause License
//
// Copyright (c) 2019, 2020 Alasdair Armstrong
//
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
// 1. Redistributions of source code must retain the above copyright
// notice, this list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright
// notice, this list of conditions and the following disclaimer in the
// documentation and/or other materials provided with the distribution.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT
// HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT
// LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE,
// DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY
// THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Ground truth embedded in generated tests.
//!
//! Each test carries a JSON object between `// RACE LABELS BEGIN /*`
//! and `*/ // RACE LABELS END`, for example
//!
//! ```text
//! // RACE LABELS BEGIN
//! /*
//! {
//!     "RACE_KIND": "remote",
//!     "ACCESS_SET": ["rma write","load"],
//!     "RACE_PAIR": ["MPI_Put@56","LOAD@61"],
//!     "NPROCS": 2,
//!     "DESCRIPTION": "..."
//! }
//! */
//! // RACE LABELS END
//! ```
//!
//! A race kind of `none` means the test is race free, in which case
//! the access set and race pair are not required. Keys may repeat, the
//! last occurrence wins.

use regex::Regex;
use serde::de::{self, DeserializeOwned};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const NO_RACE: &str = "none";

#[derive(Debug)]
pub enum MetadataError {
    Io(PathBuf, io::Error),
    MissingDelimiters(PathBuf),
    Json(PathBuf, serde_json::Error),
    InvalidRacePair(PathBuf, String),
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use MetadataError::*;
        match self {
            Io(path, e) => write!(f, "Failed to read {}: {}", path.display(), e),
            MissingDelimiters(path) => write!(f, "No race labels found in {}", path.display()),
            Json(path, e) => write!(f, "Malformed race labels in {}: {}", path.display(), e),
            InvalidRacePair(path, msg) => write!(f, "Invalid race pair in {}: {}", path.display(), msg),
        }
    }
}

impl Error for MetadataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MetadataError::Io(_, e) => Some(e),
            MetadataError::Json(_, e) => Some(e),
            _ => None,
        }
    }
}

/// The decoded label object. Kept as a map rather than a derived
/// struct so that duplicate keys are accepted.
type Labels = Map<String, Value>;

fn field<T: DeserializeOwned>(path: &Path, labels: &Labels, key: &'static str) -> Result<Option<T>, MetadataError> {
    match labels.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            serde_json::from_value(value.clone()).map(Some).map_err(|e| MetadataError::Json(path.to_path_buf(), e))
        }
    }
}

fn required<T: DeserializeOwned>(path: &Path, labels: &Labels, key: &'static str) -> Result<T, MetadataError> {
    field(path, labels, key)?
        .ok_or_else(|| MetadataError::Json(path.to_path_buf(), <serde_json::Error as de::Error>::missing_field(key)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceDetail {
    pub kind: String,
    pub access_set: Vec<String>,
    /// Entries of the form `<call>@<line>`.
    pub race_pair: [String; 2],
    pub race_loc1: usize,
    pub race_loc2: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundTruth {
    NoRace,
    Race(RaceDetail),
}

/// A generated test, as described by its embedded labels.
#[derive(Debug, Clone)]
pub struct Test {
    pub filename: PathBuf,
    pub basename: String,
    pub truth: GroundTruth,
    pub description: String,
    pub nprocs: u32,
}

lazy_static! {
    static ref LABELS: Regex = Regex::new(r"(?s)// RACE LABELS BEGIN\s*/\*(.*?)\*/\s*// RACE LABELS END").unwrap();
}

/// The 1-based line of a `<call>@<line>` entry.
fn race_line(path: &Path, entry: &str) -> Result<usize, MetadataError> {
    match entry.rsplit_once('@') {
        Some((_, line)) => match line.trim().parse::<usize>() {
            Ok(0) | Err(_) => {
                Err(MetadataError::InvalidRacePair(path.to_path_buf(), format!("bad line number in '{}'", entry)))
            }
            Ok(n) => Ok(n),
        },
        None => Err(MetadataError::InvalidRacePair(path.to_path_buf(), format!("expected <call>@<line>, got '{}'", entry))),
    }
}

impl Test {
    /// Parse the labels from the contents of the test at `filename`.
    pub fn parse<P: AsRef<Path>>(filename: P, contents: &str) -> Result<Self, MetadataError> {
        let path = filename.as_ref();
        let payload = LABELS
            .captures(contents)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| MetadataError::MissingDelimiters(path.to_path_buf()))?;
        let labels: Labels =
            serde_json::from_str(payload.as_str().trim()).map_err(|e| MetadataError::Json(path.to_path_buf(), e))?;
        let race_kind: String = required(path, &labels, "RACE_KIND")?;
        let nprocs: u32 = required(path, &labels, "NPROCS")?;
        let description: String = required(path, &labels, "DESCRIPTION")?;

        let truth = if race_kind == NO_RACE {
            GroundTruth::NoRace
        } else {
            let race_pair = match field::<Vec<String>>(path, &labels, "RACE_PAIR")? {
                Some(pair) if pair.len() == 2 => [pair[0].clone(), pair[1].clone()],
                Some(pair) => {
                    return Err(MetadataError::InvalidRacePair(
                        path.to_path_buf(),
                        format!("expected 2 entries, found {}", pair.len()),
                    ))
                }
                None => return Err(MetadataError::InvalidRacePair(path.to_path_buf(), "missing RACE_PAIR".to_string())),
            };
            let race_loc1 = race_line(path, &race_pair[0])?;
            let race_loc2 = race_line(path, &race_pair[1])?;
            if race_loc1 == race_loc2 {
                return Err(MetadataError::InvalidRacePair(
                    path.to_path_buf(),
                    format!("both accesses are on line {}", race_loc1),
                ));
            }
            GroundTruth::Race(RaceDetail {
                kind: race_kind,
                access_set: field(path, &labels, "ACCESS_SET")?.unwrap_or_default(),
                race_pair,
                race_loc1,
                race_loc2,
            })
        };

        Ok(Test {
            filename: path.to_path_buf(),
            basename: path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default(),
            truth,
            description,
            nprocs,
        })
    }

    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self, MetadataError> {
        let path = filename.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| MetadataError::Io(path.to_path_buf(), e))?;
        Test::parse(path, &contents)
    }

    pub fn has_race(&self) -> bool {
        matches!(self.truth, GroundTruth::Race(_))
    }

    pub fn race_kind(&self) -> &str {
        match &self.truth {
            GroundTruth::NoRace => NO_RACE,
            GroundTruth::Race(detail) => &detail.kind,
        }
    }
}
