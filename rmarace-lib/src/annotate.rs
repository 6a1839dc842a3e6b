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

//! Resolution of race locations in rendered tests.
//!
//! Templates put a `// CONFLICT` comment on the line before each of
//! the two racing statements, and leave `{race_loc1}` and
//! `{race_loc2}` placeholders in the metadata block. Once the file has
//! been formatted, the placeholders are replaced by the 1-based line
//! numbers of the statements following the first and second marker.

use crate::log;

pub const CONFLICT_MARKER: &str = "// CONFLICT";
pub const RACE_LOC1: &str = "{race_loc1}";
pub const RACE_LOC2: &str = "{race_loc2}";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Markers {
    pub race_loc1: Option<usize>,
    pub race_loc2: Option<usize>,
    /// Markers found after the second, which are ignored.
    pub surplus: usize,
}

impl Markers {
    pub fn is_complete(&self) -> bool {
        self.race_loc1.is_some() && self.race_loc2.is_some()
    }
}

/// Find the lines following the first two conflict markers.
pub fn locate_markers(code: &str) -> Markers {
    let mut markers = Markers::default();
    for (i, line) in code.lines().enumerate() {
        if !line.contains(CONFLICT_MARKER) {
            continue;
        }
        // The marker's 0-based index plus one is the marker itself in
        // 1-based numbering, so the racing statement is one further.
        let race_loc = i + 2;
        if markers.race_loc1.is_none() {
            markers.race_loc1 = Some(race_loc)
        } else if markers.race_loc2.is_none() {
            markers.race_loc2 = Some(race_loc)
        } else {
            markers.surplus += 1
        }
    }
    markers
}

/// Substitute the race location placeholders in `code`. Tests without
/// a race are returned unchanged. Surplus and missing markers are
/// reported, and a placeholder without a marker is left in place.
pub fn annotate(code: &str, has_race: bool) -> (String, Markers) {
    if !has_race {
        return (code.to_string(), Markers::default());
    }

    let markers = locate_markers(code);
    log!(log::ANNOTATE, &format!("Race locations {:?} {:?}", markers.race_loc1, markers.race_loc2));

    if markers.surplus > 0 {
        eprintln!("ERROR: Found {} more race conflicts than expected", markers.surplus)
    }

    let mut annotated = code.to_string();
    for (placeholder, race_loc) in [(RACE_LOC1, markers.race_loc1), (RACE_LOC2, markers.race_loc2)] {
        match race_loc {
            Some(line) => annotated = annotated.replace(placeholder, &line.to_string()),
            None => eprintln!("ERROR: No conflict marker for {}", placeholder),
        }
    }
    (annotated, markers)
}
