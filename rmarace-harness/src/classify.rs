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

//! Grading a race detector's output against a test's ground truth.
//!
//! Every detector is graded by the same decision table. A detector only
//! supplies the string it prints when it reports a race, and the way
//! it writes source locations.

use std::fmt;
use std::str::FromStr;

use rmarace_lib::log;
use rmarace_lib::metadata::{GroundTruth, Test};

use crate::exec::RunStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    TruePositive,
    FalsePositive,
    TrueNegative,
    FalseNegative,
    Timeout,
    Crash,
    Unsupported,
}

impl Outcome {
    pub const ALL: [Outcome; 7] = [
        Outcome::TruePositive,
        Outcome::FalsePositive,
        Outcome::TrueNegative,
        Outcome::FalseNegative,
        Outcome::Timeout,
        Outcome::Crash,
        Outcome::Unsupported,
    ];

    pub fn as_str(self) -> &'static str {
        use Outcome::*;
        match self {
            TruePositive => "TP",
            FalsePositive => "FP",
            TrueNegative => "TN",
            FalseNegative => "FN",
            Timeout => "TO",
            Crash => "CR",
            Unsupported => "-",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Outcome::ALL.iter().copied().find(|outcome| outcome.as_str() == s).ok_or_else(|| format!("Unknown outcome {}", s))
    }
}

/// What a single test run amounts to. Detectors are graded, while runs
/// against a plain runtime just report how the run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Graded(Outcome),
    Plain(RunStatus),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Verdict::Graded(outcome) => outcome.fmt(f),
            Verdict::Plain(status) => status.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationFormat {
    /// `<basename>:<line>`
    FileLine,
    /// `LINE <line>`
    Line,
}

impl LocationFormat {
    pub fn render(self, basename: &str, line: usize) -> String {
        match self {
            LocationFormat::FileLine => format!("{}:{}", basename, line),
            LocationFormat::Line => format!("LINE {}", line),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Detector {
    /// Present in the output whenever the detector reports a race.
    pub indicator: &'static str,
    pub locations: LocationFormat,
}

impl Detector {
    pub const fn new(indicator: &'static str, locations: LocationFormat) -> Self {
        Detector { indicator, locations }
    }

    pub fn classify(&self, output: &str, timed_out: bool, test: &Test) -> Outcome {
        classify(self, output, timed_out, test)
    }
}

pub fn classify(detector: &Detector, output: &str, timed_out: bool, test: &Test) -> Outcome {
    if timed_out {
        return Outcome::Timeout;
    }

    let reported = output.contains(detector.indicator);
    let outcome = match &test.truth {
        GroundTruth::Race(detail) if reported => {
            let mut found = true;
            for line in [detail.race_loc1, detail.race_loc2] {
                let location = detector.locations.render(&test.basename, line);
                if !output.contains(&location) {
                    println!("Could not find {}", location);
                    found = false;
                    break;
                }
            }
            if found {
                Outcome::TruePositive
            } else {
                Outcome::FalseNegative
            }
        }
        GroundTruth::Race(_) => Outcome::FalseNegative,
        GroundTruth::NoRace if reported => Outcome::FalsePositive,
        GroundTruth::NoRace => Outcome::TrueNegative,
    };
    log!(log::CLASSIFY, &format!("{} ({}): {}", test.basename, detector.indicator, outcome));
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmarace_lib::metadata::RaceDetail;
    use std::path::PathBuf;

    const MUST: Detector = Detector::new("data race", LocationFormat::FileLine);
    const PARCOACH: Detector = Detector::new("LocalConcurrency detected", LocationFormat::Line);

    fn test(truth: GroundTruth) -> Test {
        Test {
            filename: PathBuf::from("MPIRMA/conflict/001-MPI-conflict-put-load-local-yes.c"),
            basename: "001-MPI-conflict-put-load-local-yes.c".to_string(),
            truth,
            description: String::new(),
            nprocs: 2,
        }
    }

    fn racy() -> Test {
        test(GroundTruth::Race(RaceDetail {
            kind: "local".to_string(),
            access_set: vec!["local buffer read".to_string(), "load".to_string()],
            race_pair: ["MPI_Put@41".to_string(), "LOAD@43".to_string()],
            race_loc1: 41,
            race_loc2: 43,
        }))
    }

    #[test]
    fn test_true_positive() {
        let output = "WARNING: data race\n  at 001-MPI-conflict-put-load-local-yes.c:41\n  at 001-MPI-conflict-put-load-local-yes.c:43\n";
        assert_eq!(MUST.classify(output, false, &racy()), Outcome::TruePositive)
    }

    #[test]
    fn test_missing_location_is_false_negative() {
        let output = "WARNING: data race\n  at 001-MPI-conflict-put-load-local-yes.c:41\n";
        assert_eq!(MUST.classify(output, false, &racy()), Outcome::FalseNegative)
    }

    #[test]
    fn test_no_report_is_false_negative() {
        assert_eq!(MUST.classify("all good\n", false, &racy()), Outcome::FalseNegative)
    }

    #[test]
    fn test_race_free() {
        let clean = test(GroundTruth::NoRace);
        assert_eq!(MUST.classify("possible data race at line 12", false, &clean), Outcome::FalsePositive);
        assert_eq!(MUST.classify("finished", false, &clean), Outcome::TrueNegative)
    }

    #[test]
    fn test_indicator_substring_absent() {
        let clean = test(GroundTruth::NoRace);
        let detector = Detector::new("data race detected", LocationFormat::FileLine);
        assert_eq!(detector.classify("no data race found", false, &clean), Outcome::TrueNegative);
        assert_eq!(detector.classify("data race detected at line 12", false, &clean), Outcome::FalsePositive)
    }

    #[test]
    fn test_timeout_wins() {
        let output = "data race 001-MPI-conflict-put-load-local-yes.c:41 001-MPI-conflict-put-load-local-yes.c:43";
        assert_eq!(MUST.classify(output, true, &racy()), Outcome::Timeout);
        assert_eq!(MUST.classify("", true, &test(GroundTruth::NoRace)), Outcome::Timeout)
    }

    #[test]
    fn test_line_locations() {
        let output = "LocalConcurrency detected: conflict with LINE 41 and LINE 43\n";
        assert_eq!(PARCOACH.classify(output, false, &racy()), Outcome::TruePositive);
        let output = "LocalConcurrency detected: conflict with LINE 41 and LINE 44\n";
        assert_eq!(PARCOACH.classify(output, false, &racy()), Outcome::FalseNegative)
    }

    #[test]
    fn test_outcome_names() {
        for outcome in Outcome::ALL {
            assert_eq!(outcome.to_string().parse::<Outcome>(), Ok(outcome))
        }
        assert_eq!(Outcome::Unsupported.to_string(), "-");
        assert!("XX".parse::<Outcome>().is_err())
    }
}
