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

//! Building and running tests against RMA runtimes and race detectors.
//!
//! Each [Target] constructs an [Adapter], which runs a test in two
//! phases. [Adapter::run] builds and executes the test inside its
//! [TestDir], and [Adapter::classify] turns what happened into a
//! [Verdict].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rmarace_lib::config::{Config, MustConfig, ParcoachConfig, RuntimeConfig, Tool};
use rmarace_lib::log;
use rmarace_lib::metadata::Test;
use rmarace_lib::model::Model;

use crate::classify::{Detector, LocationFormat, Outcome, Verdict};
use crate::exec::{Execution, RunStatus, TestDir};

const MUST_DETECTOR: Detector = Detector::new("data race", LocationFormat::FileLine);
const PARCOACH_STATIC_DETECTOR: Detector = Detector::new("LocalConcurrency detected", LocationFormat::Line);
const PARCOACH_DYNAMIC_DETECTOR: Detector =
    Detector::new("Error when inserting memory access", LocationFormat::FileLine);

/// Output recorded when every attempt at a run timed out.
pub const TIMEOUT_OUTPUT: &str = "timeout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// The target does not handle this kind of test.
    Skipped,
    BuildFailed(Execution),
    Completed(Execution),
}

pub trait Adapter: Sync {
    fn run(&self, test: &Test, dir: &mut TestDir) -> Run;

    fn classify(&self, test: &Test, run: &Run) -> Verdict;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Runtime(Model),
    Must,
    ParcoachStatic,
    ParcoachDynamic,
}

impl Target {
    pub const TOOLS: [Target; 3] = [Target::Must, Target::ParcoachStatic, Target::ParcoachDynamic];

    pub fn as_str(self) -> &'static str {
        match self {
            Target::Runtime(model) => model.as_str(),
            Target::Must => "MUST",
            Target::ParcoachStatic => "PARCOACH-static",
            Target::ParcoachDynamic => "PARCOACH-dynamic",
        }
    }

    pub fn is_tool(self) -> bool {
        !matches!(self, Target::Runtime(_))
    }

    pub fn adapter<'a>(self, config: &'a Config) -> Result<Box<dyn Adapter + 'a>, String> {
        let timeout = config.timeouts.default;
        Ok(match self {
            Target::Runtime(model) => {
                let runtime =
                    config.runtimes.get(&model).ok_or_else(|| format!("No runtime configured for {}", model))?;
                Box::new(RuntimeAdapter { runtime, timeout })
            }
            Target::Must => Box::new(MustAdapter { must: &config.must, timeout }),
            Target::ParcoachStatic => Box::new(ParcoachStaticAdapter { parcoach: &config.parcoach, timeout }),
            Target::ParcoachDynamic => Box::new(ParcoachDynamicAdapter {
                parcoach: &config.parcoach,
                build_timeout: timeout,
                run_timeout: config.timeouts.parcoach_dynamic,
                retries: config.timeouts.parcoach_dynamic_retries,
            }),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MUST" => Ok(Target::Must),
            "PARCOACH-static" => Ok(Target::ParcoachStatic),
            "PARCOACH-dynamic" => Ok(Target::ParcoachDynamic),
            _ => match s.parse::<Model>() {
                Ok(model) => Ok(Target::Runtime(model)),
                Err(_) => Err(format!("Unknown tool or model {}", s)),
            },
        }
    }
}

/// `<launcher> <options...> -np <nprocs> <binary>`
fn launch(launcher: &Tool, nprocs: u32, binary: &str) -> Vec<String> {
    let nprocs = nprocs.to_string();
    launcher.argv(["-np", nprocs.as_str(), binary])
}

/// Run each build step in turn, stopping at the first failure.
fn build(dir: &mut TestDir, steps: &[Vec<String>], timeout: Duration) -> Result<(), Execution> {
    for step in steps {
        let execution = dir.run(step, timeout);
        if !execution.succeeded() {
            return Err(execution);
        }
    }
    Ok(())
}

/// Grade a detector run. A failed build is a crash unless it timed
/// out.
fn grade(detector: &Detector, test: &Test, run: &Run) -> Verdict {
    Verdict::Graded(match run {
        Run::Skipped => Outcome::Unsupported,
        Run::BuildFailed(execution) if execution.timed_out() => Outcome::Timeout,
        Run::BuildFailed(_) => Outcome::Crash,
        Run::Completed(execution) => detector.classify(&execution.output, execution.timed_out(), test),
    })
}

struct RuntimeAdapter<'a> {
    runtime: &'a RuntimeConfig,
    timeout: Duration,
}

impl<'a> Adapter for RuntimeAdapter<'a> {
    fn run(&self, test: &Test, dir: &mut TestDir) -> Run {
        let source = dir.source().display().to_string();
        let binary = dir.artifact(".exe");
        let compile = self.runtime.compiler.argv([source.as_str(), "-o", binary.as_str()]);
        if let Err(execution) = build(dir, &[compile], self.timeout) {
            println!("Compilation failed");
            return Run::BuildFailed(execution);
        }
        let execution = dir.run(&launch(&self.runtime.launcher, test.nprocs, &binary), self.timeout);
        if !execution.succeeded() {
            println!("Run failed")
        }
        Run::Completed(execution)
    }

    fn classify(&self, _: &Test, run: &Run) -> Verdict {
        match run {
            Run::Skipped => Verdict::Graded(Outcome::Unsupported),
            Run::BuildFailed(execution) | Run::Completed(execution) => Verdict::Plain(execution.status),
        }
    }
}

struct MustAdapter<'a> {
    must: &'a MustConfig,
    timeout: Duration,
}

impl<'a> Adapter for MustAdapter<'a> {
    fn run(&self, test: &Test, dir: &mut TestDir) -> Run {
        let source = dir.source().display().to_string();
        let binary = dir.artifact(".exe-must");
        let compile = self.must.compiler.argv([source.as_str(), "-o", binary.as_str()]);
        if let Err(execution) = build(dir, &[compile], self.timeout) {
            println!("Compilation failed");
            return Run::BuildFailed(execution);
        }
        Run::Completed(dir.run(&launch(&self.must.runner, test.nprocs, &binary), self.timeout))
    }

    fn classify(&self, test: &Test, run: &Run) -> Verdict {
        grade(&MUST_DETECTOR, test, run)
    }
}

struct ParcoachStaticAdapter<'a> {
    parcoach: &'a ParcoachConfig,
    timeout: Duration,
}

impl<'a> Adapter for ParcoachStaticAdapter<'a> {
    fn run(&self, test: &Test, dir: &mut TestDir) -> Run {
        // The static analysis only finds races local to a process
        if test.basename.contains("remote") {
            return Run::Skipped;
        }
        let source = dir.source().display().to_string();
        let ir = dir.artifact(".ll");
        let instrumented = dir.artifact("-instrumented.ll");
        let emit = self.parcoach.emit_llvm.argv([source.as_str(), "-o", ir.as_str()]);
        if let Err(execution) = build(dir, &[emit], self.timeout) {
            println!("Compilation failed");
            return Run::BuildFailed(execution);
        }
        let analyze = self.parcoach.analyzer.argv([ir.as_str(), "-o", instrumented.as_str()]);
        Run::Completed(dir.run(&analyze, self.timeout))
    }

    fn classify(&self, test: &Test, run: &Run) -> Verdict {
        grade(&PARCOACH_STATIC_DETECTOR, test, run)
    }
}

struct ParcoachDynamicAdapter<'a> {
    parcoach: &'a ParcoachConfig,
    build_timeout: Duration,
    run_timeout: Duration,
    retries: usize,
}

impl<'a> Adapter for ParcoachDynamicAdapter<'a> {
    fn run(&self, test: &Test, dir: &mut TestDir) -> Run {
        let source = dir.source().display().to_string();
        let ir = dir.artifact(".ll");
        let instrumented = dir.artifact("-instrumented.ll");
        let binary = dir.artifact("-instrumented.exe");

        let mut link = self.parcoach.linker.argv([instrumented.as_str(), "-o", binary.as_str()]);
        link.extend(self.parcoach.runtime.iter().cloned());
        let steps = [
            self.parcoach.emit_llvm.argv([source.as_str(), "-o", ir.as_str()]),
            self.parcoach.analyzer.argv([ir.as_str(), "-o", instrumented.as_str()]),
            link,
        ];
        if let Err(execution) = build(dir, &steps, self.build_timeout) {
            println!("Compilation failed");
            return Run::BuildFailed(execution);
        }

        // The instrumented program sometimes hangs, so timeouts are retried
        let argv = launch(&self.parcoach.launcher, test.nprocs, &binary);
        for attempt in 0..self.retries {
            let execution = dir.run(&argv, self.run_timeout);
            if !execution.timed_out() {
                return Run::Completed(execution);
            }
            log!(log::RUN, &format!("{}: attempt {} timed out", test.basename, attempt + 1));
            println!("PARCOACH TIMEOUT, retry")
        }
        Run::Completed(Execution { output: TIMEOUT_OUTPUT.to_string(), status: RunStatus::Timeout })
    }

    fn classify(&self, test: &Test, run: &Run) -> Verdict {
        grade(&PARCOACH_DYNAMIC_DETECTOR, test, run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_names() {
        for target in Target::TOOLS {
            assert_eq!(target.as_str().parse::<Target>(), Ok(target));
            assert!(target.is_tool())
        }
        for model in Model::ALL {
            assert_eq!(model.as_str().parse::<Target>(), Ok(Target::Runtime(model)))
        }
        assert!("TSAN".parse::<Target>().is_err())
    }

    #[test]
    fn test_launch_argv() {
        let runner = Tool::parse("mustrun --must:tsan --must:rma").unwrap();
        assert_eq!(launch(&runner, 3, "a.exe"), vec!["mustrun", "--must:tsan", "--must:rma", "-np", "3", "a.exe"])
    }

    #[test]
    fn test_failed_build_grading() {
        let test = Test {
            filename: "x-local-yes.c".into(),
            basename: "x-local-yes.c".to_string(),
            truth: rmarace_lib::metadata::GroundTruth::NoRace,
            description: String::new(),
            nprocs: 2,
        };
        let crashed = Run::BuildFailed(Execution { output: String::new(), status: RunStatus::Crash });
        let hung = Run::BuildFailed(Execution { output: String::new(), status: RunStatus::Timeout });
        assert_eq!(grade(&MUST_DETECTOR, &test, &crashed), Verdict::Graded(Outcome::Crash));
        assert_eq!(grade(&MUST_DETECTOR, &test, &hung), Verdict::Graded(Outcome::Timeout));
        assert_eq!(grade(&MUST_DETECTOR, &test, &Run::Skipped), Verdict::Graded(Outcome::Unsupported))
    }
}
