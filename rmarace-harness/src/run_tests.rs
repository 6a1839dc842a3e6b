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

//! Running a batch of corpus tests against one target with a pool of
//! worker threads.
//!
//! Tests are independent, each gets its own output folder and its own
//! subprocesses, so workers share nothing but the job and result
//! queues. Results are merged into a [ResultTable] once every worker
//! has finished.

use crossbeam::queue::{ArrayQueue, SegQueue};
use crossbeam::thread;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rmarace_lib::log;
use rmarace_lib::metadata::{MetadataError, Test};
use rmarace_lib::model::{Discipline, Model};

use crate::adapter::{Adapter, Target};
use crate::classify::Verdict;
use crate::exec::TestDir;
use crate::results::ResultTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestJob {
    pub file: PathBuf,
    pub discipline: Discipline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub basename: String,
    pub discipline: Discipline,
    pub verdict: Verdict,
}

/// A test that could not be run at all. These are reported, and the
/// rest of the batch carries on.
#[derive(Debug)]
pub enum TestError {
    Metadata(MetadataError),
    Setup(PathBuf, io::Error),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TestError::Metadata(e) => write!(f, "{}", e),
            TestError::Setup(path, e) => write!(f, "Failed to set up output folder for {}: {}", path.display(), e),
        }
    }
}

impl Error for TestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TestError::Metadata(e) => Some(e),
            TestError::Setup(_, e) => Some(e),
        }
    }
}

/// The tests in `<corpus>/<model>/<discipline>/`, in file name order.
/// A missing directory has no tests.
pub fn corpus_jobs(corpus: &Path, model: Model, discipline: Discipline) -> io::Result<Vec<TestJob>> {
    let dir = corpus.join(model.as_str()).join(discipline.as_str());
    if !dir.is_dir() {
        log!(log::VERBOSE, &format!("No tests in {}", dir.display()));
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "c") {
            files.push(path)
        }
    }
    files.sort();
    Ok(files.into_iter().map(|file| TestJob { file, discipline }).collect())
}

fn run_test(job: &TestJob, target: Target, adapter: &dyn Adapter, output: &Path) -> Result<TestResult, TestError> {
    let test = Test::from_file(&job.file).map_err(TestError::Metadata)?;
    log!(log::RUN, &test.basename);
    let mut dir = TestDir::create(output, target.as_str(), job.discipline, &test)
        .map_err(|e| TestError::Setup(job.file.clone(), e))?;
    let run = adapter.run(&test, &mut dir);
    let verdict = adapter.classify(&test, &run);
    println!("{}: {}", test.basename, verdict);
    Ok(TestResult { basename: test.basename, discipline: job.discipline, verdict })
}

/// Run `jobs` against `target` using `num_threads` workers. Results are
/// returned in no particular order.
pub fn run_tests(
    jobs: Vec<TestJob>,
    target: Target,
    adapter: &dyn Adapter,
    output: &Path,
    num_threads: usize,
) -> (Vec<TestResult>, Vec<TestError>) {
    if jobs.is_empty() {
        return (Vec::new(), Vec::new());
    }
    log!(log::VERBOSE, &format!("Running {} tests against {} with {} threads", jobs.len(), target, num_threads));

    let queue = ArrayQueue::new(jobs.len());
    for job in jobs {
        queue.push(job).unwrap();
    }

    let results = SegQueue::new();
    let errors = SegQueue::new();

    let scoped = thread::scope(|scope| {
        for _ in 0..num_threads.max(1) {
            scope.spawn(|_| {
                while let Some(job) = queue.pop() {
                    match run_test(&job, target, adapter, output) {
                        Ok(result) => results.push(result),
                        Err(err) => {
                            eprintln!("{}", err);
                            errors.push(err)
                        }
                    }
                }
            });
        }
    });
    if scoped.is_err() {
        eprintln!("A worker thread panicked while running tests for {}", target)
    }

    let mut collected = Vec::new();
    while let Some(result) = results.pop() {
        collected.push(result)
    }
    let mut failures = Vec::new();
    while let Some(err) = errors.pop() {
        failures.push(err)
    }
    (collected, failures)
}

/// Record `results` in `table` under the column for `target`.
pub fn merge_results(table: &mut ResultTable, target: Target, results: &[TestResult]) {
    table.add_column(target.as_str());
    for result in results {
        table.insert(&result.basename, result.discipline, target.as_str(), result.verdict)
    }
}
