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

use std::fs;
use std::path::PathBuf;
use std::process::exit;
use std::time::Instant;

use rmarace_harness::adapter::Target;
use rmarace_harness::results::ResultTable;
use rmarace_harness::run_tests::{corpus_jobs, merge_results, run_tests};
use rmarace_lib::log;
use rmarace_lib::model::{Discipline, Model};

mod opts;

static FREE: &str = "plain|tools";

fn main() {
    let code = run_main();
    exit(code)
}

fn run_main() -> i32 {
    let mut opts = opts::common_opts();
    opts.optmulti("", "tool", "run tests against this tool in tools mode (repeatable)", "TOOL");
    opts.optmulti("", "discipline", "run tests of this discipline (repeatable)", "DISCIPLINE");
    opts.optmulti("", "rma-model", "run tests for this RMA model in plain mode (repeatable)", "MODEL");
    opts.optopt("o", "output-folder", "write results under this directory", "DIR");
    opts.optopt("t", "threads", "use this many worker threads", "N");
    opts.optopt("", "corpus", "load tests from this corpus directory", "DIR");

    let matches = opts::parse(&opts, FREE);

    let tool_mode = match matches.free.as_slice() {
        [mode] if mode == "plain" => false,
        [mode] if mode == "tools" => true,
        [mode] => {
            eprintln!("Invalid mode {}", mode);
            opts::print_usage_with(&opts, FREE, 1)
        }
        _ => {
            eprintln!("Exactly one mode must be given");
            opts::print_usage_with(&opts, FREE, 1)
        }
    };

    let config = opts::load_config(&matches);
    let num_threads = opts::num_threads(&opts, &matches, FREE);
    let disciplines = opts::multi(&opts, &matches, FREE, "discipline", &Discipline::GENERATED);
    let models = opts::multi(&opts, &matches, FREE, "rma-model", &Model::ALL);
    let tools = opts::multi(&opts, &matches, FREE, "tool", &Target::TOOLS);
    if let Some(target) = tools.iter().find(|target| !target.is_tool()) {
        eprintln!("{} is an RMA model, not a tool", target);
        opts::print_usage_with(&opts, FREE, 1)
    }

    let output = match matches.opt_str("output-folder") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(chrono::Local::now().format("results-%Y%m%d-%H%M%S").to_string()),
    };
    let corpus = matches.opt_str("corpus").map(PathBuf::from).unwrap_or_else(|| config.corpus.clone());

    if let Err(e) = fs::create_dir_all(&output) {
        eprintln!("Could not create output folder {}: {}", output.display(), e);
        return 1;
    }

    // The detectors are only run on the MPI RMA tests
    let targets: Vec<(Target, Model)> = if tool_mode {
        tools.iter().map(|tool| (*tool, Model::MpiRma)).collect()
    } else {
        models.iter().map(|model| (Target::Runtime(*model), *model)).collect()
    };

    let mut table = ResultTable::new();
    let mut failed_tests = 0;
    let now = Instant::now();

    for (target, model) in targets {
        let adapter = match target.adapter(&config) {
            Ok(adapter) => adapter,
            Err(e) => {
                eprintln!("{}", e);
                return 1;
            }
        };

        let mut jobs = Vec::new();
        for discipline in &disciplines {
            match corpus_jobs(&corpus, model, *discipline) {
                Ok(mut found) => jobs.append(&mut found),
                Err(e) => eprintln!("Could not read tests for {} {}: {}", model, discipline, e),
            }
        }

        let (results, errors) = run_tests(jobs, target, adapter.as_ref(), &output, num_threads);
        failed_tests += errors.len();
        merge_results(&mut table, target, &results);
    }

    log!(log::VERBOSE, &format!("Ran {} tests in {}ms", table.len(), now.elapsed().as_millis()));

    let csv = output.join("results.csv");
    if let Err(e) = table.write_csv(&csv) {
        eprintln!("Could not write {}: {}", csv.display(), e);
        return 1;
    }
    println!("Results written to {}", csv.display());
    if failed_tests > 0 {
        eprintln!("{} tests could not be run", failed_tests)
    }

    0
}
