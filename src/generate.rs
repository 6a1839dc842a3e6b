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

use std::path::PathBuf;
use std::process::exit;

use rmarace_lib::catalog::Catalog;
use rmarace_lib::corpus;
use rmarace_lib::counter::Counters;
use rmarace_lib::enumerate::Job;
use rmarace_lib::log;
use rmarace_lib::model::Discipline;
use rmarace_lib::render::{JinjaEngine, Renderer};

mod opts;

fn main() {
    let code = generate_main();
    exit(code)
}

fn generate_main() -> i32 {
    let mut opts = opts::common_opts();
    opts.optopt("T", "templates", "load templates from this directory", "DIR");
    opts.optopt("o", "output", "write the corpus under this directory", "DIR");
    opts.optmulti("d", "discipline", "only generate tests for this discipline (repeatable)", "DISCIPLINE");
    opts.optflag("", "no-format", "do not run the source formatter on generated tests");

    let matches = opts::parse(&opts, "");
    if !matches.free.is_empty() {
        eprintln!("Unexpected arguments: {}", matches.free.join(" "));
        opts::print_usage(&opts, 1)
    }
    let config = opts::load_config(&matches);
    let disciplines = opts::multi(&opts, &matches, "", "discipline", &Discipline::GENERATED);
    if disciplines.contains(&Discipline::Misc) {
        eprintln!("The misc discipline is written by hand and cannot be generated");
        opts::print_usage(&opts, 1)
    }

    let templates = matches.opt_str("templates").map(PathBuf::from).unwrap_or_else(|| config.generate.templates.clone());
    let output = matches.opt_str("output").map(PathBuf::from).unwrap_or_else(|| config.generate.output.clone());
    let formatter = if matches.opt_present("no-format") { None } else { config.generate.formatter.clone() };

    if !templates.is_dir() {
        eprintln!("Template directory {} does not exist", templates.display());
        return 1;
    }

    let catalog = Catalog::builtin();
    log!(log::VERBOSE, &format!("{} operations in catalog", catalog.len()));
    let jobs: Vec<Job> =
        corpus::jobs(&catalog).into_iter().filter(|job| disciplines.contains(&job.discipline)).collect();
    log!(log::VERBOSE, &format!("{} cases to generate", jobs.len()));

    let engine = JinjaEngine::new(&templates);
    let renderer = Renderer::new(&engine, &output, formatter);
    let mut counters = Counters::new();
    let failures = corpus::generate(&jobs, &renderer, &mut counters);

    print!("{}", counters.statistics_table());

    if failures > 0 {
        eprintln!("{} of {} cases could not be generated", failures, jobs.len());
        1
    } else {
        0
    }
}
