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

#![allow(dead_code)]

use getopts::{Matches, Options};
use std::process::exit;
use std::str::FromStr;

use rmarace_lib::config::Config;
use rmarace_lib::log;

fn tool_name() -> Option<String> {
    match std::env::current_exe() {
        Ok(path) => Some(path.components().last()?.as_os_str().to_str()?.to_string()),
        Err(_) => None,
    }
}

/// Print usage for a tool taking `free` positional arguments, then
/// exit with `code`.
pub fn print_usage_with(opts: &Options, free: &str, code: i32) -> ! {
    let tool = match tool_name() {
        Some(name) => name,
        None => "[tool]".to_string(),
    };
    let brief = if free.is_empty() {
        format!("Usage: {} [options]", tool)
    } else {
        format!("Usage: {} {} [options]", tool, free)
    };
    eprint!("{}", opts.usage(&brief));
    exit(code)
}

pub fn print_usage(opts: &Options, code: i32) -> ! {
    print_usage_with(opts, "", code)
}

pub fn common_opts() -> Options {
    let mut opts = Options::new();
    opts.optopt("c", "config", "load tool configuration from this file", "FILE");
    opts.optflag("h", "help", "print this help message");
    opts.optflagmulti("v", "verbose", "print verbose output");
    opts
}

pub fn parse(opts: &Options, free: &str) -> Matches {
    let args: Vec<String> = std::env::args().collect();

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            println!("{}", f);
            print_usage_with(opts, free, 1)
        }
    };

    if matches.opt_present("help") {
        print_usage_with(opts, free, 0)
    }

    log::set_verbosity(matches.opt_count("verbose"));

    matches
}

/// The configuration named by `--config`, or the built-in one.
pub fn load_config(matches: &Matches) -> Config {
    let config = match matches.opt_str("config") {
        Some(file) => Config::from_file(file),
        None => Config::builtin(),
    };
    match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            exit(1)
        }
    }
}

pub fn num_threads(opts: &Options, matches: &Matches, free: &str) -> usize {
    match matches.opt_get_default("threads", 1) {
        Ok(0) => {
            eprintln!("--threads must be at least 1");
            print_usage_with(opts, free, 1)
        }
        Ok(t) => t,
        Err(f) => {
            eprintln!("Could not parse --threads option: {}", f);
            print_usage_with(opts, free, 1)
        }
    }
}

/// Every value given for a repeatable option, or `default` if it was
/// not given at all.
pub fn multi<T>(opts: &Options, matches: &Matches, free: &str, name: &str, default: &[T]) -> Vec<T>
where
    T: FromStr<Err = String> + Clone,
{
    let values = matches.opt_strs(name);
    if values.is_empty() {
        return default.to_vec();
    }
    let mut parsed = Vec::new();
    for value in values {
        match value.parse::<T>() {
            Ok(v) => parsed.push(v),
            Err(e) => {
                eprintln!("{}", e);
                print_usage_with(opts, free, 1)
            }
        }
    }
    parsed
}
