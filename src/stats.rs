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

use std::process::exit;

use rmarace_harness::adapter::Target;
use rmarace_harness::results::{discipline_report, metrics_report, ResultTable};

mod opts;

static FREE: &str = "RESULTS.csv";

fn main() {
    let code = stats_main();
    exit(code)
}

fn stats_main() -> i32 {
    let opts = opts::common_opts();
    let matches = opts::parse(&opts, FREE);

    let file = match matches.free.as_slice() {
        [file] => file,
        _ => opts::print_usage_with(&opts, FREE, 1),
    };

    let table = match ResultTable::from_file(file) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    // Only detector columns have graded outcomes
    let tools: Vec<&str> = table
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|column| column.parse::<Target>().map_or(false, Target::is_tool))
        .collect();

    print!("{}", table.report());
    println!();
    print!("{}", metrics_report(&table, &tools));
    for tool in tools {
        println!();
        print!("{}", discipline_report(&table, tool))
    }

    0
}
