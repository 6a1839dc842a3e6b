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

//! Case counters number the generated tests. There is one
//! [CaseCounter] per discipline, each counting per model, and the
//! numbers they hand out become the `NNN-` prefix of every generated
//! file, so they must be dense and start at 1.

use std::collections::HashMap;
use std::fmt::Write;

use crate::model::{Discipline, Model};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseCounter {
    total: HashMap<Model, usize>,
    races: HashMap<Model, usize>,
}

impl CaseCounter {
    pub fn new() -> Self {
        CaseCounter::default()
    }

    /// Count a new case and return its number.
    pub fn increment_and_get(&mut self, model: Model, has_race: bool) -> usize {
        let total = self.total.entry(model).or_insert(0);
        *total += 1;
        if has_race {
            *self.races.entry(model).or_insert(0) += 1
        }
        *total
    }

    pub fn get_total(&self, model: Model) -> usize {
        self.total.get(&model).copied().unwrap_or(0)
    }

    pub fn get_race_count(&self, model: Model) -> usize {
        self.races.get(&model).copied().unwrap_or(0)
    }

    pub fn get_norace_count(&self, model: Model) -> usize {
        self.get_total(model) - self.get_race_count(model)
    }

    fn absorb(&mut self, other: &CaseCounter) {
        for model in Model::ALL {
            *self.total.entry(model).or_insert(0) += other.get_total(model);
            *self.races.entry(model).or_insert(0) += other.get_race_count(model);
        }
    }
}

/// The counters for every generated discipline. This is threaded
/// through generation explicitly rather than kept as global state.
#[derive(Debug, Clone)]
pub struct Counters {
    counters: HashMap<Discipline, CaseCounter>,
}

impl Default for Counters {
    fn default() -> Self {
        Counters::new()
    }
}

impl Counters {
    pub fn new() -> Self {
        Counters { counters: Discipline::GENERATED.iter().map(|d| (*d, CaseCounter::new())).collect() }
    }

    pub fn increment_and_get(&mut self, discipline: Discipline, model: Model, has_race: bool) -> usize {
        self.counters.entry(discipline).or_insert_with(CaseCounter::new).increment_and_get(model, has_race)
    }

    pub fn get(&self, discipline: Discipline) -> Option<&CaseCounter> {
        self.counters.get(&discipline)
    }

    /// Sum of all disciplines per model, only used for reporting.
    pub fn total(&self) -> CaseCounter {
        let mut total = CaseCounter::new();
        for discipline in Discipline::GENERATED {
            if let Some(counter) = self.counters.get(&discipline) {
                total.absorb(counter)
            }
        }
        total
    }

    /// Render the statistics table printed at the end of generation.
    /// Each cell is `races / no races / total`.
    pub fn statistics_table(&self) -> String {
        let mut table = String::new();
        writeln!(&mut table, "Statistics").unwrap();
        write!(&mut table, "\t\t\t").unwrap();
        for model in Model::ALL {
            write!(&mut table, "& {} \t", model.pretty_name()).unwrap();
        }
        writeln!(&mut table, "\\\\\\midrule").unwrap();
        let empty = CaseCounter::new();
        for discipline in Discipline::GENERATED {
            statistics_row(&mut table, discipline.pretty_name(), self.counters.get(&discipline).unwrap_or(&empty))
        }
        writeln!(&mut table, "\\midrule").unwrap();
        statistics_row(&mut table, "Total", &self.total());
        table
    }
}

fn statistics_row(table: &mut String, name: &str, counter: &CaseCounter) {
    write!(table, "{: <16}\t", name).unwrap();
    for model in Model::ALL {
        write!(
            table,
            "& {:>2} / {} / {:>2} \t",
            counter.get_race_count(model),
            counter.get_norace_count(model),
            counter.get_total(model)
        )
        .unwrap();
    }
    writeln!(table, "\\\\").unwrap()
}
