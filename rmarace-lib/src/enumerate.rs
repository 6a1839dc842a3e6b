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

//! Expansion of declarative combination rules into concrete
//! generation jobs.
//!
//! A rule pairs two *families* of operations (e.g. every operation
//! that writes a local buffer, against every plain store) and states
//! whether that pairing is racy. For each model, the cross product of
//! the two families is walked in order, and each unordered pair of
//! display names is emitted at most once. The first ordering
//! encountered wins, so the order of operations inside a family is
//! significant.
//!
//! The sync, atomic and hybrid disciplines do not use families.
//! Instead each [SourceTemplate] fully describes the operation pairs
//! and race flags it should be rendered with.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, Operation};
use crate::log;
use crate::model::{Discipline, Model};

/// A set of candidate operations per model. A model with no entry (or
/// an empty entry) does not support the family.
#[derive(Debug, Clone, Default)]
pub struct Family<'c> {
    ops: HashMap<Model, Vec<&'c Operation>>,
}

impl<'c> Family<'c> {
    pub fn new() -> Self {
        Family { ops: HashMap::new() }
    }

    pub fn add(&mut self, op: &'c Operation) -> &mut Self {
        self.ops.entry(op.model).or_insert_with(Vec::new).push(op);
        self
    }

    /// Add the operations registered under the given logical names
    /// for one model. Names that are not registered are reported and
    /// left out of the family. An empty list of names records that the
    /// model does not support the family.
    pub fn with(mut self, catalog: &'c Catalog, model: Model, names: &[&str]) -> Self {
        self.ops.entry(model).or_insert_with(Vec::new);
        for name in names {
            match catalog.lookup(model, name) {
                Ok(op) => {
                    self.add(op);
                }
                Err(e) => eprintln!("{}", e),
            }
        }
        self
    }

    pub fn get(&self, model: Model) -> &[&'c Operation] {
        self.ops.get(&model).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A pairing of two families, which produces jobs for every model
/// where both families are non-empty.
#[derive(Debug, Clone, Copy)]
pub struct Rule<'a, 'c> {
    pub ops1: &'a Family<'c>,
    pub ops2: &'a Family<'c>,
    pub has_race: bool,
    pub nprocs: u32,
}

/// A hand-picked pair of operations outside the family scheme.
#[derive(Debug, Clone, Copy)]
pub struct Combination<'c> {
    pub op1: &'c Operation,
    pub op2: &'c Operation,
    pub has_race: bool,
    pub nprocs: u32,
}

#[derive(Debug, Clone)]
pub struct SourceTemplate<'c> {
    pub filename: PathBuf,
    pub nprocs: u32,
    /// Each operation pair is rendered once for every flag here.
    pub has_race: Vec<bool>,
    pub combinations: Vec<(Option<&'c Operation>, Option<&'c Operation>)>,
    pub threaded: bool,
}

impl<'c> SourceTemplate<'c> {
    pub fn new<P: AsRef<Path>>(
        filename: P,
        nprocs: u32,
        has_race: &[bool],
        combinations: &[(Option<&'c Operation>, Option<&'c Operation>)],
    ) -> Self {
        SourceTemplate {
            filename: filename.as_ref().to_path_buf(),
            nprocs,
            has_race: has_race.to_vec(),
            combinations: combinations.to_vec(),
            threaded: false,
        }
    }

    pub fn threaded(mut self) -> Self {
        self.threaded = true;
        self
    }
}

/// Everything needed to render one test case, apart from its case
/// number which is assigned when the job is rendered.
#[derive(Debug, Clone)]
pub struct Job<'c> {
    pub model: Model,
    pub discipline: Discipline,
    pub template: PathBuf,
    pub op1: Option<&'c Operation>,
    pub op2: Option<&'c Operation>,
    pub has_race: bool,
    pub nprocs: u32,
    pub threaded: bool,
}

/// Combinations are deduplicated by display name, not by call, so
/// `put` at offset 0 and `put` at offset 1 count as the same operation.
pub fn pair_key<'o>(op1: &'o Operation, op2: &'o Operation) -> (&'o str, &'o str) {
    if op1.name <= op2.name {
        (op1.name.as_str(), op2.name.as_str())
    } else {
        (op2.name.as_str(), op1.name.as_str())
    }
}

/// Expand a single rule for a single model.
pub fn expand_rule<'c>(rule: &Rule<'_, 'c>, model: Model, template: &Path, discipline: Discipline) -> Vec<Job<'c>> {
    let mut jobs = Vec::new();
    let ops1 = rule.ops1.get(model);
    let ops2 = rule.ops2.get(model);

    if ops1.is_empty() || ops2.is_empty() {
        log!(log::GENERATE, &format!("Rule does not apply to {}", model));
        return jobs;
    }

    let mut generated = HashSet::new();
    for &op1 in ops1 {
        for &op2 in ops2 {
            if !generated.insert(pair_key(op1, op2)) {
                log!(log::GENERATE, &format!("Skipping duplicate pair {} {} for {}", op1, op2, model));
                continue;
            }
            jobs.push(Job {
                model,
                discipline,
                template: template.to_path_buf(),
                op1: Some(op1),
                op2: Some(op2),
                has_race: rule.has_race,
                nprocs: rule.nprocs,
                threaded: false,
            })
        }
    }

    jobs
}

/// Expand a list of rules, rule by rule, over every model that has a
/// template. Models without a template are skipped.
pub fn expand_rules<'c>(
    rules: &[Rule<'_, 'c>],
    templates: &HashMap<Model, PathBuf>,
    discipline: Discipline,
) -> Vec<Job<'c>> {
    let mut jobs = Vec::new();
    for rule in rules {
        for model in Model::ALL {
            if let Some(template) = templates.get(&model) {
                jobs.append(&mut expand_rule(rule, model, template, discipline))
            }
        }
    }
    jobs
}

/// Additional combinations are emitted as given, without checking
/// them against pairs already produced from rules.
pub fn expand_combinations<'c>(
    combinations: &[Combination<'c>],
    model: Model,
    template: &Path,
    discipline: Discipline,
) -> Vec<Job<'c>> {
    combinations
        .iter()
        .map(|c| Job {
            model,
            discipline,
            template: template.to_path_buf(),
            op1: Some(c.op1),
            op2: Some(c.op2),
            has_race: c.has_race,
            nprocs: c.nprocs,
            threaded: false,
        })
        .collect()
}

/// Flat iteration over (operation pair x race flag) for each template.
pub fn expand_templates<'c>(templates: &[SourceTemplate<'c>], model: Model, discipline: Discipline) -> Vec<Job<'c>> {
    let mut jobs = Vec::new();
    for template in templates {
        for (op1, op2) in &template.combinations {
            for has_race in &template.has_race {
                jobs.push(Job {
                    model,
                    discipline,
                    template: template.filename.clone(),
                    op1: *op1,
                    op2: *op2,
                    has_race: *has_race,
                    nprocs: template.nprocs,
                    threaded: template.threaded,
                })
            }
        }
    }
    jobs
}
