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

//! The table of verdicts produced by a run, its CSV form, and the
//! precision, recall and accuracy derived from it.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use rmarace_lib::model::Discipline;

use crate::classify::Outcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub discipline: Discipline,
    cells: HashMap<String, String>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// Verdicts keyed by test basename, one column per tool or model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: BTreeMap<String, Row>,
}

impl ResultTable {
    pub fn new() -> Self {
        ResultTable::default()
    }

    /// Add a column, which keeps its place even if no test reports a
    /// verdict for it.
    pub fn add_column(&mut self, column: &str) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string())
        }
    }

    pub fn insert<V: ToString>(&mut self, basename: &str, discipline: Discipline, column: &str, verdict: V) {
        self.add_column(column);
        let row = self
            .rows
            .entry(basename.to_string())
            .or_insert_with(|| Row { discipline, cells: HashMap::new() });
        row.discipline = discipline;
        row.cells.insert(column.to_string(), verdict.to_string());
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in basename order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &Row)> {
        self.rows.iter().map(|(basename, row)| (basename.as_str(), row))
    }

    pub fn get(&self, basename: &str, column: &str) -> Option<&str> {
        self.rows.get(basename).and_then(|row| row.get(column))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as CSV with a `,discipline,<columns...>` header. Missing
    /// cells are left empty.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(",discipline");
        for column in &self.columns {
            csv.push(',');
            csv.push_str(column)
        }
        csv.push('\n');
        for (basename, row) in &self.rows {
            csv.push_str(basename);
            csv.push(',');
            csv.push_str(row.discipline.as_str());
            for column in &self.columns {
                csv.push(',');
                csv.push_str(row.get(column).unwrap_or(""))
            }
            csv.push('\n')
        }
        csv
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_csv())
    }

    /// Parse a table written by [ResultTable::to_csv]. Basenames and
    /// verdicts never contain commas, so no quoting is handled.
    pub fn from_csv(contents: &str) -> Result<Self, String> {
        let mut lines = contents.lines().filter(|line| !line.trim().is_empty());
        let header: Vec<&str> = match lines.next() {
            Some(header) => header.split(',').map(str::trim).collect(),
            None => return Err("Results file is empty".to_string()),
        };
        if header.len() < 2 || header[1] != "discipline" {
            return Err("Results file must have a discipline column".to_string());
        }

        let mut table = ResultTable::new();
        for column in &header[2..] {
            table.add_column(column)
        }
        for (i, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() != header.len() {
                return Err(format!("Row {} has {} fields, expected {}", i + 1, fields.len(), header.len()));
            }
            let discipline = fields[1].parse::<Discipline>()?;
            table.rows.entry(fields[0].to_string()).or_insert_with(|| Row { discipline, cells: HashMap::new() });
            for (column, verdict) in header[2..].iter().zip(&fields[2..]) {
                if !verdict.is_empty() {
                    table.insert(fields[0], discipline, column, verdict)
                }
            }
        }
        Ok(table)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("Error when loading results '{}': {}", path.as_ref().display(), e))?;
        ResultTable::from_csv(&contents)
    }

    /// Count the graded outcomes in `column`, optionally only for tests
    /// of one discipline.
    pub fn tally(&self, column: &str, discipline: Option<Discipline>) -> Tally {
        let mut tally = Tally::default();
        for row in self.rows.values() {
            if discipline.map_or(false, |d| d != row.discipline) {
                continue;
            }
            if let Some(outcome) = row.get(column).and_then(|verdict| verdict.parse::<Outcome>().ok()) {
                tally.add(outcome)
            }
        }
        tally
    }

    /// The table itself, aligned into columns.
    pub fn report(&self) -> String {
        let mut header = vec![String::new(), "discipline".to_string()];
        header.extend(self.columns.iter().cloned());
        let mut lines = vec![header];
        for (basename, row) in &self.rows {
            let mut line = vec![basename.clone(), row.discipline.as_str().to_string()];
            line.extend(self.columns.iter().map(|column| row.get(column).unwrap_or("").to_string()));
            lines.push(line)
        }
        align(&lines)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
    pub to: usize,
    pub cr: usize,
    pub unsupported: usize,
}

fn guarded_div(dividend: usize, divisor: usize) -> f64 {
    if divisor == 0 {
        0.0
    } else {
        dividend as f64 / divisor as f64
    }
}

impl Tally {
    pub fn add(&mut self, outcome: Outcome) {
        use Outcome::*;
        match outcome {
            TruePositive => self.tp += 1,
            FalsePositive => self.fp += 1,
            TrueNegative => self.tn += 1,
            FalseNegative => self.fn_ += 1,
            Timeout => self.to += 1,
            Crash => self.cr += 1,
            Unsupported => self.unsupported += 1,
        }
    }

    pub fn graded(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn precision(&self) -> f64 {
        guarded_div(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        guarded_div(self.tp, self.tp + self.fn_)
    }

    pub fn accuracy(&self) -> f64 {
        guarded_div(self.tp + self.tn, self.graded())
    }
}

/// Right-align every column but the first, which is left-aligned.
fn align(lines: &[Vec<String>]) -> String {
    let width = lines.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> =
        (0..width).map(|i| lines.iter().filter_map(|line| line.get(i)).map(String::len).max().unwrap_or(0)).collect();
    let mut out = String::new();
    for line in lines {
        for (i, cell) in line.iter().enumerate() {
            if i == 0 {
                let _ = write!(out, "{:<w$}", cell, w = widths[i]);
            } else {
                let _ = write!(out, "  {:>w$}", cell, w = widths[i]);
            }
        }
        out.push('\n')
    }
    out
}

/// Precision, recall and accuracy for each of `tools`.
pub fn metrics_report(table: &ResultTable, tools: &[&str]) -> String {
    let mut lines = vec![vec![String::new(), "Precision".to_string(), "Recall".to_string(), "Accuracy".to_string()]];
    for tool in tools {
        let tally = table.tally(tool, None);
        lines.push(vec![
            tool.to_string(),
            format!("{:.3}", tally.precision()),
            format!("{:.3}", tally.recall()),
            format!("{:.3}", tally.accuracy()),
        ])
    }
    align(&lines)
}

/// Outcome counts and metrics for `tool`, per generated discipline and
/// in total.
pub fn discipline_report(table: &ResultTable, tool: &str) -> String {
    let mut lines: Vec<Vec<String>> = vec![["", "TP", "FP", "TN", "FN", "TO", "P", "R", "A"].iter().map(|s| s.to_string()).collect()];
    let mut row = |name: &str, tally: Tally| {
        lines.push(vec![
            name.to_string(),
            tally.tp.to_string(),
            tally.fp.to_string(),
            tally.tn.to_string(),
            tally.fn_.to_string(),
            tally.to.to_string(),
            format!("{:.2}", tally.precision()),
            format!("{:.2}", tally.recall()),
            format!("{:.2}", tally.accuracy()),
        ])
    };
    for discipline in Discipline::GENERATED {
        let name = discipline.as_str();
        let title = format!("{}{}", name[..1].to_uppercase(), &name[1..]);
        row(&title, table.tally(tool, Some(discipline)))
    }
    row("Total", table.tally(tool, None));
    format!("{}\n{}", tool, align(&lines))
}
