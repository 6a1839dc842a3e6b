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

//! The RMA programming models and race disciplines that make up the
//! corpus. Both are closed sets, so they are plain enums with a fixed
//! textual form used in directory names, CSV columns and on the
//! command line.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Model {
    #[serde(rename = "MPIRMA")]
    MpiRma,
    #[serde(rename = "SHMEM")]
    Shmem,
    #[serde(rename = "GASPI")]
    Gaspi,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::MpiRma, Model::Shmem, Model::Gaspi];

    pub fn as_str(self) -> &'static str {
        match self {
            Model::MpiRma => "MPIRMA",
            Model::Shmem => "SHMEM",
            Model::Gaspi => "GASPI",
        }
    }

    /// Column heading used in the generator's statistics table.
    pub fn pretty_name(self) -> &'static str {
        match self {
            Model::MpiRma => "MPI RMA",
            Model::Shmem => "SHMEM",
            Model::Gaspi => "GASPI",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::ALL
            .iter()
            .copied()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| format!("Unknown RMA model {} (expected one of MPIRMA, SHMEM, GASPI)", s))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Discipline {
    Conflict,
    Sync,
    Atomic,
    Hybrid,
    /// Hand-written tests that live alongside the generated corpus.
    /// They can be run, but are never generated.
    Misc,
}

impl Discipline {
    pub const GENERATED: [Discipline; 4] =
        [Discipline::Conflict, Discipline::Sync, Discipline::Atomic, Discipline::Hybrid];

    pub const ALL: [Discipline; 5] =
        [Discipline::Conflict, Discipline::Sync, Discipline::Atomic, Discipline::Hybrid, Discipline::Misc];

    pub fn as_str(self) -> &'static str {
        match self {
            Discipline::Conflict => "conflict",
            Discipline::Sync => "sync",
            Discipline::Atomic => "atomic",
            Discipline::Hybrid => "hybrid",
            Discipline::Misc => "misc",
        }
    }

    pub fn pretty_name(self) -> &'static str {
        match self {
            Discipline::Conflict => "Conflict",
            Discipline::Sync => "Synchronization",
            Discipline::Atomic => "Atomic",
            Discipline::Hybrid => "Hybrid",
            Discipline::Misc => "Misc",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Discipline::ALL
            .iter()
            .copied()
            .find(|discipline| discipline.as_str() == s)
            .ok_or_else(|| format!("Unknown discipline {} (expected one of conflict, sync, atomic, hybrid, misc)", s))
    }
}
