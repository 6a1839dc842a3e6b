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

//! The definition of the generated corpus.
//!
//! Conflict tests come from pairing families of operations grouped by
//! access kind, first against the local buffer template of each model
//! and then against the remote template. The sync, atomic and hybrid
//! disciplines each list their templates explicitly.
//!
//! Template paths are relative to the template root, and the generated
//! files land in the same relative directory under the output root.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::counter::Counters;
use crate::enumerate::*;
use crate::log;
use crate::model::{Discipline, Model};
use crate::render::Renderer;

fn family<'c>(catalog: &'c Catalog, mpirma: &[&str], shmem: &[&str], gaspi: &[&str]) -> Family<'c> {
    Family::new()
        .with(catalog, Model::MpiRma, mpirma)
        .with(catalog, Model::Shmem, shmem)
        .with(catalog, Model::Gaspi, gaspi)
}

fn conflict_template(model: Model, access: &str) -> PathBuf {
    let prefix = match model {
        Model::MpiRma => "MPI",
        Model::Shmem => "shmem",
        Model::Gaspi => "GASPI",
    };
    PathBuf::from(format!("{}/conflict/{}-conflict-op1-op2-{}-race.c.j2", model.as_str(), prefix, access))
}

fn conflict_templates(access: &str) -> HashMap<Model, PathBuf> {
    Model::ALL.iter().map(|model| (*model, conflict_template(*model, access))).collect()
}

fn rule<'a, 'c>(ops1: &'a Family<'c>, ops2: &'a Family<'c>, has_race: bool, nprocs: u32) -> Rule<'a, 'c> {
    Rule { ops1, ops2, has_race, nprocs }
}

type Extra = (&'static str, &'static str, bool, u32);

#[rustfmt::skip]
static MPIRMA_LOCAL_EXTRA: &[Extra] = &[
    ("acc", "local_store", true, 2),
    ("acc", "local_load", false, 2),
    ("gacc1", "local_store", true, 2),
    ("gacc2", "local_load", true, 2),
    ("fop1", "local_store", true, 2),
    ("fop2", "local_load", true, 2),
    ("cas1", "local_store", true, 2),
    ("cas2", "local_load", true, 2),
];

#[rustfmt::skip]
static SHMEM_LOCAL_EXTRA: &[Extra] = &[
    ("put_signal_nbi", "local_store", true, 2),
    ("put_signal_nbi", "local_load", false, 2),
    ("atomicfetchnbi", "local_store", true, 2),
    ("atomicfetchnbi", "local_load", true, 2),
    ("atomicfetchincnbi", "local_store", true, 2),
    ("atomicfetchincnbi", "local_load", true, 2),
    ("atomiccompareswapnbi", "local_load", true, 2),
    ("atomiccompareswapnbi", "local_store", true, 2),
];

#[rustfmt::skip]
static GASPI_LOCAL_EXTRA: &[Extra] = &[
    ("write_list", "local_load", false, 2),
    ("write_list", "local_store", true, 2),
    ("read_list", "local_load", true, 2),
    ("read_list", "local_store", true, 2),
    ("write_notify", "local_load", false, 2),
    ("write_notify", "local_store", true, 2),
    ("read_notify", "local_load", true, 2),
    ("read_notify", "local_store", true, 2),
    ("write_list_notify", "local_load", false, 2),
    ("write_list_notify", "local_store", true, 2),
    ("read_list_notify", "local_load", true, 2),
    ("read_list_notify", "local_store", true, 2),
];

#[rustfmt::skip]
static MPIRMA_REMOTE_EXTRA: &[Extra] = &[
    ("gacc1", "remote_store", true, 2),
    ("gacc1", "gacc1", false, 3),
    ("fop1", "fop1", false, 3),
    ("fop1", "remote_store", true, 2),
    ("cas1", "remote_store", true, 2),
    ("cas1", "cas1", false, 3),
];

#[rustfmt::skip]
static SHMEM_REMOTE_EXTRA: &[Extra] = &[
    ("put_signal", "remote_store", true, 2),
    ("put_signal", "put_signal2", true, 3),
    ("g", "remote_store", true, 2),
    ("g", "put", true, 3),
    ("p", "remote_load", true, 2),
    ("p", "get", true, 3),
    ("iput", "remote_store", true, 2),
    ("iput", "put", true, 3),
    ("iget", "remote_store", true, 2),
    ("iget", "put", true, 3),
    ("atomicfetchnbi", "atomicfetchnbi", false, 3),
    ("atomicfetchnbi", "remote_load", false, 2),
    ("atomicfetchinc", "atomicfetchinc", false, 3),
    ("atomicfetchnbi", "remote_store", true, 2),
    ("atomiccompareswapnbi", "remote_store", true, 2),
    ("atomiccompareswapnbi", "atomicfetchnbi", false, 3),
];

#[rustfmt::skip]
static GASPI_REMOTE_EXTRA: &[Extra] = &[
    ("write_list", "remote_load", true, 2),
    ("write_list", "write", true, 3),
    ("read_list", "remote_load", false, 2),
    ("read_list", "write", true, 3),
    ("write_notify", "remote_load", true, 2),
    ("write_notify", "write", true, 3),
    ("read_notify", "remote_load", false, 2),
    ("read_notify", "write", true, 3),
    ("write_list_notify", "remote_load", true, 2),
    ("write_list_notify", "write", true, 3),
    ("read_list_notify", "remote_load", false, 2),
    ("read_list_notify", "write", true, 3),
];

fn extra_table(model: Model, access: &str) -> &'static [Extra] {
    match (model, access) {
        (Model::MpiRma, "local") => MPIRMA_LOCAL_EXTRA,
        (Model::Shmem, "local") => SHMEM_LOCAL_EXTRA,
        (Model::Gaspi, "local") => GASPI_LOCAL_EXTRA,
        (Model::MpiRma, _) => MPIRMA_REMOTE_EXTRA,
        (Model::Shmem, _) => SHMEM_REMOTE_EXTRA,
        (Model::Gaspi, _) => GASPI_REMOTE_EXTRA,
    }
}

/// Resolve a table of hand-picked pairs. Pairs naming operations that
/// are not in the catalog are reported and dropped.
fn combinations<'c>(catalog: &'c Catalog, model: Model, table: &[Extra]) -> Vec<Combination<'c>> {
    let mut combinations = Vec::new();
    for (op1, op2, has_race, nprocs) in table {
        match (catalog.lookup(model, op1), catalog.lookup(model, op2)) {
            (Ok(op1), Ok(op2)) => combinations.push(Combination { op1, op2, has_race: *has_race, nprocs: *nprocs }),
            (Err(e), _) | (_, Err(e)) => eprintln!("{}", e),
        }
    }
    combinations
}

/// All conflict jobs, in generation order: local rules, extra local
/// pairs, remote rules, extra remote pairs.
pub fn conflict_jobs(catalog: &Catalog) -> Vec<Job> {
    let local_load = family(catalog, &["local_load"], &["local_load"], &["local_load"]);
    let local_store = family(catalog, &["local_store"], &["local_store"], &["local_store"]);
    let local_buffer_read = family(catalog, &["put"], &["putnbi"], &["write"]);
    let local_buffer_read2 = family(catalog, &["put2"], &["putnbi2"], &["write2"]);
    let local_buffer_write = family(catalog, &["get"], &["getnbi"], &["read"]);
    let remote_load = family(catalog, &["remote_load"], &["remote_load"], &["remote_load"]);
    let remote_store = family(catalog, &["remote_store"], &["remote_store"], &["remote_store"]);
    let rma_write = family(catalog, &["put"], &["put"], &["write"]);
    let rma_read = family(catalog, &["get"], &["get"], &["read"]);
    let rma_atomic_write = family(catalog, &["acc"], &["atomicset"], &["fetchadd"]);
    let rma_atomic_read = family(catalog, &["gaccread"], &["atomicfetch"], &[]);

    #[rustfmt::skip]
    let local_rules = [
        rule(&local_buffer_read, &local_load, false, 2),
        rule(&local_buffer_read, &local_store, true, 2),
        rule(&local_buffer_read, &local_buffer_read2, false, 2),
        rule(&local_buffer_write, &local_load, true, 2),
        rule(&local_buffer_write, &local_store, true, 2),
        rule(&local_buffer_write, &local_buffer_read, true, 2),
        rule(&local_buffer_write, &local_buffer_write, true, 2),
    ];

    #[rustfmt::skip]
    let remote_rules = [
        rule(&rma_read, &remote_load, false, 2),
        rule(&rma_read, &rma_read, false, 3),
        rule(&rma_read, &remote_store, true, 2),
        rule(&rma_read, &rma_write, true, 3),
        rule(&rma_read, &rma_atomic_read, false, 3),
        rule(&rma_read, &rma_atomic_write, true, 3),
        rule(&rma_write, &remote_load, true, 2),
        rule(&rma_write, &remote_store, true, 2),
        rule(&rma_write, &rma_write, true, 3),
        rule(&rma_write, &rma_atomic_read, true, 3),
        rule(&rma_write, &rma_atomic_write, true, 3),
        rule(&rma_atomic_write, &remote_load, true, 2),
        rule(&rma_atomic_write, &remote_store, true, 2),
        rule(&rma_atomic_write, &rma_atomic_write, false, 3),
        rule(&rma_atomic_write, &rma_atomic_read, false, 3),
        rule(&rma_atomic_read, &rma_atomic_read, false, 3),
        rule(&rma_atomic_read, &remote_load, false, 2),
        rule(&rma_atomic_read, &remote_store, true, 2),
    ];

    let mut jobs = Vec::new();
    for (access, rules) in [("local", &local_rules[..]), ("remote", &remote_rules[..])] {
        let templates = conflict_templates(access);
        jobs.append(&mut expand_rules(rules, &templates, Discipline::Conflict));
        for model in Model::ALL {
            let extra = combinations(catalog, model, extra_table(model, access));
            jobs.append(&mut expand_combinations(&extra, model, &templates[&model], Discipline::Conflict))
        }
    }
    jobs
}

/// An operation pair by catalog name, or `None` for templates that
/// spell out their operations themselves.
type Pair = Option<(&'static str, &'static str)>;

/// (template, nprocs, race flags, operation pair)
type Flat = (&'static str, u32, &'static [bool], Pair);

const YES: &[bool] = &[true];
const NO: &[bool] = &[false];
const BOTH: &[bool] = &[true, false];

const DUMMY: Pair = None;
const MPI_GET_LOAD: Pair = Some(("get", "local_load"));
const MPI_PUT_LOAD: Pair = Some(("put", "remote_load"));
const MPI_PUT_GET: Pair = Some(("put", "get"));
const MPI_RGET_LOAD: Pair = Some(("rget", "local_load"));
const MPI_ACC_ACC: Pair = Some(("acc", "acc"));
const SHMEM_GET_LOAD: Pair = Some(("get", "local_load"));
const SHMEM_REMOTE_CONFLICT: Pair = Some(("put_remote", "get_remote"));
const SHMEM_PUT_REMOTELOAD: Pair = Some(("put_remote", "remote_load"));

#[rustfmt::skip]
static MPIRMA_SYNC: &[Flat] = &[
    ("MPIRMA/sync/MPI-sync-fence-local-race.c.j2", 2, BOTH, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-lock-local-race.c.j2", 2, BOTH, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-lock-flush-local-race.c.j2", 2, BOTH, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-lockall-flushlocalall-local-race.c.j2", 2, BOTH, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-request-local-race.c.j2", 2, BOTH, MPI_RGET_LOAD),
    ("MPIRMA/sync/MPI-sync-pscw-local-race.c.j2", 2, BOTH, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-lockall-flushall-remote-no.c.j2", 2, NO, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-lockall-flushall-remote-yes.c.j2", 2, YES, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-lockall-barrier-remote-no.c.j2", 2, NO, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-lockall-barrier-remote-yes.c.j2", 2, YES, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-lockall-remote-yes.c.j2", 2, YES, MPI_GET_LOAD),
    ("MPIRMA/sync/MPI-sync-fence-3procs-remote-race.c.j2", 3, YES, MPI_PUT_GET),
    ("MPIRMA/sync/MPI-sync-fence-3procs-remote-race.c.j2", 3, NO, MPI_PUT_GET),
    ("MPIRMA/sync/MPI-sync-lock-barrier-nonconsistent-remote-yes.c.j2", 2, YES, MPI_PUT_LOAD),
    ("MPIRMA/sync/MPI-sync-lock-barrier-remote-yes.c.j2", 2, YES, MPI_PUT_LOAD),
    ("MPIRMA/sync/MPI-sync-lock-barrier-remote-no.c.j2", 2, NO, MPI_PUT_LOAD),
    ("MPIRMA/sync/MPI-sync-lock-barrier-sameorigin-remote-no.c.j2", 2, NO, MPI_PUT_GET),
    ("MPIRMA/sync/MPI-sync-lock-barrier-sameorigin-remote-yes.c.j2", 2, YES, MPI_PUT_GET),
    ("MPIRMA/sync/MPI-sync-lock-flushlocal-sameorigin-remote-yes.c.j2", 2, YES, MPI_PUT_GET),
    ("MPIRMA/sync/MPI-sync-lock-flushlocal-sameorigin-remote-no.c.j2", 2, NO, MPI_PUT_GET),
    ("MPIRMA/sync/MPI-sync-lock-exclusive-remote-no.c.j2", 2, NO, MPI_PUT_LOAD),
    ("MPIRMA/sync/MPI-sync-lock-exclusive-3procs-remote-no.c.j2", 3, NO, MPI_PUT_GET),
    ("MPIRMA/sync/MPI-sync-lock-exclusive-remote-yes.c.j2", 2, YES, MPI_PUT_LOAD),
    ("MPIRMA/sync/MPI-sync-lock-sendrecv-remote-race.c.j2", 2, BOTH, MPI_PUT_LOAD),
    ("MPIRMA/sync/MPI-sync-lock-sendrecv-3procs-remote-no.c.j2", 3, NO, MPI_PUT_LOAD),
    ("MPIRMA/sync/MPI-sync-lock-sendrecv-3procs-remote-yes.c.j2", 3, YES, MPI_PUT_LOAD),
    ("MPIRMA/sync/MPI-sync-pscw-remote-no.c.j2", 3, NO, MPI_PUT_GET),
    ("MPIRMA/sync/MPI-sync-pscw-remote-yes.c.j2", 3, YES, MPI_PUT_GET),
    ("MPIRMA/sync/MPI-sync-polling-remote-yes.c.j2", 2, YES, MPI_PUT_LOAD),
];

#[rustfmt::skip]
static SHMEM_SYNC: &[Flat] = &[
    ("SHMEM/sync/shmem-sync-barrierall-local-race.c.j2", 2, BOTH, SHMEM_GET_LOAD),
    ("SHMEM/sync/shmem-sync-barrierall-remote-race.c.j2", 2, BOTH, SHMEM_REMOTE_CONFLICT),
    ("SHMEM/sync/shmem-sync-quiet-local-race.c.j2", 2, BOTH, SHMEM_GET_LOAD),
    ("SHMEM/sync/shmem-sync-quiet-sync-remote-no.c.j2", 2, NO, SHMEM_REMOTE_CONFLICT),
    ("SHMEM/sync/shmem-sync-quiet-sync-remote-yes.c.j2", 2, YES, SHMEM_REMOTE_CONFLICT),
    ("SHMEM/sync/shmem-sync-fence-put-put-remote-no.c.j2", 2, NO, Some(("put", "put_remote"))),
    ("SHMEM/sync/shmem-sync-fence-getnbi-put-remote-yes.c.j2", 2, YES, Some(("get", "put_remote"))),
    ("SHMEM/sync/shmem-sync-lock-remote-no.c.j2", 2, NO, Some(("put_remote", "put_remote"))),
    ("SHMEM/sync/shmem-sync-lock-remote-yes.c.j2", 2, YES, Some(("put_remote", "put_remote"))),
    ("SHMEM/sync/shmem-sync-waituntil-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/sync/shmem-sync-waituntil-remote-no.c.j2", 2, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/sync/shmem-sync-putsignal-remote-no.c.j2", 2, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/sync/shmem-sync-putsignal-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/sync/shmem-sync-ctx-remote-no.c.j2", 2, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/sync/shmem-sync-ctx-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/sync/shmem-sync-collective-reduce-remote-no.c.j2", 4, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/sync/shmem-sync-collective-reduce-remote-yes.c.j2", 4, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/sync/shmem-sync-team-sync-remote-yes.c.j2", 4, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/sync/shmem-sync-team-sync-remote-no.c.j2", 4, NO, SHMEM_PUT_REMOTELOAD),
];

#[rustfmt::skip]
static GASPI_SYNC: &[Flat] = &[
    ("GASPI/sync/GASPI-sync-wait-local-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/sync/GASPI-sync-wait-local-no.c.j2", 2, NO, DUMMY),
    ("GASPI/sync/GASPI-sync-wait-barrier-remote-no.c.j2", 2, NO, DUMMY),
    ("GASPI/sync/GASPI-sync-wait-barrier-remote-nonconsistent-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/sync/GASPI-sync-wait-barrier-remote-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/sync/GASPI-sync-wait-write-barrier-remote-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/sync/GASPI-sync-notify-waitsome-remote-no.c.j2", 2, NO, DUMMY),
    ("GASPI/sync/GASPI-sync-notify-waitsome-remote-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/sync/GASPI-sync-wait-allreduce-remote-no.c.j2", 3, NO, DUMMY),
    ("GASPI/sync/GASPI-sync-wait-allreduce-remote-yes.c.j2", 3, YES, DUMMY),
    ("GASPI/sync/GASPI-sync-wait-sendrecv-remote-no.c.j2", 2, NO, DUMMY),
    ("GASPI/sync/GASPI-sync-wait-sendrecv-remote-yes.c.j2", 2, YES, DUMMY),
];

#[rustfmt::skip]
static MPIRMA_ATOMIC: &[Flat] = &[
    ("MPIRMA/atomic/MPI-atomic-customdatatype-remote-no.c.j2", 3, NO, MPI_ACC_ACC),
    ("MPIRMA/atomic/MPI-atomic-customdatatype-remote-yes.c.j2", 3, YES, MPI_ACC_ACC),
    ("MPIRMA/atomic/MPI-atomic-disp-remote-yes.c.j2", 3, YES, MPI_ACC_ACC),
    ("MPIRMA/atomic/MPI-atomic-disp-remote-no.c.j2", 3, NO, MPI_ACC_ACC),
    ("MPIRMA/atomic/MPI-atomic-short-int-remote-yes.c.j2", 3, YES, MPI_ACC_ACC),
    ("MPIRMA/atomic/MPI-atomic-float-int-remote-yes.c.j2", 3, YES, MPI_ACC_ACC),
    ("MPIRMA/atomic/MPI-atomic-float-int-sameorigin-remote-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/atomic/MPI-atomic-double-float-remote-yes.c.j2", 3, YES, MPI_ACC_ACC),
    ("MPIRMA/atomic/MPI-atomic-int-int-remote-no.c.j2", 3, NO, MPI_ACC_ACC),
    ("MPIRMA/atomic/MPI-atomic-int-int-sameorigin-remote-no.c.j2", 2, NO, MPI_ACC_ACC),
];

#[rustfmt::skip]
static SHMEM_ATOMIC: &[Flat] = &[
    ("SHMEM/atomic/shmem-atomic-different-ctx-remote-yes.c.j2", 3, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/atomic/shmem-atomic-same-ctx-remote-no.c.j2", 3, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/atomic/shmem-atomic-same-domain-remote-no.c.j2", 3, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/atomic/shmem-atomic-int-int-remote-no.c.j2", 3, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/atomic/shmem-atomic-int-int-sameorigin-remote-no.c.j2", 3, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/atomic/shmem-atomic-double-long-remote-yes.c.j2", 3, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/atomic/shmem-atomic-int-long-remote-yes.c.j2", 3, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/atomic/shmem-atomic-int-float-remote-yes.c.j2", 3, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/atomic/shmem-atomic-int-float-sameorigin-remote-yes.c.j2", 3, YES, SHMEM_PUT_REMOTELOAD),
];

#[rustfmt::skip]
static GASPI_ATOMIC: &[Flat] = &[
    ("GASPI/atomic/GASPI-atomic-fetchadd-fetchadd-remote-no.c.j2", 3, NO, DUMMY),
    ("GASPI/atomic/GASPI-atomic-fetchadd-fetchadd-remote-offset-yes.c.j2", 3, YES, DUMMY),
    ("GASPI/atomic/GASPI-atomic-fetchadd-fetchadd-remote-offset-no.c.j2", 3, NO, DUMMY),
];

#[rustfmt::skip]
static MPIRMA_HYBRID: &[Flat] = &[
    ("MPIRMA/hybrid/MPI-hybrid-master-local-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-master-local-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-single-local-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-single-local-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-ordered-local-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-for-local-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-section-local-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-section-local-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-task-local-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-task-local-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-master-remote-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-master-remote-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-single-remote-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-single-remote-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-task-remote-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-task-remote-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-section-remote-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-section-remote-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-ordered-remote-no.c.j2", 2, NO, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-for-remote-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-section-barrier-origin-remote-yes.c.j2", 2, YES, MPI_ACC_ACC),
    ("MPIRMA/hybrid/MPI-hybrid-section-sendrecv-origin-remote-yes.c.j2", 2, YES, MPI_ACC_ACC),
];

#[rustfmt::skip]
static SHMEM_HYBRID: &[Flat] = &[
    ("SHMEM/hybrid/shmem-hybrid-for-local-yes.c.j2", 2, YES, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-for-ordered-local-no.c.j2", 2, NO, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-master-local-no.c.j2", 2, NO, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-master-local-yes.c.j2", 2, YES, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-single-local-no.c.j2", 2, NO, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-single-local-yes.c.j2", 2, YES, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-section-local-no.c.j2", 2, NO, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-section-local-yes.c.j2", 2, YES, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-task-local-no.c.j2", 2, NO, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-task-local-yes.c.j2", 2, YES, SHMEM_GET_LOAD),
    ("SHMEM/hybrid/shmem-hybrid-for-ordered-remote-no.c.j2", 2, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-for-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-master-remote-no.c.j2", 2, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-master-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-single-remote-no.c.j2", 2, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-single-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-section-remote-no.c.j2", 2, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-section-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-task-remote-no.c.j2", 2, NO, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-task-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-lock-section-barrier-origin-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
    ("SHMEM/hybrid/shmem-hybrid-lock-section-barrier-origin-signal-remote-yes.c.j2", 2, YES, SHMEM_PUT_REMOTELOAD),
];

#[rustfmt::skip]
static GASPI_HYBRID: &[Flat] = &[
    ("GASPI/hybrid/GASPI-hybrid-for-local-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-for-ordered-local-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-master-local-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-master-local-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-single-local-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-single-local-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-section-local-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-section-local-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-task-local-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-task-local-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-for-ordered-remote-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-for-remote-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-master-remote-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-master-remote-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-single-remote-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-single-remote-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-section-remote-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-section-remote-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-task-remote-no.c.j2", 2, NO, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-task-remote-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-lock-section-barrier-origin-remote-yes.c.j2", 2, YES, DUMMY),
    ("GASPI/hybrid/GASPI-hybrid-lock-section-barrier-origin-p2p-remote-yes.c.j2", 2, YES, DUMMY),
];

fn flat_table(model: Model, discipline: Discipline) -> &'static [Flat] {
    match (model, discipline) {
        (Model::MpiRma, Discipline::Sync) => MPIRMA_SYNC,
        (Model::Shmem, Discipline::Sync) => SHMEM_SYNC,
        (Model::Gaspi, Discipline::Sync) => GASPI_SYNC,
        (Model::MpiRma, Discipline::Atomic) => MPIRMA_ATOMIC,
        (Model::Shmem, Discipline::Atomic) => SHMEM_ATOMIC,
        (Model::Gaspi, Discipline::Atomic) => GASPI_ATOMIC,
        (Model::MpiRma, Discipline::Hybrid) => MPIRMA_HYBRID,
        (Model::Shmem, Discipline::Hybrid) => SHMEM_HYBRID,
        (Model::Gaspi, Discipline::Hybrid) => GASPI_HYBRID,
        _ => &[],
    }
}

/// Resolve the templates of one flat discipline. Hybrid templates are
/// rendered with threading enabled.
pub fn source_templates(catalog: &Catalog, model: Model, discipline: Discipline) -> Vec<SourceTemplate> {
    let mut templates = Vec::new();
    for (filename, nprocs, has_race, pair) in flat_table(model, discipline) {
        let combination = match pair {
            None => (None, None),
            Some((op1, op2)) => match (catalog.lookup(model, op1), catalog.lookup(model, op2)) {
                (Ok(op1), Ok(op2)) => (Some(op1), Some(op2)),
                (Err(e), _) | (_, Err(e)) => {
                    eprintln!("{}", e);
                    continue;
                }
            },
        };
        let template = SourceTemplate::new(filename, *nprocs, has_race, &[combination]);
        templates.push(if discipline == Discipline::Hybrid { template.threaded() } else { template })
    }
    templates
}

/// Jobs for the sync, atomic and hybrid disciplines, model by model.
pub fn flat_jobs(catalog: &Catalog) -> Vec<Job> {
    let mut jobs = Vec::new();
    for model in Model::ALL {
        for discipline in [Discipline::Sync, Discipline::Atomic, Discipline::Hybrid] {
            let templates = source_templates(catalog, model, discipline);
            jobs.append(&mut expand_templates(&templates, model, discipline))
        }
    }
    jobs
}

/// Every job of the corpus, in generation order.
pub fn jobs(catalog: &Catalog) -> Vec<Job> {
    let mut jobs = conflict_jobs(catalog);
    jobs.append(&mut flat_jobs(catalog));
    jobs
}

/// Render `jobs` in order, numbering each case as it is reached.
/// Numbers are handed out whether or not rendering succeeds, so a case
/// keeps its number when other cases fail. Returns the number of
/// failed cases.
pub fn generate(jobs: &[Job], renderer: &Renderer, counters: &mut Counters) -> usize {
    let mut failures = 0;
    for job in jobs {
        let number = counters.increment_and_get(job.discipline, job.model, job.has_race);
        if let Err(e) = renderer.render_job(job, number) {
            eprintln!("{}", e);
            failures += 1
        }
    }
    log!(log::GENERATE, &format!("{} cases, {} failed", jobs.len(), failures));
    failures
}
