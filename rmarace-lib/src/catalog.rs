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

//! The operation catalog maps a (model, logical name) pair to the
//! code snippet and access-kind tags of one RMA operation or plain
//! memory access. Operations are immutable once registered.

use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use crate::model::Model;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub model: Model,
    /// Display name, used in generated file names and as the pairing
    /// key when enumerating combinations.
    pub name: String,
    /// The underlying call, used in the race pair of the ground truth.
    pub callname: String,
    pub local_opkind: String,
    pub remote_opkind: String,
    pub code: String,
    pub additional_declarations: String,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Duplicate(Model, String),
    NotFound(Model, String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use CatalogError::*;
        match self {
            Duplicate(model, name) => write!(f, "Operation {} is already registered for {}", name, model),
            NotFound(model, name) => write!(f, "No operation {} registered for {}", name, model),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

/// Fields of an operation other than its model, in registration order.
pub struct Descriptor<'a> {
    pub name: &'a str,
    pub callname: &'a str,
    pub local_opkind: &'a str,
    pub remote_opkind: &'a str,
    pub code: &'a str,
    pub additional_declarations: &'a str,
}

#[derive(Debug, Default)]
pub struct Catalog {
    operations: HashMap<(Model, String), Operation>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog { operations: HashMap::new() }
    }

    /// Register an operation under a logical name. Registering the
    /// same (model, name) twice is an error, the first registration is
    /// kept.
    pub fn register(&mut self, model: Model, name: &str, desc: Descriptor) -> Result<(), CatalogError> {
        let key = (model, name.to_string());
        if self.operations.contains_key(&key) {
            return Err(CatalogError::Duplicate(model, name.to_string()));
        }
        let op = Operation {
            model,
            name: desc.name.to_string(),
            callname: desc.callname.to_string(),
            local_opkind: desc.local_opkind.to_string(),
            remote_opkind: desc.remote_opkind.to_string(),
            code: desc.code.to_string(),
            additional_declarations: desc.additional_declarations.to_string(),
        };
        self.operations.insert(key, op);
        Ok(())
    }

    pub fn lookup(&self, model: Model, name: &str) -> Result<&Operation, CatalogError> {
        self.operations
            .get(&(model, name.to_string()))
            .ok_or_else(|| CatalogError::NotFound(model, name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The catalog of all operations used by the generated corpus.
    /// Registration errors are reported and skipped.
    pub fn builtin() -> Self {
        let mut catalog = Catalog::new();
        for (model, table) in [(Model::MpiRma, MPIRMA_OPS), (Model::Shmem, SHMEM_OPS), (Model::Gaspi, GASPI_OPS)] {
            for (key, name, callname, local_opkind, remote_opkind, code, decls) in table.iter() {
                let desc = Descriptor {
                    name,
                    callname,
                    local_opkind,
                    remote_opkind,
                    code,
                    additional_declarations: decls,
                };
                if let Err(e) = catalog.register(model, key, desc) {
                    eprintln!("{}", e)
                }
            }
        }
        catalog
    }
}

type OpEntry = (&'static str, &'static str, &'static str, &'static str, &'static str, &'static str, &'static str);

#[rustfmt::skip]
static MPIRMA_OPS: &[OpEntry] = &[
    ("local_load", "load", "LOAD", "load", "load", r#"printf("value is %d\n", value);"#, ""),
    ("local_store", "store", "STORE", "store", "store", "value = 42;", ""),
    ("put", "put", "MPI_Put", "local buffer read", "rma write", "MPI_Put(&value, 1, MPI_INT, 1, 0, 1, MPI_INT, win);", ""),
    ("put2", "put", "MPI_Put", "local buffer read", "rma write", "MPI_Put(&value, 1, MPI_INT, 1, 1, 1, MPI_INT, win);", ""),
    ("acc", "acc", "MPI_Accumulate", "local buffer read", "rma atomic write", "MPI_Accumulate(&value, 1, MPI_INT, 1, 0, 1, MPI_INT, MPI_SUM, win);", ""),
    ("acc2", "acc", "MPI_Accumulate", "local buffer read", "rma atomic write", "MPI_Accumulate(&value, 1, MPI_INT, 1, 1, 1, MPI_INT, MPI_SUM, win);", ""),
    ("get", "get", "MPI_Get", "local buffer write", "rma read", "MPI_Get(&value, 1, MPI_INT, 1, 0, 1, MPI_INT, win);", ""),
    ("remote_load", "load", "LOAD", "load", "load", r#"printf("win_base[0] is %d\n", win_base[0]);"#, ""),
    ("remote_store", "store", "STORE", "store", "store", "win_base[0] = 42;", ""),
    ("rget", "rget", "MPI_Rget", "local buffer write", "rma read", "MPI_Rget(&value, 1, MPI_INT, 1, 0, 1, MPI_INT, win, &req);", ""),
    ("rput", "rput", "MPI_Rput", "local buffer read", "rma write", "MPI_Rput(&value, 1, MPI_INT, 1, 0, 1, MPI_INT, win, &req);", ""),
    ("gacc1", "gacc", "MPI_Get_accumulate", "local buffer read", "rma atomic write", "MPI_Get_accumulate(&value, 1, MPI_INT, &value2, 1, MPI_INT, 1, 0, 1, MPI_INT, MPI_SUM, win);", ""),
    ("gacc2", "gacc", "MPI_Get_accumulate", "local buffer write", "rma atomic write", "MPI_Get_accumulate(&value2, 1, MPI_INT, &value, 1, MPI_INT, 1, 0, 1, MPI_INT, MPI_SUM, win);", ""),
    ("gaccread", "gaccread", "MPI_Get_accumulate", "local buffer write", "rma atomic read", "MPI_Get_accumulate(NULL, 0, MPI_DATATYPE_NULL, &value, 1, MPI_INT, 1, 0, 1, MPI_INT, MPI_NO_OP, win);", ""),
    ("fop1", "fop", "MPI_Fetch_and_op", "local buffer read", "rma atomic write", "MPI_Fetch_and_op(&value, &value2, MPI_INT, 1, 0, MPI_SUM, win);", ""),
    ("fop2", "fop", "MPI_Fetch_and_op", "local buffer write", "rma atomic write", "MPI_Fetch_and_op(&value2, &value, MPI_INT, 1, 0, MPI_SUM, win);", ""),
    ("cas1", "cas", "MPI_Compare_and_swap", "local buffer read", "rma atomic write", "MPI_Compare_and_swap(&value, &win_base[0], &value2, MPI_INT, 1, 0, win);", ""),
    ("cas2", "cas", "MPI_Compare_and_swap", "local buffer write", "rma atomic write", "MPI_Compare_and_swap(&value2, &win_base[0], &value, MPI_INT, 1, 0, win);", ""),
];

#[rustfmt::skip]
static SHMEM_OPS: &[OpEntry] = &[
    ("local_load", "load", "LOAD", "load", "load", r#"printf("localbuf is %d\n", localbuf);"#, ""),
    ("local_store", "store", "STORE", "store", "store", "localbuf = 42;", ""),
    ("putnbi", "putnbi", "shmem_int_put_nbi", "local buffer read", "rma write", "shmem_int_put_nbi(&remote, &localbuf, 1, 1);", ""),
    ("putnbi2", "putnbi", "shmem_int_put_nbi", "local buffer read", "rma write", "shmem_int_put_nbi(&remote, &localbuf, 1, 0);", ""),
    ("put", "put", "shmem_int_put", "local buffer read", "rma write", "shmem_int_put(&remote, &localbuf, 1, 1);", ""),
    ("atomicset", "atomicset", "shmem_int_atomic_set", "local buffer read", "rma atomic write", "shmem_int_atomic_set(&remote, 1, 1);", ""),
    ("atomicfetch", "atomicfetch", "shmem_int_atomic_fetch", "local buffer write", "rma atomic read", "localbuf = shmem_int_atomic_fetch(&remote, 1);", ""),
    ("atomicfetchinc", "atomicfetchinc", "shmem_int_atomic_fetch", "local buffer write", "rma atomic write", "localbuf = shmem_int_atomic_fetch_inc(&remote, 1);", ""),
    ("atomicfetchincnbi", "atomicfetchincnbi", "shmem_int_atomic_fetch_inc_nbi", "local buffer write", "rma atomic write", "shmem_int_atomic_fetch_inc_nbi(&localbuf, &remote, 1);", ""),
    ("atomicfetchnbi", "atomicfetchnbi", "shmem_int_atomic_fetch", "local buffer write", "rma atomic read", "shmem_int_atomic_fetch_nbi(&localbuf, &remote, 1);", ""),
    ("atomiccompareswap", "atomiccompareswap", "shmem_int_compare_swap", "local buffer write", "rma atomic write", "localbuf = shmem_int_atomic_compare_swap(&remote, 42, 1, 1);", ""),
    ("atomiccompareswapnbi", "atomiccompareswapnbi", "shmem_int_compare_swap_nbi", "local buffer write", "rma atomic write", "shmem_int_atomic_compare_swap_nbi(&localbuf, &remote, 42, 1, 1);", ""),
    ("getnbi", "getnbi", "shmem_int_get_nbi", "local buffer write", "rma read", "shmem_int_get_nbi(&localbuf, &remote, 1, 1);", ""),
    ("get", "get", "shmem_int_get", "local buffer write", "rma read", "shmem_int_get(&localbuf, &remote, 1, 1);", ""),
    ("remote_load", "load", "LOAD", "load", "load", r#"printf("remote is %d", remote);"#, ""),
    ("remote_store", "store", "STORE", "store", "store", "remote = 42;", ""),
    ("put_remote", "put", "shmem_int_put", "local buffer read", "rma write", "int myval = 42;\nshmem_int_put(&remote, &myval, 1, 1);", ""),
    ("get_remote", "get", "shmem_int_get", "local buffer write", "rma read", "shmem_int_get(&localbuf, &remote, 1, 1);", ""),
    ("put_signal", "put_signal", "shmem_int_put_signal", "local buffer read", "rma write", "shmem_int_put_signal(&remote, &localbuf, 1, &ps_sig_addr, 1, SHMEM_SIGNAL_SET, 1);", "static uint64_t ps_sig_addr = 0;"),
    ("put_signal2", "put_signal", "shmem_int_put_signal", "local buffer read", "rma write", "shmem_int_put_signal(&remote, &localbuf, 1, &ps_sig_addr2, 1, SHMEM_SIGNAL_SET, 1);", "static uint64_t ps_sig_addr2 = 0;"),
    ("put_signal_nbi", "put_signal_nbi", "shmem_int_put_signal_nbi", "local buffer read", "rma write", "shmem_int_put_signal_nbi(&remote, &localbuf, 1, &psn_sig_addr, 1, SHMEM_SIGNAL_SET, 1);", "static uint64_t psn_sig_addr = 0;"),
    ("p", "p", "shmem_int_p", "", "rma write", "shmem_int_p(&remote, 42, 1);", ""),
    ("g", "g", "shmem_int_g", "", "rma read", "localbuf = shmem_int_g(&remote, 1);", ""),
    ("iput", "iput", "shmem_int_iput", "local buffer read", "rma write", "shmem_int_iput(&remote, &localbuf, 1, 1, 1, 1);", ""),
    ("iget", "iget", "shmem_int_iget", "local buffer write", "rma read", "shmem_int_iget(&localbuf, &remote, 1, 1, 1, 1);", ""),
];

#[rustfmt::skip]
static GASPI_OPS: &[OpEntry] = &[
    ("local_load", "load", "LOAD", "load", "load", r#"printf("localbuf[0] is %d\n", localbuf[0]);"#, ""),
    ("local_store", "store", "STORE", "store", "store", "localbuf[0] = 42;", ""),
    ("remote_load", "load", "LOAD", "load", "load", r#"printf("remote_data[0] is %d\n", remote_data[0]);"#, ""),
    ("remote_store", "store", "STORE", "store", "store", "remote_data[0] = 42;", ""),
    ("write", "write", "gaspi_write", "local buffer read", "rma write", "gaspi_write(loc_seg_id, 0, 1, remote_seg_id, 0, sizeof(int), queue_id, GASPI_BLOCK);", ""),
    ("write2", "write", "gaspi_write", "local buffer read", "rma write", "gaspi_write(loc_seg_id, 0, 0, remote_seg_id, 0, sizeof(int), queue_id, GASPI_BLOCK);", ""),
    ("read", "read", "gaspi_read", "local buffer write", "rma read", "gaspi_read(loc_seg_id, 0, 1, remote_seg_id, 0, sizeof(int), queue_id, GASPI_BLOCK);", ""),
    ("fetchadd", "fetchadd", "gaspi_atomic_fetch_add", "local buffer write", "rma atomic write", "gaspi_atomic_fetch_add(remote_seg_id, 0, 1, 1, &localbuf[0], GASPI_BLOCK);", ""),
    ("write_list", "write_list", "gaspi_write_list", "local buffer read", "rma write", "gaspi_write_list(1, &loc_seg_id, (gaspi_offset_t[]) {0}, 1, &remote_seg_id, (gaspi_offset_t[]) {0}, (gaspi_size_t[]) {sizeof(int)}, queue_id, GASPI_BLOCK);", ""),
    ("read_list", "read_list", "gaspi_read_list", "local buffer write", "rma read", "gaspi_read_list(1, &loc_seg_id, (gaspi_offset_t[]) {0}, 1, &remote_seg_id, (gaspi_offset_t[]) {0}, (gaspi_size_t[]) {sizeof(int)}, queue_id, GASPI_BLOCK);", ""),
    ("write_list_notify", "write_list_notify", "gaspi_write_list_notify", "local buffer read", "rma write", "gaspi_write_list_notify(1, &loc_seg_id, (gaspi_offset_t[]) {0}, 1, &remote_seg_id, (gaspi_offset_t[]) {0}, (gaspi_size_t[]) {sizeof(int)}, remote_seg_id, 0, 1, queue_id, GASPI_BLOCK);", ""),
    ("read_list_notify", "read_list_notify", "gaspi_read_list_notify", "local buffer write", "rma read", "gaspi_read_list_notify(1, &loc_seg_id, (gaspi_offset_t[]) {0}, 1, &remote_seg_id, (gaspi_offset_t[]) {0}, (gaspi_size_t[]) {sizeof(int)}, remote_seg_id, 0, queue_id, GASPI_BLOCK);", ""),
    ("write_notify", "write_notify", "gaspi_write_notify", "local buffer read", "rma write", "gaspi_write_notify(loc_seg_id, 0, 1, remote_seg_id, 0, sizeof(int), 0, 1, queue_id, GASPI_BLOCK);", ""),
    ("read_notify", "read_notify", "gaspi_read_notify", "local buffer write", "rma read", "gaspi_read_notify(loc_seg_id, 0, 1, remote_seg_id, 0, sizeof(int), 0, queue_id, GASPI_BLOCK);", ""),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str) -> Descriptor {
        Descriptor {
            name,
            callname: "CALL",
            local_opkind: "load",
            remote_opkind: "load",
            code: "x = 1;",
            additional_declarations: "",
        }
    }

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let mut catalog = Catalog::new();
        catalog.register(Model::MpiRma, "op", desc("first")).unwrap();
        assert_eq!(
            catalog.register(Model::MpiRma, "op", desc("second")),
            Err(CatalogError::Duplicate(Model::MpiRma, "op".to_string()))
        );
        assert_eq!(catalog.lookup(Model::MpiRma, "op").unwrap().name, "first");
        // The same logical name under another model is a different key
        assert!(catalog.register(Model::Shmem, "op", desc("other")).is_ok())
    }

    #[test]
    fn test_lookup_not_found() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog.lookup(Model::Gaspi, "gaccread"),
            Err(CatalogError::NotFound(Model::Gaspi, "gaccread".to_string()))
        )
    }

    #[test]
    fn test_builtin_shares_display_names() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), MPIRMA_OPS.len() + SHMEM_OPS.len() + GASPI_OPS.len());
        let put = catalog.lookup(Model::MpiRma, "put").unwrap();
        let put2 = catalog.lookup(Model::MpiRma, "put2").unwrap();
        assert_eq!(put.name, put2.name);
        assert_ne!(put.code, put2.code);
        assert_eq!(catalog.lookup(Model::Shmem, "put_signal").unwrap().additional_declarations, "static uint64_t ps_sig_addr = 0;")
    }
}
