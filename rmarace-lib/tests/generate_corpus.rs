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
use std::path::{Path, PathBuf};

use rmarace_lib::catalog::Catalog;
use rmarace_lib::config::Tool;
use rmarace_lib::corpus;
use rmarace_lib::counter::Counters;
use rmarace_lib::enumerate::Job;
use rmarace_lib::metadata::{GroundTruth, Test};
use rmarace_lib::model::{Discipline, Model};
use rmarace_lib::render::{JinjaEngine, RenderContext, RenderError, Renderer, TemplateEngine};

mod tmpdir {
    use std::env;
    use std::fs::{create_dir_all, remove_dir_all};
    use std::path::{Path, PathBuf};
    use std::process;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub struct TmpDir {
        path: PathBuf,
    }

    static TMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

    impl TmpDir {
        pub fn new() -> TmpDir {
            let mut path = env::temp_dir();
            path.push(format!("rmarace_{}_{}", process::id(), TMP_COUNTER.fetch_add(1, Ordering::SeqCst)));
            create_dir_all(&path).expect("Could not create temporary directory");
            TmpDir { path }
        }

        pub fn path(&self) -> &Path {
            self.path.as_ref()
        }
    }

    impl Drop for TmpDir {
        fn drop(&mut self) {
            if remove_dir_all(&self.path).is_err() {}
        }
    }
}

/// Renders the operations' code on consecutive lines, each preceded by
/// a marker when the case is racy.
struct StubEngine;

impl TemplateEngine for StubEngine {
    fn render(&self, _template: &Path, ctx: &RenderContext) -> Result<String, RenderError> {
        let (op1, op2) = match (ctx.op1, ctx.op2) {
            (Some(op1), Some(op2)) => (op1, op2),
            _ => return Ok("// no operations\n".to_string()),
        };
        let mut code = String::from("// RACE LABELS BEGIN\n/*\n{\n");
        if ctx.race {
            code.push_str(&format!("\"RACE_KIND\": \"{}\",\n", ctx.access_kind));
            code.push_str(&format!(
                "\"RACE_PAIR\": [\"{}@{{race_loc1}}\",\"{}@{{race_loc2}}\"],\n",
                op1.callname, op2.callname
            ));
        } else {
            code.push_str("\"RACE_KIND\": \"none\",\n");
        }
        code.push_str(&format!("\"NPROCS\": {},\n\"DESCRIPTION\": \"stub\"\n}}\n*/\n// RACE LABELS END\n", ctx.nprocs));
        code.push_str("int main() {\n");
        for op in [op1, op2] {
            if ctx.race {
                code.push_str("// CONFLICT\n")
            }
            code.push_str(&op.code);
            code.push('\n')
        }
        code.push_str("}\n");
        Ok(code)
    }
}

fn line(path: &Path, n: usize) -> String {
    let contents = fs::read_to_string(path).unwrap();
    contents.lines().nth(n - 1).unwrap().to_string()
}

fn conflict_job<'c>(catalog: &'c Catalog, access: &str, has_race: bool) -> Job<'c> {
    corpus::conflict_jobs(catalog)
        .into_iter()
        .find(|job| {
            job.model == Model::MpiRma
                && job.has_race == has_race
                && job.template.to_string_lossy().contains(&format!("-{}-", access))
        })
        .unwrap()
}

#[test]
fn test_stub_round_trip() {
    let tmp = tmpdir::TmpDir::new();
    let catalog = Catalog::builtin();
    let engine = StubEngine;
    let renderer = Renderer::new(&engine, tmp.path(), None);

    let job = conflict_job(&catalog, "local", true);
    let case = renderer.render_job(&job, 5).unwrap();
    assert!(case.path.starts_with(tmp.path().join("MPIRMA").join("conflict")));
    assert!(case.path.file_name().unwrap().to_string_lossy().starts_with("005-MPI-conflict-"));

    let test = Test::from_file(&case.path).unwrap();
    assert!(test.has_race());
    assert_eq!(test.race_kind(), "local");
    assert_eq!(test.nprocs, job.nprocs);
    match &test.truth {
        GroundTruth::Race(detail) => {
            assert_eq!(Some(detail.race_loc1), case.markers.race_loc1);
            assert_eq!(Some(detail.race_loc2), case.markers.race_loc2);
            assert!(detail.race_loc1 < detail.race_loc2);
            assert_eq!(line(&case.path, detail.race_loc1), job.op1.unwrap().code);
            assert_eq!(line(&case.path, detail.race_loc2), job.op2.unwrap().code)
        }
        GroundTruth::NoRace => panic!("expected a race"),
    }
}

#[test]
fn test_stub_race_free() {
    let tmp = tmpdir::TmpDir::new();
    let catalog = Catalog::builtin();
    let engine = StubEngine;
    let renderer = Renderer::new(&engine, tmp.path(), None);

    let job = conflict_job(&catalog, "remote", false);
    let case = renderer.render_job(&job, 1).unwrap();
    assert!(case.path.to_string_lossy().ends_with("-remote-no.c"));
    let contents = fs::read_to_string(&case.path).unwrap();
    assert!(!contents.contains("// CONFLICT"));
    let test = Test::from_file(&case.path).unwrap();
    assert_eq!(test.truth, GroundTruth::NoRace)
}

#[test]
fn test_locations_resolved_after_formatting() {
    let tmp = tmpdir::TmpDir::new();
    let script = tmp.path().join("format.sh");
    // Prepends a header line, shifting every line of the file by one
    fs::write(&script, "{ echo '/* formatted */'; cat \"$1\"; } > \"$1.tmp\" && mv \"$1.tmp\" \"$1\"\n").unwrap();
    let formatter = Tool { executable: PathBuf::from("sh"), options: vec![script.display().to_string()] };

    let catalog = Catalog::builtin();
    let engine = StubEngine;
    let job = conflict_job(&catalog, "local", true);

    let plain = Renderer::new(&engine, tmp.path().join("plain"), None).render_job(&job, 1).unwrap();
    let formatted = Renderer::new(&engine, tmp.path().join("formatted"), Some(formatter)).render_job(&job, 1).unwrap();

    assert_eq!(line(&formatted.path, 1), "/* formatted */");
    assert_eq!(formatted.markers.race_loc1.unwrap(), plain.markers.race_loc1.unwrap() + 1);
    let test = Test::from_file(&formatted.path).unwrap();
    match test.truth {
        GroundTruth::Race(detail) => assert_eq!(line(&formatted.path, detail.race_loc1), job.op1.unwrap().code),
        GroundTruth::NoRace => panic!("expected a race"),
    }
}

#[test]
fn test_missing_template_is_per_case_error() {
    let tmp = tmpdir::TmpDir::new();
    let catalog = Catalog::builtin();
    let engine = JinjaEngine::new(tmp.path().join("no-templates"));
    let renderer = Renderer::new(&engine, tmp.path(), None);

    let jobs: Vec<Job> = corpus::flat_jobs(&catalog).into_iter().take(3).collect();
    let mut counters = Counters::new();
    assert_eq!(corpus::generate(&jobs, &renderer, &mut counters), 3);
    // Numbers are still handed out
    assert_eq!(counters.get(Discipline::Sync).unwrap().get_total(Model::MpiRma), 3)
}

#[test]
fn test_jinja_templates_whole_corpus() {
    let tmp = tmpdir::TmpDir::new();
    let catalog = Catalog::builtin();
    let engine = JinjaEngine::new("../templates");
    let renderer = Renderer::new(&engine, tmp.path(), None);

    let jobs = corpus::jobs(&catalog);
    let mut counters = Counters::new();
    assert_eq!(corpus::generate(&jobs, &renderer, &mut counters), 0);

    for discipline in [Discipline::Conflict, Discipline::Sync, Discipline::Atomic, Discipline::Hybrid] {
        let counter = counters.get(discipline).unwrap();
        for model in Model::ALL {
            let dir = tmp.path().join(model.as_str()).join(discipline.as_str());
            let mut files: Vec<PathBuf> = fs::read_dir(&dir).unwrap().map(|entry| entry.unwrap().path()).collect();
            files.sort();
            assert!(!files.is_empty(), "{}", dir.display());
            assert_eq!(files.len(), counter.get_total(model), "{}", dir.display());

            let mut races = 0;
            for (i, file) in files.iter().enumerate() {
                let name = file.file_name().unwrap().to_string_lossy().into_owned();
                assert!(name.starts_with(&format!("{:03}-", i + 1)), "{}", name);

                let test = Test::from_file(file).unwrap();
                assert_eq!(test.has_race(), name.ends_with("-yes.c"), "{}", name);
                let contents = fs::read_to_string(file).unwrap();
                assert!(!contents.contains("{race_loc"), "{}", name);
                assert_eq!(discipline == Discipline::Hybrid, contents.contains("#include <omp.h>"), "{}", name);
                if let GroundTruth::Race(detail) = &test.truth {
                    races += 1;
                    assert!(name.contains(&format!("-{}-", detail.kind)), "{}", name);
                    let lines: Vec<&str> = contents.lines().collect();
                    assert_eq!(lines[detail.race_loc1 - 2].trim(), "// CONFLICT", "{}", name);
                    assert_eq!(lines[detail.race_loc2 - 2].trim(), "// CONFLICT", "{}", name);
                    assert!(detail.race_loc1 < detail.race_loc2, "{}", name)
                } else {
                    assert!(!contents.contains("// CONFLICT"), "{}", name)
                }
            }
            assert_eq!(races, counter.get_race_count(model), "{}", dir.display())
        }
    }
}
