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
use std::path::Path;

use rmarace_harness::adapter::{Run, Target, TIMEOUT_OUTPUT};
use rmarace_harness::classify::{Outcome, Verdict};
use rmarace_harness::exec::{RunStatus, TestDir};
use rmarace_harness::results::ResultTable;
use rmarace_harness::run_tests::{corpus_jobs, merge_results, run_tests};
use rmarace_lib::config::Config;
use rmarace_lib::metadata::Test;
use rmarace_lib::model::{Discipline, Model};

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
            path.push(format!("rmarace_harness_{}_{}", process::id(), TMP_COUNTER.fetch_add(1, Ordering::SeqCst)));
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

const RACY: &str = r#"// RACE LABELS BEGIN
/*
{
    "RACE_KIND": "local",
    "ACCESS_SET": ["local buffer read","store"],
    "RACE_PAIR": ["MPI_Put@41","STORE@43"],
    "NPROCS": 2,
    "DESCRIPTION": "Two conflicting operations put and store executed concurrently which leads to a race."
}
*/
// RACE LABELS END
int main() { return 0; }
"#;

const RACE_FREE: &str = r#"// RACE LABELS BEGIN
/*
{
    "RACE_KIND": "none",
    "NPROCS": 3,
    "DESCRIPTION": "Two non-conflicting operations executed concurrently with no race."
}
*/
// RACE LABELS END
int main() { return 0; }
"#;

/// Stand-ins for the compilers and tools, written as shell scripts.
/// Compilers copy their input to the `-o` output, the launcher echoes
/// its process count, and the detectors report a race on lines 41 and
/// 43 of whatever they are given.
fn fake_config(tmp: &Path, hang: bool) -> Config {
    let script = |name: &str, body: &str| {
        let path = tmp.join(name);
        fs::write(&path, body).unwrap();
        format!("sh {}", path.display())
    };
    let cc = script("cc.sh", "cp \"$1\" \"$3\"\n");
    let fail = script("fail.sh", "echo 'error: no such header'\nexit 1\n");
    let run = script("run.sh", "echo \"running with $2 processes\"\n");
    let must = script(
        "must.sh",
        "for last; do :; done\nb=$(basename \"$last\" .exe-must)\necho \"ERROR: data race at $b:41 and $b:43\"\nexit 1\n",
    );
    let parcoach = script("parcoach.sh", "cp \"$1\" \"$3\"\necho 'LocalConcurrency detected: LINE 41 and LINE 43'\n");
    let dynamic = if hang {
        script("dynamic.sh", "sleep 5\n")
    } else {
        script(
            "dynamic.sh",
            "for last; do :; done\nb=$(basename \"$last\" -instrumented.exe)\necho \"Error when inserting memory access at $b:41 and $b:43\"\n",
        )
    };

    Config::parse(&format!(
        r#"
[timeouts]
default = 10
parcoach_dynamic = 1
parcoach_dynamic_retries = 2

[runtimes.MPIRMA]
compiler = "{cc}"
launcher = "{run}"

[runtimes.SHMEM]
compiler = "{fail}"
launcher = "{run}"

[runtimes.GASPI]
compiler = "{cc}"
launcher = "{run}"

[tools.MUST]
compiler = "{cc}"
runner = "{must} --must:tsan"

[tools.PARCOACH]
emit_llvm = "{cc}"
analyzer = "{parcoach}"
linker = "{cc}"
runtime = "-lparcoach"
launcher = "{dynamic}"
"#,
        cc = cc,
        fail = fail,
        run = run,
        must = must,
        parcoach = parcoach,
        dynamic = dynamic
    ))
    .unwrap()
}

fn write_test(dir: &Path, name: &str, contents: &str) -> Test {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    Test::from_file(&path).unwrap()
}

fn run_one(config: &Config, target: Target, test: &Test, output: &Path) -> (Run, Verdict) {
    let adapter = target.adapter(config).unwrap();
    let mut dir = TestDir::create(output, target.as_str(), Discipline::Conflict, test).unwrap();
    let run = adapter.run(test, &mut dir);
    let verdict = adapter.classify(test, &run);
    (run, verdict)
}

fn companion(output: &Path, target: Target, test: &Test, suffix: &str) -> String {
    let path = output.join(target.as_str()).join("conflict").join(format!("{}{}", test.basename, suffix));
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_plain_runtime_success() {
    let tmp = tmpdir::TmpDir::new();
    let config = fake_config(tmp.path(), false);
    let test = write_test(&tmp.path().join("corpus"), "001-MPI-conflict-put-store-local-yes.c", RACY);
    let output = tmp.path().join("out");
    let target = Target::Runtime(Model::MpiRma);

    let (_, verdict) = run_one(&config, target, &test, &output);
    assert_eq!(verdict, Verdict::Plain(RunStatus::Success));

    let cmds = companion(&output, target, &test, ".cmd");
    let cmds: Vec<&str> = cmds.lines().collect();
    assert_eq!(cmds.len(), 2);
    assert!(cmds[0].ends_with(".c.exe"));
    assert!(cmds[1].contains(" -np 2 "));
    assert!(companion(&output, target, &test, ".stdout").contains("running with 2 processes"));
    assert!(output.join("MPIRMA").join("conflict").join(&test.basename).is_file())
}

#[test]
fn test_compilation_failure_stops_run() {
    let tmp = tmpdir::TmpDir::new();
    let config = fake_config(tmp.path(), false);
    let test = write_test(&tmp.path().join("corpus"), "001-shmem-conflict-put-store-local-yes.c", RACY);
    let output = tmp.path().join("out");
    let target = Target::Runtime(Model::Shmem);

    let (run, verdict) = run_one(&config, target, &test, &output);
    assert!(matches!(run, Run::BuildFailed(_)));
    assert_eq!(verdict, Verdict::Plain(RunStatus::Crash));
    assert_eq!(companion(&output, target, &test, ".cmd").lines().count(), 1);
    assert!(companion(&output, target, &test, ".stdout").contains("no such header"))
}

#[test]
fn test_must_grading() {
    let tmp = tmpdir::TmpDir::new();
    let config = fake_config(tmp.path(), false);
    let corpus = tmp.path().join("corpus");
    let output = tmp.path().join("out");

    let racy = write_test(&corpus, "001-MPI-conflict-put-store-local-yes.c", RACY);
    let (run, verdict) = run_one(&config, Target::Must, &racy, &output);
    // The runner exits non-zero, which is graded from its output
    assert!(matches!(run, Run::Completed(ref execution) if execution.status == RunStatus::Crash));
    assert_eq!(verdict, Verdict::Graded(Outcome::TruePositive));

    let clean = write_test(&corpus, "002-MPI-conflict-get-store-local-no.c", RACE_FREE);
    let (_, verdict) = run_one(&config, Target::Must, &clean, &output);
    assert_eq!(verdict, Verdict::Graded(Outcome::FalsePositive));

    let cmds = companion(&output, Target::Must, &clean, ".cmd");
    assert!(cmds.lines().nth(1).unwrap().contains(" --must:tsan -np 3 "))
}

#[test]
fn test_parcoach_static() {
    let tmp = tmpdir::TmpDir::new();
    let config = fake_config(tmp.path(), false);
    let corpus = tmp.path().join("corpus");
    let output = tmp.path().join("out");

    let local = write_test(&corpus, "001-MPI-conflict-put-store-local-yes.c", RACY);
    let (_, verdict) = run_one(&config, Target::ParcoachStatic, &local, &output);
    assert_eq!(verdict, Verdict::Graded(Outcome::TruePositive));

    let remote = write_test(&corpus, "002-MPI-conflict-put-store-remote-yes.c", RACY);
    let (run, verdict) = run_one(&config, Target::ParcoachStatic, &remote, &output);
    assert_eq!(run, Run::Skipped);
    assert_eq!(verdict, Verdict::Graded(Outcome::Unsupported));
    assert_eq!(companion(&output, Target::ParcoachStatic, &remote, ".cmd"), "")
}

#[test]
fn test_parcoach_dynamic() {
    let tmp = tmpdir::TmpDir::new();
    let config = fake_config(tmp.path(), false);
    let test = write_test(&tmp.path().join("corpus"), "001-MPI-conflict-put-store-local-yes.c", RACY);
    let output = tmp.path().join("out");

    let (_, verdict) = run_one(&config, Target::ParcoachDynamic, &test, &output);
    assert_eq!(verdict, Verdict::Graded(Outcome::TruePositive));
    let cmds = companion(&output, Target::ParcoachDynamic, &test, ".cmd");
    let cmds: Vec<&str> = cmds.lines().collect();
    assert_eq!(cmds.len(), 4);
    assert!(cmds[2].ends_with("-instrumented.exe -lparcoach"))
}

#[test]
fn test_parcoach_dynamic_retries_exhausted() {
    let tmp = tmpdir::TmpDir::new();
    let config = fake_config(tmp.path(), true);
    let test = write_test(&tmp.path().join("corpus"), "001-MPI-conflict-put-store-local-yes.c", RACY);
    let output = tmp.path().join("out");

    let (run, verdict) = run_one(&config, Target::ParcoachDynamic, &test, &output);
    match run {
        Run::Completed(execution) => {
            assert_eq!(execution.output, TIMEOUT_OUTPUT);
            assert_eq!(execution.status, RunStatus::Timeout)
        }
        other => panic!("unexpected run {:?}", other),
    }
    assert_eq!(verdict, Verdict::Graded(Outcome::Timeout));
    // Three build steps, then one line per attempt
    assert_eq!(companion(&output, Target::ParcoachDynamic, &test, ".cmd").lines().count(), 5)
}

#[test]
fn test_batch_with_malformed_test() {
    let tmp = tmpdir::TmpDir::new();
    let config = fake_config(tmp.path(), false);
    let corpus = tmp.path().join("corpus");
    let dir = corpus.join("MPIRMA").join("conflict");
    write_test(&dir, "002-MPI-conflict-put-store-local-yes.c", RACY);
    write_test(&dir, "001-MPI-conflict-get-store-local-no.c", RACE_FREE);
    fs::write(dir.join("003-MPI-conflict-broken.c"), "int main() {}\n").unwrap();
    fs::write(dir.join("notes.txt"), "not a test\n").unwrap();

    let jobs = corpus_jobs(&corpus, Model::MpiRma, Discipline::Conflict).unwrap();
    let names: Vec<String> =
        jobs.iter().map(|job| job.file.file_name().unwrap().to_string_lossy().into_owned()).collect();
    assert_eq!(
        names,
        vec![
            "001-MPI-conflict-get-store-local-no.c",
            "002-MPI-conflict-put-store-local-yes.c",
            "003-MPI-conflict-broken.c"
        ]
    );
    assert!(corpus_jobs(&corpus, Model::Gaspi, Discipline::Sync).unwrap().is_empty());

    let output = tmp.path().join("out");
    let adapter = Target::Must.adapter(&config).unwrap();
    let (results, errors) = run_tests(jobs, Target::Must, adapter.as_ref(), &output, 2);
    assert_eq!(results.len(), 2);
    assert_eq!(errors.len(), 1);

    let mut table = ResultTable::new();
    merge_results(&mut table, Target::Must, &results);
    let csv_path = output.join("results.csv");
    table.write_csv(&csv_path).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(
        csv,
        ",discipline,MUST\n001-MPI-conflict-get-store-local-no.c,conflict,FP\n002-MPI-conflict-put-store-local-yes.c,conflict,TP\n"
    )
}
