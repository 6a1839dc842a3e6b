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

//! Running external commands with a wall-clock timeout, and the
//! per-test output folders that record what was run.
//!
//! A command's stdout and stderr are merged into a single captured
//! string, in the order the chunks arrive. Commands that do not finish
//! in time are killed. On unix every command leads its own process
//! group and the whole group is killed, so descendants that still hold
//! the output pipes (an MPI launcher's ranks, say) go as well. A
//! consequence is that an interrupt from the terminal does not reach
//! running commands.

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use rmarace_lib::log;
use rmarace_lib::metadata::Test;
use rmarace_lib::model::Discipline;

pub const DECODING_ERROR: &str = "decoding error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Success,
    Timeout,
    Crash,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        use RunStatus::*;
        match self {
            Success => "SUCCESS",
            Timeout => "TIMEOUT",
            Crash => "CRASH",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: String,
    pub status: RunStatus,
}

impl Execution {
    pub fn timed_out(&self) -> bool {
        self.status == RunStatus::Timeout
    }

    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Success
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R, tx: Sender<Vec<u8>>) {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn spawn(command: &mut Command) -> io::Result<Child> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.spawn()
}

fn kill(child: &mut Child) -> Execution {
    // The group id is the child's pid, see `spawn`
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let killed = Command::new("kill")
            .args(["-KILL", "--", &group])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if killed.is_err() {
            log!(log::RUN, &format!("Could not kill process group {}", group))
        }
    }
    if child.kill().is_err() {}
    if child.wait().is_err() {}
    Execution { output: String::new(), status: RunStatus::Timeout }
}

/// Run `argv` to completion or until `timeout` has elapsed. A command
/// which cannot be started, or which exits unsuccessfully, is reported
/// as a crash with whatever output it produced.
pub fn run_command(argv: &[String], timeout: Duration) -> Execution {
    let command_line = argv.join(" ");
    let (program, args) = match argv.split_first() {
        Some(split) => split,
        None => return Execution { output: String::new(), status: RunStatus::Crash },
    };

    log!(log::RUN, &format!("Running {}", command_line));
    let deadline = Instant::now() + timeout;

    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = match spawn(&mut command) {
        Ok(child) => child,
        Err(e) => {
            eprintln!("ERROR WHEN RUNNING COMMAND: {}", command_line);
            return Execution { output: format!("{}\n", e), status: RunStatus::Crash };
        }
    };

    let (tx, rx) = channel::unbounded();
    if let Some(stdout) = child.stdout.take() {
        drain(stdout, tx.clone())
    }
    if let Some(stderr) = child.stderr.take() {
        drain(stderr, tx.clone())
    }
    drop(tx);

    let mut bytes = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                log!(log::RUN, &format!("Timeout after {:?}: {}", timeout, command_line));
                return kill(&mut child);
            }
        }
    }

    // Both pipes are closed, but the process itself may linger
    let exit = loop {
        match child.try_wait() {
            Ok(Some(exit)) => break Some(exit),
            Ok(None) if Instant::now() >= deadline => return kill(&mut child),
            Ok(None) => thread::sleep(Duration::from_millis(5)),
            Err(_) => break None,
        }
    };

    let output = String::from_utf8(bytes).unwrap_or_else(|_| DECODING_ERROR.to_string());
    match exit {
        Some(exit) if exit.success() => Execution { output, status: RunStatus::Success },
        _ => {
            eprintln!("ERROR WHEN RUNNING COMMAND: {}", command_line);
            Execution { output, status: RunStatus::Crash }
        }
    }
}

/// The output folder for a single test under a single tool. The test
/// source is copied in, every command run is appended to
/// `<basename>.cmd` and every captured output to `<basename>.stdout`.
pub struct TestDir {
    source: PathBuf,
    cmd_log: File,
    stdout_log: File,
}

impl TestDir {
    /// Set up `<output>/<category>/<discipline>/` for `test`.
    pub fn create(output: &Path, category: &str, discipline: Discipline, test: &Test) -> io::Result<Self> {
        let dir = output.join(category).join(discipline.as_str());
        fs::create_dir_all(&dir)?;
        let source = dir.join(&test.basename);
        fs::copy(&test.filename, &source)?;
        let cmd_log = File::create(dir.join(format!("{}.cmd", test.basename)))?;
        let stdout_log = File::create(dir.join(format!("{}.stdout", test.basename)))?;
        Ok(TestDir { source, cmd_log, stdout_log })
    }

    /// The copy of the test source that all commands operate on.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The source path with `suffix` appended, used to name build
    /// products next to the copy.
    pub fn artifact(&self, suffix: &str) -> String {
        format!("{}{}", self.source.display(), suffix)
    }

    pub fn run(&mut self, argv: &[String], timeout: Duration) -> Execution {
        if writeln!(self.cmd_log, "{}", argv.join(" ")).is_err() {
            eprintln!("Failed to record command for {}", self.source.display())
        }
        let execution = run_command(argv, timeout);
        if self.stdout_log.write_all(execution.output.as_bytes()).is_err() {
            eprintln!("Failed to record output for {}", self.source.display())
        }
        execution
    }
}
