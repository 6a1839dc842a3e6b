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

//! This module loads a TOML file describing the external tools used to
//! format generated tests, and to build and run them against each RMA
//! runtime and race detector.

use std::collections::HashMap;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use toml::Value;

use crate::model::Model;

/// An external program, along with the options that always precede
/// any per-invocation arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub executable: PathBuf,
    pub options: Vec<String>,
}

impl Tool {
    /// Split a command line on whitespace into an executable and its
    /// leading options.
    pub fn parse(command: &str) -> Result<Self, String> {
        let mut words = command.split_whitespace();
        let program = words.next().ok_or_else(|| "Tool command cannot be empty".to_string())?;
        Ok(Tool { executable: PathBuf::from(program), options: words.map(|w| w.to_string()).collect() })
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.options);
        cmd
    }

    /// The full argument vector for this tool followed by `args`.
    pub fn argv<I, S>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut argv = vec![self.executable.display().to_string()];
        argv.extend(self.options.iter().cloned());
        argv.extend(args.into_iter().map(|arg| arg.as_ref().to_string()));
        argv
    }
}

fn get_tool(config: &Value, table: &str, key: &str) -> Result<Tool, String> {
    match config.get(table).and_then(|t| t.get(key)) {
        Some(Value::String(command)) => {
            Tool::parse(command).map_err(|e| format!("Configuration option {}.{}: {}", table, key, e))
        }
        _ => Err(format!("Configuration option {}.{} must be specified", table, key)),
    }
}

/// Like `get_tool`, but an empty string disables the tool.
fn get_optional_tool(config: &Value, table: &str, key: &str) -> Result<Option<Tool>, String> {
    match config.get(table).and_then(|t| t.get(key)) {
        Some(Value::String(command)) if command.trim().is_empty() => Ok(None),
        Some(Value::String(command)) => Ok(Some(Tool::parse(command)?)),
        None => Ok(None),
        _ => Err(format!("Configuration option {}.{} must be a string", table, key)),
    }
}

fn get_path(config: &Value, table: &str, key: &str, default: &str) -> Result<PathBuf, String> {
    match config.get(table).and_then(|t| t.get(key)) {
        Some(Value::String(path)) => Ok(PathBuf::from(path)),
        None => Ok(PathBuf::from(default)),
        _ => Err(format!("Configuration option {}.{} must be a path", table, key)),
    }
}

fn get_words(config: &Value, table: &str, key: &str) -> Result<Vec<String>, String> {
    match config.get(table).and_then(|t| t.get(key)) {
        Some(Value::String(words)) => Ok(words.split_whitespace().map(|w| w.to_string()).collect()),
        None => Ok(Vec::new()),
        _ => Err(format!("Configuration option {}.{} must be a string", table, key)),
    }
}

fn get_integer(config: &Value, table: &str, key: &str, default: u64) -> Result<u64, String> {
    match config.get(table).and_then(|t| t.get(key)) {
        Some(Value::Integer(n)) if *n >= 0 => Ok(*n as u64),
        None => Ok(default),
        _ => Err(format!("Configuration option {}.{} must be a non-negative integer", table, key)),
    }
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub templates: PathBuf,
    pub output: PathBuf,
    /// Run on every generated file before race markers are located.
    pub formatter: Option<Tool>,
}

#[derive(Debug, Clone)]
pub struct Timeouts {
    pub default: Duration,
    pub parcoach_dynamic: Duration,
    pub parcoach_dynamic_retries: usize,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub compiler: Tool,
    pub launcher: Tool,
}

#[derive(Debug, Clone)]
pub struct MustConfig {
    pub compiler: Tool,
    pub runner: Tool,
}

#[derive(Debug, Clone)]
pub struct ParcoachConfig {
    /// Compiles a test to LLVM IR.
    pub emit_llvm: Tool,
    pub analyzer: Tool,
    /// Links instrumented IR into an executable.
    pub linker: Tool,
    /// Trailing linker arguments for the instrumentation runtime.
    pub runtime: Vec<String>,
    pub launcher: Tool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub generate: GenerateConfig,
    pub corpus: PathBuf,
    pub timeouts: Timeouts,
    pub runtimes: HashMap<Model, RuntimeConfig>,
    pub must: MustConfig,
    pub parcoach: ParcoachConfig,
}

static DEFAULT_CONFIG: &str = include_str!("../configs/default.toml");

impl Config {
    pub fn parse(contents: &str) -> Result<Self, String> {
        let config = match contents.parse::<Value>() {
            Ok(config) => config,
            Err(e) => return Err(format!("Error when parsing configuration: {}", e)),
        };

        let generate = GenerateConfig {
            templates: get_path(&config, "generate", "templates", "templates")?,
            output: get_path(&config, "generate", "output", ".")?,
            formatter: get_optional_tool(&config, "generate", "formatter")?,
        };

        let timeouts = Timeouts {
            default: Duration::from_secs(get_integer(&config, "timeouts", "default", 30)?),
            parcoach_dynamic: Duration::from_secs(get_integer(&config, "timeouts", "parcoach_dynamic", 3)?),
            parcoach_dynamic_retries: get_integer(&config, "timeouts", "parcoach_dynamic_retries", 10)? as usize,
        };

        let runtime_table = config.get("runtimes").ok_or_else(|| "Config file has no [runtimes] table".to_string())?;
        let mut runtimes = HashMap::new();
        for model in Model::ALL {
            let compiler = get_tool(runtime_table, model.as_str(), "compiler").map_err(|e| format!("{} in [runtimes]", e))?;
            let launcher = get_tool(runtime_table, model.as_str(), "launcher").map_err(|e| format!("{} in [runtimes]", e))?;
            runtimes.insert(model, RuntimeConfig { compiler, launcher });
        }

        let tools = config.get("tools").ok_or_else(|| "Config file has no [tools] table".to_string())?;
        let must = MustConfig { compiler: get_tool(tools, "MUST", "compiler")?, runner: get_tool(tools, "MUST", "runner")? };
        let parcoach = ParcoachConfig {
            emit_llvm: get_tool(tools, "PARCOACH", "emit_llvm")?,
            analyzer: get_tool(tools, "PARCOACH", "analyzer")?,
            linker: get_tool(tools, "PARCOACH", "linker")?,
            runtime: get_words(tools, "PARCOACH", "runtime")?,
            launcher: get_tool(tools, "PARCOACH", "launcher")?,
        };

        Ok(Config { generate, corpus: get_path(&config, "run", "corpus", ".")?, timeouts, runtimes, must, parcoach })
    }

    pub fn from_file<P>(path: P) -> Result<Self, String>
    where
        P: AsRef<Path>,
    {
        let mut contents = String::new();
        match File::open(&path) {
            Ok(mut handle) => match handle.read_to_string(&mut contents) {
                Ok(_) => (),
                Err(e) => return Err(format!("Unexpected failure while reading config: {}", e)),
            },
            Err(e) => return Err(format!("Error when loading config '{}': {}", path.as_ref().display(), e)),
        };
        Config::parse(&contents)
    }

    /// The configuration shipped with the tools.
    pub fn builtin() -> Result<Self, String> {
        Config::parse(DEFAULT_CONFIG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config() {
        let config = Config::builtin().unwrap();
        assert_eq!(config.timeouts.default, Duration::from_secs(30));
        assert_eq!(config.timeouts.parcoach_dynamic, Duration::from_secs(3));
        assert_eq!(config.timeouts.parcoach_dynamic_retries, 10);
        assert_eq!(config.runtimes[&Model::Shmem].compiler.executable, PathBuf::from("oshcc"));
        assert_eq!(config.generate.formatter.as_ref().unwrap().options, vec!["-i".to_string()]);
        assert_eq!(config.must.runner.executable, PathBuf::from("mustrun"))
    }

    #[test]
    fn test_tool_argv() {
        let tool = Tool::parse("mpicc  -fopenmp -g").unwrap();
        assert_eq!(tool.argv(&["a.c", "-o", "a.exe"]), vec!["mpicc", "-fopenmp", "-g", "a.c", "-o", "a.exe"]);
        assert!(Tool::parse("   ").is_err())
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let err = Config::parse("[runtimes.MPIRMA]\ncompiler = \"mpicc\"\n").unwrap_err();
        assert!(err.contains("launcher"), "{}", err)
    }

    #[test]
    fn test_empty_formatter_disables_formatting() {
        let contents = DEFAULT_CONFIG.replace("formatter = \"clang-format -i\"", "formatter = \"\"");
        let config = Config::parse(&contents).unwrap();
        assert!(config.generate.formatter.is_none())
    }
}
