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

//! Rendering a generation job to a test file on disk.
//!
//! The pipeline for a single case is: compute the output name from the
//! template name, render the template, write it out, run the source
//! formatter over the written file, then read it back and resolve the
//! race locations (see [crate::annotate]). Locations are only resolved
//! after formatting, so they refer to the lines of the delivered file.

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::annotate::{annotate, Markers};
use crate::catalog::Operation;
use crate::config::Tool;
use crate::enumerate::Job;
use crate::{if_logging, log};

#[derive(Debug)]
pub enum RenderError {
    Io(PathBuf, io::Error),
    Template(PathBuf, String),
    NoAccessKind(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use RenderError::*;
        match self {
            Io(path, e) => write!(f, "IO error for {}: {}", path.display(), e),
            Template(path, msg) => write!(f, "Failed to render template {}: {}", path.display(), msg),
            NoAccessKind(name) => write!(f, "No kind: {}", name),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RenderError::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

/// The variables visible to a template.
#[derive(Debug, Serialize)]
pub struct RenderContext<'a> {
    pub op1: Option<&'a Operation>,
    pub op2: Option<&'a Operation>,
    pub race: bool,
    pub nprocs: u32,
    pub access_kind: &'a str,
    pub threaded: bool,
}

pub trait TemplateEngine {
    /// Render the template at `template`, a path relative to the
    /// engine's template root.
    fn render(&self, template: &Path, context: &RenderContext) -> Result<String, RenderError>;
}

/// Jinja templates loaded from a directory.
pub struct JinjaEngine {
    env: Environment<'static>,
}

impl JinjaEngine {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(root.as_ref().to_path_buf()));
        env.set_auto_escape_callback(|_| AutoEscape::None);
        JinjaEngine { env }
    }
}

impl TemplateEngine for JinjaEngine {
    fn render(&self, template: &Path, context: &RenderContext) -> Result<String, RenderError> {
        let name = template.to_string_lossy();
        let tmpl = self.env.get_template(&name).map_err(|e| RenderError::Template(template.to_path_buf(), e.to_string()))?;
        tmpl.render(context).map_err(|e| RenderError::Template(template.to_path_buf(), e.to_string()))
    }
}

/// The file name of a generated case: the case number, then the
/// template's base name with `race` replaced by `yes` or `no`, the
/// `op1` and `op2` tokens replaced by the operations' display names
/// and the `.j2` suffix removed.
pub fn output_file_name(
    template: &Path,
    number: usize,
    has_race: bool,
    op1: Option<&Operation>,
    op2: Option<&Operation>,
) -> String {
    let basename = template.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    let name = basename
        .replace("race", if has_race { "yes" } else { "no" })
        .replace("op1", op1.map(|op| op.name.as_str()).unwrap_or(""))
        .replace("op2", op2.map(|op| op.name.as_str()).unwrap_or(""))
        .replace(".j2", "");
    format!("{:03}-{}", number, name)
}

/// Generated files mirror the directory structure of the templates.
pub fn output_dir(output_root: &Path, template: &Path) -> PathBuf {
    match template.parent() {
        Some(parent) => output_root.join(parent),
        None => output_root.to_path_buf(),
    }
}

pub fn access_kind(file_name: &str) -> Result<&'static str, RenderError> {
    if file_name.contains("local") {
        Ok("local")
    } else if file_name.contains("remote") {
        Ok("remote")
    } else {
        Err(RenderError::NoAccessKind(file_name.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct RenderedCase {
    pub path: PathBuf,
    pub markers: Markers,
}

pub struct Renderer<'e> {
    engine: &'e dyn TemplateEngine,
    output_root: PathBuf,
    formatter: Option<Tool>,
}

impl<'e> Renderer<'e> {
    pub fn new<P: AsRef<Path>>(engine: &'e dyn TemplateEngine, output_root: P, formatter: Option<Tool>) -> Self {
        Renderer { engine, output_root: output_root.as_ref().to_path_buf(), formatter }
    }

    fn format(&self, path: &Path) {
        if let Some(formatter) = &self.formatter {
            match formatter.command().arg(path).status() {
                Ok(status) if status.success() => (),
                Ok(status) => eprintln!("Formatter {} exited with {}", formatter.executable.display(), status),
                Err(e) => eprintln!("Failed to run formatter {}: {}", formatter.executable.display(), e),
            }
        }
    }

    /// Render a job as case number `number`.
    pub fn render_job(&self, job: &Job, number: usize) -> Result<RenderedCase, RenderError> {
        let file_name = output_file_name(&job.template, number, job.has_race, job.op1, job.op2);
        let dir = output_dir(&self.output_root, &job.template);
        fs::create_dir_all(&dir).map_err(|e| RenderError::Io(dir.clone(), e))?;
        let path = dir.join(&file_name);

        let access_kind = access_kind(&file_name).unwrap_or_else(|e| {
            eprintln!("{}", e);
            ""
        });

        let context = RenderContext {
            op1: job.op1,
            op2: job.op2,
            race: job.has_race,
            nprocs: job.nprocs,
            access_kind,
            threaded: job.threaded,
        };
        let code = self.engine.render(&job.template, &context)?;
        fs::write(&path, code).map_err(|e| RenderError::Io(path.clone(), e))?;

        self.format(&path);

        let code = fs::read_to_string(&path).map_err(|e| RenderError::Io(path.clone(), e))?;
        let (code, markers) = annotate(&code, job.has_race);
        fs::write(&path, code).map_err(|e| RenderError::Io(path.clone(), e))?;

        if_logging!(log::GENERATE, {
            let name = |op: Option<&Operation>| op.map(|op| op.name.clone()).unwrap_or_else(|| "-".to_string());
            log!(log::GENERATE, &format!("{} {} {} {} nprocs={}", job.model, job.discipline, name(job.op1), name(job.op2), job.nprocs))
        });
        println!("Generated test case {}.", path.display());
        Ok(RenderedCase { path, markers })
    }
}
