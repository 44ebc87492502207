//!
//! Command line driver
//!
//! A compile job is one JSON file: the model description with two extra
//! fields, the default real type and the list of recursions to generate.
//!
//! ```json
//! {
//!   "name": "casino",
//!   "numeric": "double",
//!   "recursions": [
//!     { "kind": "forward", "name": "forward", "retain_table": true },
//!     { "kind": "viterbi", "name": "viterbi" }
//!   ],
//!   "tapes": [...], "cliques": [...], "emissions": [...], "transitions": [...]
//! }
//! ```
//!
use crate::analysis::analyze;
use crate::error::{Result, Traced};
use crate::model::description::HmmDescription;
use crate::numeric::Numeric;
use crate::recursion::{generate, Output, Request};
use crate::session::Session;
use clap::{Parser, Subcommand};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(author, about, version)]
pub struct Opts {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate C++ recursions for a model
    Compile {
        /// Compile job (model description and recursions) in JSON
        model: PathBuf,
        /// Output filename of the body; also of the header unless `--header`
        /// is given
        #[clap(short, long)]
        output: PathBuf,
        /// Output filename of the header
        #[clap(short = 'H', long)]
        header: Option<PathBuf>,
        /// Real type of the generated code (double, bfloat, logspace).
        /// Overrides the one in the job.
        #[clap(short, long)]
        numeric: Option<Numeric>,
    },
    /// Analyse a model and print its clique schedule and state ranges
    Check {
        /// Compile job or bare model description in JSON
        model: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileJob {
    #[serde(flatten)]
    pub hmm: HmmDescription,
    #[serde(default)]
    pub numeric: Numeric,
    #[serde(default)]
    pub recursions: Vec<Request>,
}

impl CompileJob {
    pub fn from_json(json: &str) -> Result<CompileJob> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CompileJob> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).within_with(|| path.display().to_string())?;
        CompileJob::from_json(&json).within_with(|| path.display().to_string())
    }
    ///
    /// Analyse the model and generate every requested recursion.
    ///
    pub fn compile(&self, numeric: Option<Numeric>, header_name: &str) -> Result<Output> {
        let a = analyze(self.hmm.to_hmm()?)?;
        let mut session = Session::new(numeric.unwrap_or(self.numeric));
        generate(&a, &self.recursions, &mut session, header_name)
    }
}

///
/// File name the body uses to include `header`
///
fn header_name(header: Option<&Path>, output: &Path) -> String {
    header
        .unwrap_or(output)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hmm.h".to_string())
}

///
/// Compile `model` and write the result. Nothing is written unless the
/// whole program was generated.
///
pub fn run_compile(
    model: &Path,
    output: &Path,
    header: Option<&Path>,
    numeric: Option<Numeric>,
) -> Result<()> {
    let job = CompileJob::from_file(model)?;
    let out = job.compile(numeric, &header_name(header, output))?;
    match header {
        Some(header) => {
            std::fs::write(header, &out.header).within_with(|| header.display().to_string())?;
            std::fs::write(output, &out.body).within_with(|| output.display().to_string())?;
            info!(
                "wrote {} and {}",
                header.display(),
                output.display()
            );
        }
        None => {
            std::fs::write(output, &out.combined).within_with(|| output.display().to_string())?;
            info!("wrote {}", output.display());
        }
    }
    Ok(())
}

///
/// Human readable summary of the analysis of `model`
///
pub fn run_check(model: &Path) -> Result<String> {
    let job = CompileJob::from_file(model)?;
    let a = analyze(job.hmm.to_hmm()?)?;
    let mut lines = vec![format!("hmm {}", a.hmm.name)];
    for &c in a.schedule.iter() {
        let clique = a.hmm.clique(c);
        lines.push(format!("clique {} {}", clique.name, a.clique_range(c)));
        for &s in clique.states.iter() {
            lines.push(format!("  state {} {}", a.hmm.state(s).name, a.state_range(s)));
        }
    }
    for (tape, length) in a.hmm.tapes.iter().zip(a.fixed_lengths.iter()) {
        if let Some(length) = length {
            lines.push(format!("tape {} has fixed length {}", tape.name, length));
        }
    }
    lines.push(format!("folded generations {}", a.fold_generations));
    Ok(lines.join("\n"))
}

pub fn run(opts: &Opts) -> Result<()> {
    match &opts.command {
        Commands::Compile {
            model,
            output,
            header,
            numeric,
        } => run_compile(model, output, header.as_deref(), *numeric),
        Commands::Check { model } => {
            println!("{}", run_check(model)?);
            Ok(())
        }
    }
}
