use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::fs::Fs;

use super::{run_cmd, Error, ScopedInput};

const TOOL: &str = "MAFFT";

/// A finished alignment.
#[derive(Debug)]
pub struct Alignment {
    pub path: PathBuf,
    /// The aligner's stderr, for reporting.
    pub diagnostics: String,
}

impl Alignment {
    /// Log the aligner's diagnostics, if it printed any.
    pub fn log_diagnostics(&self, label: &str) {
        let text = self.diagnostics.trim_end();
        if !text.is_empty() {
            log::info!("{TOOL} diagnostics for {label}:\n{text}");
        }
    }
}

/// Runs the external multiple-sequence aligner on one set of records at a time.
///
/// The records are written to a [`ScopedInput`], the aligner is run with
/// automatic strategy selection, and its stdout becomes the alignment.
/// Output is staged next to its destination and only moved into place when
/// the aligner succeeds, so a failed job leaves no partial alignment behind.
#[derive(Debug)]
pub struct Aligner {
    program: String,
    tmp_dir: Option<PathBuf>,
    verbose: bool,
}

impl Aligner {
    pub fn new(program: String, tmp_dir: Option<PathBuf>, verbose: bool) -> Self {
        Self {
            program,
            tmp_dir,
            verbose,
        }
    }

    /// Align FASTA `records`, writing the alignment to `output`.
    /// `label` names the job in temp filenames and messages.
    pub fn align(&self, fs: &Fs, label: &str, records: &str, output: &Path) -> Result<Alignment> {
        if records.trim().is_empty() {
            return Err(Error::EmptyInput(label.to_owned()).into());
        }

        let out_dir = output
            .parent()
            .ok_or_else(|| crate::fs::Error::NoParent(output.display().to_string()))?;
        let staged = fs.create_staging_file(out_dir)?;
        let stdout_file = staged
            .reopen()
            .context("opening staged alignment for writing")?;

        let input = ScopedInput::create(self.tmp_dir.as_deref(), label, records)?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("--auto").arg(input.path());
        let res = run_cmd(TOOL, &mut cmd, Some(stdout_file), self.verbose);

        if let Err(e) = input.remove() {
            log::warn!("{e:#}");
        }
        let out = res.with_context(|| format!("while aligning {label}"))?;

        fs.persist(staged, output)?;

        Ok(Alignment {
            path: output.to_path_buf(),
            diagnostics: out.stderr,
        })
    }
}
