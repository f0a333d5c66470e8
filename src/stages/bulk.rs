use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use layout::sequence_files;

use crate::exec::{Aligner, TreeBuilder};
use crate::fs::Fs;
use crate::ui::Ui;

use super::BatchReport;

/// Aligns every sequence file in a directory together, as a single job.
///
/// The raw contents of the `.fa`/`.fasta` files are joined (in filename
/// order) into one temporary input and handed to the aligner. Any
/// unreadable input file fails the job before the aligner is started.
pub struct BulkAlignment<'a> {
    aligner: &'a Aligner,
    fs: &'a Fs,
    ui: &'a Ui,
}

impl<'a> BulkAlignment<'a> {
    pub fn new(aligner: &'a Aligner, fs: &'a Fs, ui: &'a Ui) -> Self {
        Self { aligner, fs, ui }
    }

    /// Align the files in `input_dir`, writing the alignment to `output`.
    /// The report has a single unit, named after `output`.
    pub fn run(&self, input_dir: &Path, output: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::new("alignment");
        let unit = file_name(output);

        let files = match sequence_files(input_dir) {
            Ok(files) => files,
            Err(e) => {
                report.failed(unit, format!("while listing sequence files in {input_dir:?}: {e}"));
                return Ok(report);
            }
        };
        self.ui
            .verbose_msg(&format!("Collected {} sequence files", files.len()));

        let records = match self.collect(&files) {
            Ok(records) => records,
            Err(e) => {
                report.failed(unit, format!("{e:#}"));
                return Ok(report);
            }
        };

        if let Some(dir) = output.parent() {
            self.fs.create_dir(dir)?;
        }
        let label = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("alignment");
        self.ui.verbose_progress("Aligning");
        match self.aligner.align(self.fs, label, &records, output) {
            Ok(aln) => {
                self.ui.done();
                aln.log_diagnostics(label);
                log::info!("Alignment written to {:?}", aln.path);
                report.complete(unit);
            }
            Err(e) => {
                self.ui.verbose_msg("");
                report.failed(unit, super::tool_failure(&e));
            }
        }
        Ok(report)
    }

    /// Join the raw contents of `files`, each ending in a newline.
    fn collect(&self, files: &[PathBuf]) -> Result<String> {
        let mut records = String::with_capacity(files.len() * 4096);
        for path in files {
            self.fs
                .read_to_buf(path, &mut records)
                .with_context(|| format!("reading {path:?}"))?;
            if !records.is_empty() && !records.ends_with('\n') {
                records.push('\n');
            }
        }
        Ok(records)
    }
}

/// Infers one tree from an existing alignment (e.g. a hand-trimmed one).
pub struct BulkTree<'a> {
    builder: &'a TreeBuilder,
    fs: &'a Fs,
    ui: &'a Ui,
}

impl<'a> BulkTree<'a> {
    pub fn new(builder: &'a TreeBuilder, fs: &'a Fs, ui: &'a Ui) -> Self {
        Self { builder, fs, ui }
    }

    /// Results go to `<out_dir>/<alignment stem>.*`. The report has a single unit.
    pub fn run(&self, alignment: &Path, out_dir: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::new("tree inference");
        let unit = file_name(alignment);

        self.fs.create_dir(out_dir)?;
        let prefix = self.fs.tree_prefix(out_dir, alignment);
        self.ui.verbose_progress("Inferring tree");
        match self.builder.infer(self.fs, alignment, &prefix) {
            Ok(artifacts) => {
                self.ui.done();
                log::info!(
                    "Tree written to {:?} (log {:?}, report {:?})",
                    artifacts.treefile,
                    artifacts.log,
                    artifacts.report
                );
                report.complete(unit);
            }
            Err(e) => {
                self.ui.verbose_msg("");
                report.failed(unit, super::tool_failure(&e));
            }
        }
        Ok(report)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::stages::UnitStatus;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn script(dir: &Path, name: &str, body: &str) -> Result<String> {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path.to_string_lossy().into_owned())
    }

    struct Setup {
        _dir: tempfile::TempDir,
        input: PathBuf,
        tmp: PathBuf,
        bin: PathBuf,
        fs: Fs,
    }

    fn setup() -> Result<Setup> {
        let dir = tempdir()?;
        let input = dir.path().join("concat");
        let tmp = dir.path().join("tmp");
        let bin = dir.path().join("bin");
        for d in [&input, &tmp, &bin] {
            fs::create_dir(d)?;
        }
        fs::write(input.join("concatenated_B_core_genes.fasta"), ">B\nCCCC")?;
        fs::write(input.join("concatenated_A_core_genes.fasta"), ">A\nAAAA\n")?;
        fs::write(input.join("readme.txt"), "not a sequence")?;

        let mut fs = Fs::new(&dir.path().join("out"));
        fs.ensure_output_dir_exists()?;
        Ok(Setup {
            _dir: dir,
            input,
            tmp,
            bin,
            fs,
        })
    }

    #[test]
    fn test_records_joined_in_filename_order() -> Result<()> {
        let s = setup()?;
        // stand-in aligner: echo its input back
        let cat = script(&s.bin, "mafft", r#"for last; do :; done; cat "$last""#)?;
        let aligner = Aligner::new(cat, Some(s.tmp.clone()), false);
        let ui = Ui::new(0);
        let output = s.fs.output_prefix().join("aln.fasta");

        let report = BulkAlignment::new(&aligner, &s.fs, &ui).run(&s.input, &output)?;
        assert_eq!(report.status("aln.fasta"), Some(&UnitStatus::Complete));
        assert_eq!(fs::read_to_string(&output)?, ">A\nAAAA\n>B\nCCCC\n");
        assert_eq!(fs::read_dir(&s.tmp)?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_failure_leaves_nothing_behind() -> Result<()> {
        let s = setup()?;
        let failing = script(&s.bin, "mafft", "echo 'partial' ; echo 'bad input' >&2; exit 1")?;
        let ui = Ui::new(0);
        let output = s.fs.output_prefix().join("aln.fasta");

        for program in [failing, s.bin.join("missing").to_string_lossy().into_owned()] {
            let aligner = Aligner::new(program, Some(s.tmp.clone()), false);
            let report = BulkAlignment::new(&aligner, &s.fs, &ui).run(&s.input, &output)?;
            assert_eq!(report.num_failed(), 1);
            assert!(!output.exists());
            assert_eq!(fs::read_dir(s.fs.output_prefix())?.count(), 0);
            assert_eq!(fs::read_dir(&s.tmp)?.count(), 0);
        }
        Ok(())
    }

    #[test]
    fn test_missing_input_dir_fails_unit() -> Result<()> {
        let s = setup()?;
        let cat = script(&s.bin, "mafft", r#"for last; do :; done; cat "$last""#)?;
        let aligner = Aligner::new(cat, Some(s.tmp.clone()), false);
        let ui = Ui::new(0);
        let output = s.fs.output_prefix().join("aln.fasta");

        let missing = s.input.join("nope");
        let report = BulkAlignment::new(&aligner, &s.fs, &ui).run(&missing, &output)?;
        assert_eq!(report.num_failed(), 1);
        assert!(matches!(report.status("aln.fasta"), Some(UnitStatus::Failed(_))));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn test_tree_prefix_from_alignment_stem() -> Result<()> {
        let s = setup()?;
        let iqtree = script(
            &s.bin,
            "iqtree2",
            r#"while [ $# -gt 0 ]; do [ "$1" = "--prefix" ] && p="$2"; shift; done; echo "(A,B);" > "$p.treefile""#,
        )?;
        let builder = TreeBuilder::new(iqtree, Default::default(), false);
        let ui = Ui::new(0);
        let alignment = s.input.join("concatenated_A_core_genes.fasta");
        let out_dir = s.fs.output_prefix().join("tree");

        let report = BulkTree::new(&builder, &s.fs, &ui).run(&alignment, &out_dir)?;
        assert_eq!(report.num_complete(), 1);
        assert!(out_dir.join("concatenated_A_core_genes.treefile").exists());
        Ok(())
    }
}
