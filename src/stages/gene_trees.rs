use std::path::Path;

use anyhow::Result;

use layout::{fasta, gene_files, CoreGenes, GeneFile};
use util::HashSet;

use crate::exec::{Aligner, TreeBuilder};
use crate::fs::Fs;
use crate::ui::Ui;

use super::{BatchReport, Error};

/// Alignment needs at least this many sequences.
const MIN_SEQUENCES: usize = 2;

/// Aligns and infers a tree for each core gene on its own.
///
/// Genes are independent jobs: one gene failing (too few sequences, aligner
/// or tree tool failure) is reported and the loop moves on to the next.
pub struct GeneTrees<'a> {
    genes: &'a CoreGenes,
    aligner: &'a Aligner,
    builder: &'a TreeBuilder,
    fs: &'a Fs,
    ui: &'a Ui,
}

impl<'a> GeneTrees<'a> {
    pub fn new(
        genes: &'a CoreGenes,
        aligner: &'a Aligner,
        builder: &'a TreeBuilder,
        fs: &'a Fs,
        ui: &'a Ui,
    ) -> Self {
        Self {
            genes,
            aligner,
            builder,
            fs,
            ui,
        }
    }

    /// `genes_dir` holds one subdirectory per gene; results go to `<output>/<gene>/`.
    /// The report has one unit per gene, in canonical order.
    pub fn run(&self, genes_dir: &Path, output: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::new("per-gene trees");
        self.fs.create_dir(output)?;

        for (_, gene) in self.genes.iter() {
            self.ui.verbose_progress(gene);
            match self.gene_job(gene, genes_dir, output) {
                Ok(warnings) => {
                    self.ui.done();
                    report.partial(gene, warnings);
                }
                Err(e) => {
                    self.ui.verbose_msg("");
                    report.failed(gene, super::tool_failure(&e));
                }
            }
        }
        Ok(report)
    }

    fn gene_job(&self, gene: &str, genes_dir: &Path, output: &Path) -> Result<Vec<String>> {
        let files = gene_files(&genes_dir.join(gene), gene)?;
        let renamed = rename_records(gene, &files);
        if renamed.count < MIN_SEQUENCES {
            return Err(Error::TooFewSequences {
                gene: gene.to_owned(),
                found: renamed.count,
            }
            .into());
        }
        log::debug!("{gene}: aligning {} sequences", renamed.count);

        self.fs.create_dir(self.fs.gene_dir(output, gene))?;
        let alignment = self.aligner.align(
            self.fs,
            gene,
            &renamed.records,
            &self.fs.gene_alignment(output, gene),
        )?;
        alignment.log_diagnostics(gene);
        let artifacts =
            self.builder
                .infer(self.fs, &alignment.path, &self.fs.gene_tree_prefix(output, gene))?;
        log::info!("{gene}: tree written to {:?}", artifacts.treefile);

        Ok(renamed.warnings)
    }
}

/// FASTA input for one gene's alignment job.
#[derive(Debug, Default)]
struct RenamedRecords {
    /// One `><gene>_<isolate>` record per usable file.
    records: String,
    count: usize,
    /// Files that were skipped, and why.
    warnings: Vec<String>,
}

/// Read each file's sequence and give it the leaf name `<gene>_<isolate>`.
fn rename_records(gene: &str, files: &[GeneFile]) -> RenamedRecords {
    let mut out = RenamedRecords::default();
    let mut seen = HashSet::default();

    for file in files {
        let name = file.path.display();
        let Some(isolate) = &file.isolate else {
            out.warnings.push(format!("no isolate id in filename {name}; skipped"));
            continue;
        };
        if !seen.insert(isolate.as_str()) {
            out.warnings
                .push(format!("isolate {isolate} already has a sequence; skipped {name}"));
            continue;
        }
        match fasta::read_sequence(&file.path) {
            Ok(seq) if seq.is_empty() => {
                out.warnings.push(format!("no sequence in {name}; skipped"));
            }
            Ok(seq) => {
                out.records.push_str(&format!(">{gene}_{isolate}\n{seq}\n"));
                out.count += 1;
            }
            Err(e) => {
                out.warnings.push(format!("error reading {name}: {e}; skipped"));
            }
        }
    }
    for w in &out.warnings {
        log::warn!("{gene}: {w}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_rename_records() -> Result<()> {
        let dir = tempdir()?;
        for (name, text) in [
            ("Extracted_omtA_x_A.fa", ">orig header\nAC\nGT\n"),
            ("Extracted_omtA_y_A.fasta", ">dup\nTTTT\n"),
            ("Extracted_omtA_x_B.fa", ">B\nCCCC\n"),
            ("Extracted_omtA_x_C.fa", ">C\n"),
            ("Extracted_omtA_x_D-2.fa", ">D\nGGGG\n"),
        ] {
            fs::write(dir.path().join(name), text)?;
        }

        let files = gene_files(dir.path(), "omtA")?;
        let renamed = rename_records("omtA", &files);
        assert_eq!(renamed.records, ">omtA_A\nACGT\n>omtA_B\nCCCC\n");
        assert_eq!(renamed.count, 2);
        assert_eq!(renamed.warnings.len(), 3);
        Ok(())
    }
}
