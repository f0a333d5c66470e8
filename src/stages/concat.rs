use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;

use layout::{discover_isolates, fasta, CoreGenes, FileIndex, Isolate};

use crate::fs::Fs;
use crate::ui::Ui;

use super::BatchReport;

/// One isolate's multi-locus sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiLocusRecord {
    pub isolate: Isolate,
    /// Sequences of the resolved genes, joined in canonical order.
    pub sequence: String,
    /// Genes that contributed nothing, in canonical order.
    pub missing: Vec<String>,
}

impl MultiLocusRecord {
    /// Header description noting missing genes, if there are any.
    pub fn description(&self) -> Option<String> {
        if self.missing.is_empty() {
            None
        } else {
            Some(format!("missing_genes={}", self.missing.join(",")))
        }
    }
}

/// Build the record for the isolate at position `isolate` in `index`.
///
/// Genes are visited in canonical order. A gene with no resolved file, an
/// unreadable file or an empty sequence is recorded as missing and simply
/// skipped: nothing is padded in its place.
pub fn assemble(genes: &CoreGenes, index: &FileIndex, isolate: usize) -> MultiLocusRecord {
    let id = index.isolates()[isolate].clone();
    let mut sequence = String::with_capacity(genes.len() * 1024);
    let mut missing = Vec::new();

    for (gene_id, gene) in genes.iter() {
        let Some(path) = index.path(gene_id, isolate) else {
            missing.push(gene.to_owned());
            continue;
        };
        match fasta::read_sequence(path) {
            Ok(seq) if !seq.is_empty() => sequence.push_str(&seq),
            Ok(_) => {
                log::warn!("No sequence in {path:?}; skipping '{gene}' for isolate '{id}'");
                missing.push(gene.to_owned());
            }
            Err(e) => {
                log::warn!("Error reading sequence from {path:?}: {e}; skipping '{gene}' for isolate '{id}'");
                missing.push(gene.to_owned());
            }
        }
    }

    MultiLocusRecord {
        isolate: id,
        sequence,
        missing,
    }
}

/// Writes one concatenated FASTA file per isolate.
///
/// Isolates are discovered from the reference gene's directory under
/// `genes_dir`. An isolate missing some genes still gets a file (noting the
/// missing genes in its header); one missing every gene gets no file and is
/// reported as failed.
pub struct Concatenator<'a> {
    genes: &'a CoreGenes,
    fs: &'a Fs,
    ui: &'a Ui,
}

impl<'a> Concatenator<'a> {
    pub fn new(genes: &'a CoreGenes, fs: &'a Fs, ui: &'a Ui) -> Self {
        Self { genes, fs, ui }
    }

    /// Run concatenation. Fails only on configuration errors; the report has one unit per isolate.
    pub fn run(&self, genes_dir: &Path, output: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::new("concatenation");

        let isolates = discover_isolates(genes_dir, self.genes)?;
        self.fs.create_dir(output)?;
        if isolates.is_empty() {
            return Ok(report);
        }
        self.ui.verbose_msg(&format!("Found {} isolates", isolates.len()));

        let index = FileIndex::build(self.genes, isolates, |gene, _| genes_dir.join(gene));
        index.warn_problems(self.genes);

        for i in 0..index.isolates().len() {
            let record = assemble(self.genes, &index, i);
            let unit = record.isolate.to_string();

            if record.sequence.is_empty() {
                report.failed(
                    unit,
                    format!(
                        "no sequence could be concatenated ({} of {} genes missing)",
                        record.missing.len(),
                        self.genes.len()
                    ),
                );
                continue;
            }

            let path = self.fs.concatenated_fasta(output, record.isolate.as_str());
            if let Err(e) = self.write_record(&record, output, &path) {
                report.failed(unit, format!("{e:#}"));
                continue;
            }
            log::debug!("Created {path:?}");

            let warnings = if record.missing.is_empty() {
                Vec::new()
            } else {
                vec![format!("missing genes: {}", record.missing.join(", "))]
            };
            report.partial(unit, warnings);
        }
        Ok(report)
    }

    fn write_record(&self, record: &MultiLocusRecord, dir: &Path, path: &Path) -> Result<()> {
        let staged = self.fs.create_staging_file(dir)?;
        {
            let mut out = BufWriter::new(staged.as_file());
            fasta::write_record(
                &mut out,
                record.isolate.as_str(),
                record.description().as_deref(),
                &record.sequence,
            )?;
            out.flush()?;
        }
        self.fs.persist(staged, path)
    }
}
