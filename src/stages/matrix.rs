//! Gene presence/absence and pairwise Jaccard distance matrices, as CSV.

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use layout::{gene_files, CoreGenes, Error as LayoutError};

use crate::fs::Fs;
use crate::ui::Ui;

use super::{BatchReport, Error};

/// Isolates as rows, genes as columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceMatrix {
    pub genes: Vec<String>,
    pub isolates: Vec<String>,
    /// `rows[i][g]` is true if isolate `i` has a file for gene `g`.
    pub rows: Vec<Vec<bool>>,
}

impl PresenceMatrix {
    /// Scan `<genes_dir>/<gene>/` for every gene. The isolate set is every
    /// isolate seen for any gene. A missing gene directory reads as absent
    /// everywhere and is returned as a warning.
    pub fn scan(genes: &CoreGenes, genes_dir: &Path) -> Result<(Self, Vec<String>)> {
        let mut per_gene = Vec::with_capacity(genes.len());
        let mut warnings = Vec::new();

        for (_, gene) in genes.iter() {
            let present: BTreeSet<String> = match gene_files(&genes_dir.join(gene), gene) {
                Ok(files) => files
                    .into_iter()
                    .filter_map(|f| f.isolate)
                    .map(|i| i.as_str().to_owned())
                    .collect(),
                Err(e @ LayoutError::MissingGeneDirectory(_)) => {
                    log::warn!("{e}");
                    warnings.push(format!("{gene}: no gene directory; marked absent"));
                    BTreeSet::new()
                }
                Err(e) => return Err(e.into()),
            };
            per_gene.push(present);
        }

        let isolates: Vec<String> = per_gene
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let rows = isolates
            .iter()
            .map(|i| per_gene.iter().map(|present| present.contains(i)).collect())
            .collect();

        let matrix = Self {
            genes: genes.names().map(str::to_owned).collect(),
            isolates,
            rows,
        };
        Ok((matrix, warnings))
    }

    /// Write with a header row (`isolate`, then gene names) and `1`/`0` cells.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().from_writer(out);
        wtr.write_record(std::iter::once("isolate").chain(self.genes.iter().map(String::as_str)))?;
        for (isolate, row) in self.isolates.iter().zip(&self.rows) {
            wtr.write_record(
                std::iter::once(isolate.as_str()).chain(row.iter().map(|&p| if p { "1" } else { "0" })),
            )?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read a matrix whose first column names the isolates.
    /// Every other cell must be 0 or 1 (`0.0`/`1.0` accepted too).
    pub fn read_csv<R: Read>(input: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(input);
        let genes: Vec<String> = rdr.headers()?.iter().skip(1).map(str::to_owned).collect();

        let mut isolates = Vec::new();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let (isolate, row) = parse_row(&record, &genes)?;
            isolates.push(isolate);
            rows.push(row);
        }
        Ok(Self {
            genes,
            isolates,
            rows,
        })
    }

    /// Square matrix of pairwise Jaccard distances between isolates.
    pub fn jaccard_distances(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|a| self.rows.iter().map(|b| jaccard(a, b)).collect())
            .collect()
    }
}

fn parse_row(record: &StringRecord, genes: &[String]) -> Result<(String, Vec<bool>), Error> {
    let mut cells = record.iter();
    let isolate = cells.next().unwrap_or_default().to_owned();
    let row = cells
        .zip(genes)
        .map(|(cell, gene)| match cell.trim().parse::<f64>() {
            Ok(v) if v == 0.0 => Ok(false),
            Ok(v) if v == 1.0 => Ok(true),
            _ => Err(Error::NonBinaryValue {
                isolate: isolate.clone(),
                gene: gene.clone(),
                value: cell.to_owned(),
            }),
        })
        .collect::<Result<_, _>>()?;
    Ok((isolate, row))
}

/// Mismatching positions over positions where either side is present;
/// two all-absent rows are at distance 0.
pub fn jaccard(a: &[bool], b: &[bool]) -> f64 {
    let (mut either, mut differ) = (0usize, 0usize);
    for (&x, &y) in a.iter().zip(b) {
        if x || y {
            either += 1;
            if x != y {
                differ += 1;
            }
        }
    }
    if either == 0 {
        0.0
    } else {
        differ as f64 / either as f64
    }
}

/// Write a labeled square distance matrix. The corner cell is empty.
pub fn write_distances<W: Write>(labels: &[String], dists: &[Vec<f64>], out: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    wtr.write_record(std::iter::once("").chain(labels.iter().map(String::as_str)))?;
    for (label, row) in labels.iter().zip(dists) {
        let mut record = StringRecord::with_capacity(64, row.len() + 1);
        record.push_field(label);
        for d in row {
            record.push_field(&d.to_string());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the presence/absence matrix of the extracted gene directories.
pub struct Presence<'a> {
    genes: &'a CoreGenes,
    fs: &'a Fs,
    ui: &'a Ui,
}

impl<'a> Presence<'a> {
    pub fn new(genes: &'a CoreGenes, fs: &'a Fs, ui: &'a Ui) -> Self {
        Self { genes, fs, ui }
    }

    pub fn run(&self, genes_dir: &Path, output: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::new("presence/absence matrix");
        let (matrix, warnings) = PresenceMatrix::scan(self.genes, genes_dir)?;
        if matrix.isolates.is_empty() {
            log::warn!("No isolates found under {genes_dir:?}");
        }
        self.ui.verbose_msg(&format!(
            "{} isolates x {} genes",
            matrix.isolates.len(),
            matrix.genes.len()
        ));

        let unit = output.display().to_string();
        match write_staged(self.fs, output, |w| matrix.write_csv(w)) {
            Ok(()) => report.partial(unit, warnings),
            Err(e) => report.failed(unit, format!("{e:#}")),
        }
        Ok(report)
    }
}

/// Computes pairwise Jaccard distances from a presence/absence CSV.
pub struct Jaccard<'a> {
    fs: &'a Fs,
}

impl<'a> Jaccard<'a> {
    pub fn new(fs: &'a Fs) -> Self {
        Self { fs }
    }

    /// A malformed or non-binary input matrix is an error, not a failed unit.
    pub fn run(&self, input: &Path, output: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::new("jaccard distances");
        let file = std::fs::File::open(input).with_context(|| format!("opening {input:?}"))?;
        let matrix =
            PresenceMatrix::read_csv(file).with_context(|| format!("while reading {input:?}"))?;
        let dists = matrix.jaccard_distances();

        let unit = output.display().to_string();
        match write_staged(self.fs, output, |w| write_distances(&matrix.isolates, &dists, w)) {
            Ok(()) => report.complete(unit),
            Err(e) => report.failed(unit, format!("{e:#}")),
        }
        Ok(report)
    }
}

/// Write `output` via a staging file in the same directory.
fn write_staged<F>(fs: &Fs, output: &Path, write: F) -> Result<()>
where
    F: FnOnce(&std::fs::File) -> Result<()>,
{
    let dir = output
        .parent()
        .ok_or_else(|| crate::fs::Error::NoParent(output.display().to_string()))?;
    let staged = fs.create_staging_file(dir)?;
    write(staged.as_file())?;
    fs.persist(staged, output)
}
