use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::exec::{Aligner, TreeBuilder};
use crate::fs::{Fs, DEFAULT_ALIGNMENT_NAME};
use crate::settings::{Settings, Stage};
use crate::stages::{
    BatchReport, BulkAlignment, BulkTree, Concatenator, Extractor, GeneTrees, Jaccard, Presence,
};
use crate::ui::Ui;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0} unit(s) failed; see summary above")]
    UnitsFailed(usize),
}

impl Error {
    /// `Err` if any unit in `reports` failed.
    pub fn check(reports: &[BatchReport]) -> Result<(), Self> {
        let failed: usize = reports.iter().map(BatchReport::num_failed).sum();
        if failed > 0 {
            Err(Self::UnitsFailed(failed))
        } else {
            Ok(())
        }
    }
}

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let ui = Ui::new(settings.verbose);
        Self { settings, ui }
    }

    /// Run the stage given in settings, returning one report per stage run.
    /// Only configuration errors are returned as `Err`; per-unit failures
    /// are in the reports.
    pub fn run(mut self) -> Result<Vec<BatchReport>> {
        let stage = self.settings.stage.clone();
        let reports = match &stage {
            Stage::Extract { source, output } => {
                let fs = self.output_fs(output)?;
                vec![self.extract(&fs, source, fs.output_prefix())?]
            }
            Stage::Concat { genes_dir, output } => {
                let fs = self.output_fs(output)?;
                vec![self.concat(&fs, genes_dir, fs.output_prefix())?]
            }
            Stage::Align {
                input,
                output,
                name,
            } => {
                let fs = self.output_fs(output)?;
                vec![self.align(&fs, input, &fs.output_prefix().join(name))?]
            }
            Stage::Tree { alignment, output } => {
                let fs = self.output_fs(output)?;
                vec![self.tree(&fs, alignment, fs.output_prefix())?]
            }
            Stage::GeneTrees { genes_dir, output } => {
                let fs = self.output_fs(output)?;
                vec![self.gene_trees(&fs, genes_dir, fs.output_prefix())?]
            }
            Stage::Presence { genes_dir, output } => {
                let fs = self.output_fs(parent_dir(output))?;
                vec![self.presence(&fs, genes_dir, output)?]
            }
            Stage::Jaccard { matrix, output } => {
                let fs = self.output_fs(parent_dir(output))?;
                self.ui.stage("Computing Jaccard distances");
                let report = Jaccard::new(&fs).run(matrix, output)?;
                self.ui.print_elapsed("Computing Jaccard distances");
                vec![report]
            }
            Stage::Run { source, output } => self.run_pipeline(source, output)?,
        };
        Ok(reports)
    }

    fn output_fs(&self, output: &Path) -> Result<Fs> {
        let mut fs = Fs::new(output);
        fs.ensure_output_dir_exists()?;
        log::info!("Using output directory {:?}", fs.output_prefix());
        Ok(fs)
    }

    fn aligner(&self) -> Aligner {
        let tools = &self.settings.tools;
        Aligner::new(tools.mafft.clone(), tools.tmp_dir.clone(), self.ui.verbose)
    }

    fn tree_builder(&self) -> TreeBuilder {
        let tools = &self.settings.tools;
        TreeBuilder::new(tools.iqtree.clone(), tools.tree.clone(), self.ui.verbose)
    }
}

// STAGES ///////////////////
impl App {
    fn extract(&mut self, fs: &Fs, source: &Path, output: &Path) -> Result<BatchReport> {
        self.ui.stage("Extracting core genes");
        let report = Extractor::new(&self.settings.genes, fs, &self.ui)
            .run(source, output)
            .context("while extracting core genes")?;
        self.ui.print_elapsed("Extracting core genes");
        Ok(report)
    }

    fn concat(&mut self, fs: &Fs, genes_dir: &Path, output: &Path) -> Result<BatchReport> {
        self.ui.stage("Concatenating core genes");
        let report = Concatenator::new(&self.settings.genes, fs, &self.ui)
            .run(genes_dir, output)
            .context("while concatenating core genes")?;
        self.ui.print_elapsed("Concatenating core genes");
        Ok(report)
    }

    fn align(&mut self, fs: &Fs, input: &Path, output: &Path) -> Result<BatchReport> {
        self.ui.stage("Aligning concatenated sequences");
        let aligner = self.aligner();
        let report = BulkAlignment::new(&aligner, fs, &self.ui).run(input, output)?;
        self.ui.print_elapsed("Aligning concatenated sequences");
        Ok(report)
    }

    fn tree(&mut self, fs: &Fs, alignment: &Path, output: &Path) -> Result<BatchReport> {
        self.ui.stage("Inferring tree");
        let builder = self.tree_builder();
        let report = BulkTree::new(&builder, fs, &self.ui).run(alignment, output)?;
        self.ui.print_elapsed("Inferring tree");
        Ok(report)
    }

    fn gene_trees(&mut self, fs: &Fs, genes_dir: &Path, output: &Path) -> Result<BatchReport> {
        self.ui.stage("Building per-gene trees");
        let (aligner, builder) = (self.aligner(), self.tree_builder());
        let report = GeneTrees::new(&self.settings.genes, &aligner, &builder, fs, &self.ui)
            .run(genes_dir, output)?;
        self.ui.print_elapsed("Building per-gene trees");
        Ok(report)
    }

    fn presence(&mut self, fs: &Fs, genes_dir: &Path, output: &Path) -> Result<BatchReport> {
        self.ui.stage("Writing presence/absence matrix");
        let report = Presence::new(&self.settings.genes, fs, &self.ui).run(genes_dir, output)?;
        self.ui.print_elapsed("Writing presence/absence matrix");
        Ok(report)
    }

    /// extract -> concatenate -> align, then per-gene trees, all under one output dir.
    fn run_pipeline(&mut self, source: &Path, output: &Path) -> Result<Vec<BatchReport>> {
        let fs = self.output_fs(output)?;
        let extracted = fs.extracted_dir();
        let concatenated = fs.concatenated_dir();
        let alignment = fs.alignment_dir().join(DEFAULT_ALIGNMENT_NAME);
        let gene_trees = fs.gene_trees_dir();

        let mut reports = Vec::with_capacity(4);
        reports.push(self.extract(&fs, source, &extracted)?);
        if reports[0].units().is_empty() {
            log::warn!("Nothing was extracted from {source:?}; stopping");
            return Ok(reports);
        }
        reports.push(self.concat(&fs, &extracted, &concatenated)?);
        reports.push(self.align(&fs, &concatenated, &alignment)?);
        reports.push(self.gene_trees(&fs, &extracted, &gene_trees)?);

        eprintln!("\n{} {:?}", "Pipeline output in".green(), fs.output_prefix());
        Ok(reports)
    }
}

/// Directory holding `file`; `.` for a bare file name.
fn parent_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
