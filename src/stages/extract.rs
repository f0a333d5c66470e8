use std::path::Path;

use anyhow::{Context, Result};

use layout::{isolate_dirs, CoreGenes, FileIndex, Slot};

use crate::fs::Fs;
use crate::ui::Ui;

use super::BatchReport;

/// Gathers scattered per-isolate extracts into one directory per core gene.
///
/// `source_root` holds one subdirectory per isolate, named by isolate id.
/// For every (gene, isolate) pair the matching `Extracted_<gene>_..._<isolate>.fa`
/// file is copied into `<output>/<gene>/`. A missing pair or a failed copy is
/// reported and skipped; re-running overwrites earlier copies with identical content.
pub struct Extractor<'a> {
    genes: &'a CoreGenes,
    fs: &'a Fs,
    ui: &'a Ui,
}

impl<'a> Extractor<'a> {
    pub fn new(genes: &'a CoreGenes, fs: &'a Fs, ui: &'a Ui) -> Self {
        Self { genes, fs, ui }
    }

    /// Run extraction. The report has one unit per isolate.
    pub fn run(&self, source_root: &Path, output: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::new("core gene extraction");

        self.fs.create_dir(output)?;
        let isolates = isolate_dirs(source_root, Some(self.fs.output_prefix()))
            .with_context(|| format!("while listing isolates in {source_root:?}"))?;
        if isolates.is_empty() {
            log::warn!("No isolate subdirectories found in {source_root:?}");
            return Ok(report);
        }
        self.ui.verbose_msg(&format!(
            "Found {} isolate directories: {}",
            isolates.len(),
            isolates
                .iter()
                .map(|i| i.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        self.ui.verbose_progress("Resolving gene files");
        let index = FileIndex::build(self.genes, isolates, |_, isolate| {
            source_root.join(isolate.as_str())
        });
        self.ui.done();
        index.warn_problems(self.genes);

        let num_isolates = index.isolates().len();
        let mut warnings: Vec<Vec<String>> = vec![Vec::new(); num_isolates];
        let mut copied = vec![0usize; num_isolates];

        for (gene_id, gene) in self.genes.iter() {
            let gene_dir = self.fs.gene_dir(output, gene);
            if let Err(e) = self.fs.create_dir(&gene_dir) {
                log::error!("Unable to create directory for gene '{gene}': {e:#}");
                for w in &mut warnings {
                    w.push(format!("{gene}: output directory could not be created"));
                }
                continue;
            }

            for (i, isolate) in index.isolates().iter().enumerate() {
                match index.get(gene_id, i) {
                    Slot::Found(m) => {
                        let Some(fname) = m.path.file_name() else {
                            continue;
                        };
                        match self.fs.copy(&m.path, gene_dir.join(fname)) {
                            Ok(()) => copied[i] += 1,
                            Err(e) => {
                                log::error!("Error copying {gene} for {isolate}: {e:#}");
                                warnings[i].push(format!("{gene}: copy failed: {e:#}"));
                            }
                        }
                        if m.is_ambiguous() {
                            warnings[i].push(format!(
                                "{gene}: {} files matched, used {:?}",
                                m.also_matched.len() + 1,
                                fname
                            ));
                        }
                    }
                    _ => warnings[i].push(format!("{gene}: not found")),
                }
            }
        }

        for (i, isolate) in index.isolates().iter().enumerate() {
            let unit_warnings = std::mem::take(&mut warnings[i]);
            if copied[i] == 0 {
                report.failed(isolate.as_str(), "no core gene files could be extracted");
            } else {
                report.partial(isolate.as_str(), unit_warnings);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::UnitStatus;
    use std::fs;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) -> Result<()> {
        fs::create_dir_all(path.parent().expect("parent"))?;
        fs::write(path, contents)?;
        Ok(())
    }

    fn snapshot(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
        let mut files = Vec::new();
        for gene in fs::read_dir(dir)? {
            let gene = gene?;
            for f in fs::read_dir(gene.path())? {
                let f = f?;
                let name = format!(
                    "{}/{}",
                    gene.file_name().to_string_lossy(),
                    f.file_name().to_string_lossy()
                );
                files.push((name, fs::read(f.path())?));
            }
        }
        files.sort();
        Ok(files)
    }

    #[test]
    fn test_extract_and_rerun() -> Result<()> {
        let dir = tempdir()?;
        let src = dir.path();
        write(&src.join("A/Extracted_g1_alcohol_A.fa"), ">A g1\nACGT\n")?;
        write(&src.join("A/Extracted_g3_other_A.fa"), ">A g3\nTTTT\n")?;
        write(&src.join("B/Extracted_g1_alcohol_B.fa"), ">B g1\nAAAA\n")?;
        write(&src.join("B/Extracted_g2_x_B.fa"), ">B g2\nCCCC\n")?;
        write(&src.join("B/Extracted_g3_other_B.fa"), ">B g3\nGGGG\n")?;
        fs::create_dir(src.join("C"))?;

        // output nested inside the source root must not be mistaken for an isolate:
        let mut out_fs = Fs::new(&src.join("core_genes"));
        out_fs.ensure_output_dir_exists()?;
        let output = out_fs.output_prefix().to_path_buf();
        let genes = CoreGenes::new(["g1", "g2", "g3"])?;
        let ui = Ui::new(0);

        let report = Extractor::new(&genes, &out_fs, &ui).run(src, &output)?;
        assert_eq!(report.units().len(), 3);
        assert_eq!(report.status("B"), Some(&UnitStatus::Complete));
        assert_eq!(
            report.status("A"),
            Some(&UnitStatus::Partial(vec!["g2: not found".to_owned()]))
        );
        assert!(matches!(report.status("C"), Some(UnitStatus::Failed(_))));

        assert!(output.join("g1/Extracted_g1_alcohol_A.fa").exists());
        assert!(output.join("g2/Extracted_g2_x_B.fa").exists());
        assert!(!output.join("g2/Extracted_g2_x_A.fa").exists());
        let first = snapshot(&output)?;
        assert_eq!(first.len(), 5);

        let report = Extractor::new(&genes, &out_fs, &ui).run(src, &output)?;
        assert_eq!(report.num_failed(), 1);
        assert_eq!(snapshot(&output)?, first);
        Ok(())
    }
}
