use std::path::{Path, PathBuf};

use super::Fs;

/// Default name of the bulk alignment file.
pub const DEFAULT_ALIGNMENT_NAME: &str = "core_genes_mafft_aligned.fasta";

// subdirectories used by a full pipeline run:
const EXTRACTED_DIR: &str = "core_genes";
const CONCATENATED_DIR: &str = "concatenated_core_genes";
const ALIGNMENT_DIR: &str = "aligned_core_genes";
const GENE_TREES_DIR: &str = "individual_gene_trees";

/// Utility fns for making the deterministic output paths of each stage.
/// Fns taking a `base` work relative to a stage's output dir;
/// the others live directly under the output prefix.
impl Fs {
    /// $BASE/gene
    pub fn gene_dir(&self, base: &Path, gene: &str) -> PathBuf {
        base.join(gene)
    }

    /// $BASE/concatenated_<isolate>_core_genes.fasta
    pub fn concatenated_fasta(&self, base: &Path, isolate: &str) -> PathBuf {
        base.join(format!("concatenated_{isolate}_core_genes.fasta"))
    }

    /// $BASE/gene/gene_aligned.fasta
    pub fn gene_alignment(&self, base: &Path, gene: &str) -> PathBuf {
        let mut path = self.gene_dir(base, gene);
        path.push(format!("{gene}_aligned.fasta"));
        path
    }

    /// $BASE/gene/gene (tree-inference output prefix)
    pub fn gene_tree_prefix(&self, base: &Path, gene: &str) -> PathBuf {
        let mut path = self.gene_dir(base, gene);
        path.push(gene);
        path
    }

    /// $BASE/<alignment file stem> (tree-inference output prefix)
    pub fn tree_prefix(&self, base: &Path, alignment: &Path) -> PathBuf {
        let stem = alignment
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "tree".into());
        base.join(stem)
    }

    /// $OUTPUT/core_genes
    pub fn extracted_dir(&self) -> PathBuf {
        self.output_prefix.join(EXTRACTED_DIR)
    }

    /// $OUTPUT/concatenated_core_genes
    pub fn concatenated_dir(&self) -> PathBuf {
        self.output_prefix.join(CONCATENATED_DIR)
    }

    /// $OUTPUT/aligned_core_genes
    pub fn alignment_dir(&self) -> PathBuf {
        self.output_prefix.join(ALIGNMENT_DIR)
    }

    /// $OUTPUT/individual_gene_trees
    pub fn gene_trees_dir(&self) -> PathBuf {
        self.output_prefix.join(GENE_TREES_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let fs = Fs::new(Path::new("/out"));
        let base = fs.gene_trees_dir();
        assert_eq!(
            fs.gene_alignment(&base, "ver-1"),
            Path::new("/out/individual_gene_trees/ver-1/ver-1_aligned.fasta")
        );
        assert_eq!(
            fs.gene_tree_prefix(&base, "ver-1"),
            Path::new("/out/individual_gene_trees/ver-1/ver-1")
        );
        assert_eq!(
            fs.concatenated_fasta(&fs.concatenated_dir(), "10B"),
            Path::new("/out/concatenated_core_genes/concatenated_10B_core_genes.fasta")
        );
        assert_eq!(
            fs.tree_prefix(Path::new("/trees"), Path::new("/aln/core_trimmed.fasta")),
            Path::new("/trees/core_trimmed")
        );
    }
}
