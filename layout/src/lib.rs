//! Data model and filesystem conventions for per-gene, per-isolate sequence extracts.

use std::path::PathBuf;

mod id;
pub use id::GeneId;

mod genes;
pub use genes::{CoreGenes, AFLATOXIN_CLUSTER};

mod isolate;
pub use isolate::{discover_isolates, isolate_dirs, isolate_from_filename, Isolate};

mod resolve;
pub use resolve::{gene_files, matches_pair, resolve, sequence_files, GeneFile, Match};

mod index;
pub use index::{FileIndex, Slot};

/// Reading and writing single-record FASTA files
pub mod fasta;

/// Every per-gene extract filename starts with this.
pub const FILE_PREFIX: &str = "Extracted_";
/// Recognized sequence file extensions.
pub const FASTA_EXTENSIONS: [&str; 2] = ["fa", "fasta"];

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Canonical gene order is empty")]
    EmptyGeneOrder,
    #[error("Gene \"{0}\" appears more than once in the canonical gene order")]
    DuplicateGene(String),
    #[error("Invalid gene name \"{0}\"")]
    InvalidGeneName(String),
    #[error("Too many genes in canonical order: {0}")]
    TooManyGenes(usize),
    #[error("Reference gene directory does not exist: {}", .0.display())]
    MissingReferenceDir(PathBuf),
    #[error("Gene directory does not exist: {}", .0.display())]
    MissingGeneDirectory(PathBuf),
    #[error("Unable to list directory {}", .0.display())]
    ListDir(PathBuf, #[source] std::io::Error),
}

/// `true` if `fname` carries one of the recognized FASTA extensions.
pub fn has_fasta_extension(fname: &str) -> bool {
    match fname.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && FASTA_EXTENSIONS.contains(&ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fasta_extension() {
        assert!(has_fasta_extension("Extracted_adhA_x_10B.fa"));
        assert!(has_fasta_extension("concatenated_A_core_genes.fasta"));
        assert!(!has_fasta_extension("notes.txt"));
        assert!(!has_fasta_extension("fa"));
        assert!(!has_fasta_extension(".fa"));
    }
}
