/// Per-unit outcomes and their recap
mod report;
pub use report::{BatchReport, UnitStatus};

/// Core-gene extraction into one directory per gene
mod extract;
pub use extract::Extractor;

/// Per-isolate multi-locus concatenation
mod concat;
pub use concat::Concatenator;

/// Alignment of a whole directory, and tree inference on one alignment
mod bulk;
pub use bulk::{BulkAlignment, BulkTree};

/// Independent alignment + tree jobs, one per gene
mod gene_trees;
pub use gene_trees::GeneTrees;

/// Presence/absence and distance matrices
mod matrix;
pub use matrix::{Jaccard, Presence};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Gene {gene} has {found} usable sequences; alignment needs at least 2")]
    TooFewSequences { gene: String, found: usize },
    #[error("Non-binary value \"{value}\" for isolate {isolate}, gene {gene}")]
    NonBinaryValue {
        isolate: String,
        gene: String,
        value: String,
    },
}

/// Failure reason for an external tool job.
fn tool_failure(e: &anyhow::Error) -> String {
    if crate::exec::Error::is_not_found(e) {
        format!("{e:#} (set the executable with --mafft/--iqtree or MLSA_MAFFT/MLSA_IQTREE)")
    } else {
        format!("{e:#}")
    }
}
