use clap::{ArgAction, Parser, Subcommand};

use crate::fs::DEFAULT_ALIGNMENT_NAME;

const CMD_NAME: &str = "mlsa";
const DEFAULT_MAFFT: &str = "mafft";
const DEFAULT_IQTREE: &str = "iqtree2";

/// Stores our command-line args format.
#[derive(Parser, Debug)]
#[command(name = CMD_NAME, version, long_about = None)]
#[command(about = "Assemble multi-locus sequence datasets and hand them to MAFFT and IQ-TREE")]
pub struct Args {
    /// Canonical gene order; the first gene is the reference for isolate discovery
    #[arg(short, long, value_name = "GENE[,GENE...]", value_delimiter = ',', global = true)]
    pub genes: Vec<String>,

    /// File listing the canonical gene order, one gene per line ('#' starts a comment)
    #[arg(long, value_name = "FILE", global = true)]
    pub genes_file: Option<String>,

    /// Alignment executable
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_MAFFT, global = true)]
    #[arg(env = "MLSA_MAFFT")]
    pub mafft: String,

    /// Tree-inference executable
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_IQTREE, global = true)]
    #[arg(env = "MLSA_IQTREE")]
    pub iqtree: String,

    /// Directory for temporary tool inputs (default: system temp dir)
    #[arg(long, value_name = "DIR", global = true)]
    pub tmp_dir: Option<String>,

    /// Print additional info (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Gather per-isolate gene extracts into one directory per gene
    Extract {
        /// Directory with one subdirectory of extracts per isolate
        #[arg(value_name = "SOURCE")]
        source: String,
        #[arg(short, long, value_name = "DIR", default_value = "core_genes")]
        output: String,
    },
    /// Write one concatenated multi-locus FASTA file per isolate
    Concat {
        /// Directory with one subdirectory per gene
        #[arg(value_name = "GENES_DIR")]
        genes_dir: String,
        #[arg(short, long, value_name = "DIR", default_value = "concatenated_core_genes")]
        output: String,
    },
    /// Align every FASTA file in a directory together
    Align {
        #[arg(value_name = "INPUT_DIR")]
        input: String,
        #[arg(short, long, value_name = "DIR", default_value = "aligned_core_genes")]
        output: String,
        /// Name of the alignment file
        #[arg(long, value_name = "FILE", default_value = DEFAULT_ALIGNMENT_NAME)]
        name: String,
    },
    /// Infer a tree from one alignment
    Tree {
        #[arg(value_name = "ALIGNMENT")]
        alignment: String,
        #[arg(short, long, value_name = "DIR", default_value = "tree")]
        output: String,
        #[command(flatten)]
        tree: TreeArgs,
    },
    /// Align and infer a tree for each gene separately
    GeneTrees {
        /// Directory with one subdirectory per gene
        #[arg(value_name = "GENES_DIR")]
        genes_dir: String,
        #[arg(short, long, value_name = "DIR", default_value = "individual_gene_trees")]
        output: String,
        #[command(flatten)]
        tree: TreeArgs,
    },
    /// Write the gene presence/absence matrix of extracted gene directories
    Presence {
        #[arg(value_name = "GENES_DIR")]
        genes_dir: String,
        #[arg(short, long, value_name = "FILE", default_value = "presence_absence_matrix.csv")]
        output: String,
    },
    /// Compute pairwise Jaccard distances from a presence/absence matrix
    Jaccard {
        #[arg(value_name = "MATRIX")]
        matrix: String,
        #[arg(short, long, value_name = "FILE", default_value = "jaccard_distance_matrix.csv")]
        output: String,
    },
    /// Extract, concatenate, align, and build per-gene trees
    Run {
        #[arg(value_name = "SOURCE")]
        source: String,
        #[arg(short, long, value_name = "DIR", default_value = "mlsa_output")]
        output: String,
        #[command(flatten)]
        tree: TreeArgs,
    },
}

/// Tree-inference options.
#[derive(clap::Args, Debug, Clone)]
pub struct TreeArgs {
    /// Substitution model ('TEST' selects one automatically)
    #[arg(short, long, value_name = "MODEL", default_value = "TEST")]
    pub model: String,

    /// SH-aLRT replicates
    #[arg(long, value_name = "N", default_value_t = 1000)]
    pub alrt: u32,

    /// Bootstrap replicates
    #[arg(short, long, value_name = "N", default_value_t = 1000)]
    pub bootstrap: u32,

    /// Threads ('AUTO' or a positive number)
    #[arg(short = 'T', long, value_name = "N", default_value = "AUTO")]
    pub threads: String,
}

impl Default for TreeArgs {
    fn default() -> Self {
        Self {
            model: "TEST".to_owned(),
            alrt: 1000,
            bootstrap: 1000,
            threads: "AUTO".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let args = Args::try_parse_from([
            "mlsa", "-vv", "gene-trees", "core", "--genes", "g1,g2", "-b", "100", "-T", "4",
        ])
        .expect("valid args");
        assert_eq!(args.verbose, 2);
        assert_eq!(args.genes, ["g1", "g2"]);
        match args.command {
            Command::GeneTrees {
                genes_dir,
                output,
                tree,
            } => {
                assert_eq!(genes_dir, "core");
                assert_eq!(output, "individual_gene_trees");
                assert_eq!(tree.bootstrap, 100);
                assert_eq!(tree.alrt, 1000);
                assert_eq!(tree.threads, "4");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
