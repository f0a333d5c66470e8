use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use layout::CoreGenes;

use crate::args::{Args, Command, TreeArgs};
use crate::exec::{Threads, TreeParams};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Specify the gene order with either --genes or --genes-file, not both")]
    GeneOrderConflict,
    #[error("Input directory does not exist: {}", .0.display())]
    MissingInputDir(PathBuf),
    #[error("Input file does not exist: {}", .0.display())]
    MissingInputFile(PathBuf),
    #[error("Invalid alignment file name \"{0}\" (must be a plain file name)")]
    InvalidAlignmentName(String),
}

/// External tools and their options.
#[derive(Debug, Clone)]
pub struct Tools {
    pub mafft: String,
    pub iqtree: String,
    pub tmp_dir: Option<PathBuf>,
    pub tree: TreeParams,
}

/// What to do, with inputs checked and outputs resolved.
#[derive(Debug, Clone)]
pub enum Stage {
    Extract { source: PathBuf, output: PathBuf },
    Concat { genes_dir: PathBuf, output: PathBuf },
    Align { input: PathBuf, output: PathBuf, name: String },
    Tree { alignment: PathBuf, output: PathBuf },
    GeneTrees { genes_dir: PathBuf, output: PathBuf },
    Presence { genes_dir: PathBuf, output: PathBuf },
    Jaccard { matrix: PathBuf, output: PathBuf },
    Run { source: PathBuf, output: PathBuf },
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Canonical gene order for this run
    pub genes: CoreGenes,
    pub verbose: u8,
    pub tools: Tools,
    pub stage: Stage,
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let genes = gene_order(&args.genes, args.genes_file.as_deref())?;

        let mut tree = TreeArgs::default();
        let stage = match args.command {
            Command::Extract { source, output } => Stage::Extract {
                source: input_dir(&source)?,
                output: output.into(),
            },
            Command::Concat { genes_dir, output } => Stage::Concat {
                genes_dir: input_dir(&genes_dir)?,
                output: output.into(),
            },
            Command::Align {
                input,
                output,
                name,
            } => {
                if Path::new(&name).file_name() != Some(OsStr::new(&name)) {
                    return Err(Error::InvalidAlignmentName(name).into());
                }
                Stage::Align {
                    input: input_dir(&input)?,
                    output: output.into(),
                    name,
                }
            }
            Command::Tree {
                alignment,
                output,
                tree: t,
            } => {
                tree = t;
                Stage::Tree {
                    alignment: input_file(&alignment)?,
                    output: output.into(),
                }
            }
            Command::GeneTrees {
                genes_dir,
                output,
                tree: t,
            } => {
                tree = t;
                Stage::GeneTrees {
                    genes_dir: input_dir(&genes_dir)?,
                    output: output.into(),
                }
            }
            Command::Presence { genes_dir, output } => Stage::Presence {
                genes_dir: input_dir(&genes_dir)?,
                output: output_file(&output),
            },
            Command::Jaccard { matrix, output } => Stage::Jaccard {
                matrix: input_file(&matrix)?,
                output: output_file(&output),
            },
            Command::Run {
                source,
                output,
                tree: t,
            } => {
                tree = t;
                Stage::Run {
                    source: input_dir(&source)?,
                    output: output.into(),
                }
            }
        };

        let threads: Threads = tree.threads.parse()?;
        let tools = Tools {
            mafft: args.mafft,
            iqtree: args.iqtree,
            tmp_dir: args.tmp_dir.map(PathBuf::from),
            tree: TreeParams {
                model: tree.model,
                alrt_replicates: tree.alrt,
                bootstrap_replicates: tree.bootstrap,
                threads,
            },
        };

        Ok(Self {
            genes,
            verbose: args.verbose,
            tools,
            stage,
        })
    }
}

/// `--genes`, else `--genes-file`, else the built-in aflatoxin cluster order.
fn gene_order(genes: &[String], genes_file: Option<&str>) -> Result<CoreGenes> {
    match (genes.is_empty(), genes_file) {
        (false, Some(_)) => Err(Error::GeneOrderConflict.into()),
        (false, None) => Ok(CoreGenes::new(genes.iter().map(|g| g.trim().to_owned()))?),
        (true, Some(file)) => {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("reading gene order from {file:?}"))?;
            Ok(CoreGenes::new(parse_gene_list(&text))?)
        }
        (true, None) => Ok(CoreGenes::aflatoxin_cluster()),
    }
}

/// One gene per line; blank lines and `#` comments are ignored.
fn parse_gene_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split_once('#').map_or(line, |(before, _)| before).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

fn input_dir(path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(path);
    if !path.is_dir() {
        return Err(Error::MissingInputDir(path).into());
    }
    Ok(path.canonicalize()?)
}

fn input_file(path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(path);
    if !path.is_file() {
        return Err(Error::MissingInputFile(path).into());
    }
    Ok(path.canonicalize()?)
}

/// A bare file name is written to the current directory.
fn output_file(path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.parent().is_some_and(|p| p.as_os_str().is_empty()) {
        Path::new(".").join(path)
    } else {
        path
    }
}
