use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::fs::Fs;

use super::{run_cmd, Error};

const TOOL: &str = "IQ-TREE";

/// Thread budget handed to the tree-inference tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Threads {
    /// Let the tool pick.
    #[default]
    Auto,
    Count(NonZeroUsize),
}

impl FromStr for Threads {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<NonZeroUsize>()
            .map(Self::Count)
            .map_err(|_| Error::InvalidThreads(s.to_owned()))
    }
}

impl fmt::Display for Threads {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("AUTO"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

/// Inference parameters shared by every tree job in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeParams {
    /// Model-selection mode, e.g. `TEST` for automatic model selection.
    pub model: String,
    /// SH-aLRT branch-support test replicates.
    pub alrt_replicates: u32,
    /// Bootstrap replicates.
    pub bootstrap_replicates: u32,
    pub threads: Threads,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            model: "TEST".to_owned(),
            alrt_replicates: 1000,
            bootstrap_replicates: 1000,
            threads: Threads::Auto,
        }
    }
}

/// Files a successful tree job produces under its prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeArtifacts {
    /// `<prefix>.treefile`, tree with support values.
    pub treefile: PathBuf,
    /// `<prefix>.log`
    pub log: PathBuf,
    /// `<prefix>.iqtree`, the full report.
    pub report: PathBuf,
}

impl TreeArtifacts {
    fn at(prefix: &Path) -> Self {
        let with_ext = |ext: &str| {
            let mut s = prefix.as_os_str().to_os_string();
            s.push(ext);
            PathBuf::from(s)
        };
        Self {
            treefile: with_ext(".treefile"),
            log: with_ext(".log"),
            report: with_ext(".iqtree"),
        }
    }
}

/// Runs the external tree-inference tool on one alignment at a time.
#[derive(Debug)]
pub struct TreeBuilder {
    program: String,
    params: TreeParams,
    verbose: bool,
}

impl TreeBuilder {
    pub fn new(program: String, params: TreeParams, verbose: bool) -> Self {
        Self {
            program,
            params,
            verbose,
        }
    }

    /// Infer a tree from `alignment`, writing all results under `prefix`.
    /// Existing results with the same prefix are overwritten.
    pub fn infer(&self, fs: &Fs, alignment: &Path, prefix: &Path) -> Result<TreeArtifacts> {
        fs.check_writable(prefix)?;

        let mut cmd = self.command(alignment, prefix);
        let out = run_cmd(TOOL, &mut cmd, None, self.verbose)
            .with_context(|| format!("while inferring tree for {alignment:?}"))?;
        if let Some(stdout) = out.stdout.as_deref() {
            log::trace!("{TOOL} stdout:\n{stdout}");
        }
        if !out.stderr.trim().is_empty() {
            log::info!("{TOOL} diagnostics:\n{}", out.stderr.trim_end());
        }

        let artifacts = TreeArtifacts::at(prefix);
        if !fs.exists(&artifacts.treefile) {
            return Err(Error::ExpectedFileNotFound(artifacts.treefile.display().to_string()).into());
        }
        Ok(artifacts)
    }

    fn command(&self, alignment: &Path, prefix: &Path) -> Command {
        let p = &self.params;
        let mut cmd = Command::new(&self.program);
        cmd.arg("-s")
            .arg(alignment)
            .arg("-m")
            .arg(&p.model)
            .arg("--alrt")
            .arg(p.alrt_replicates.to_string())
            .arg("-b")
            .arg(p.bootstrap_replicates.to_string())
            .arg("-T")
            .arg(p.threads.to_string())
            .arg("-redo")
            .arg("--prefix")
            .arg(prefix);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threads() {
        assert_eq!("AUTO".parse::<Threads>().ok(), Some(Threads::Auto));
        assert_eq!("auto".parse::<Threads>().ok(), Some(Threads::Auto));
        assert_eq!(
            "8".parse::<Threads>().ok(),
            NonZeroUsize::new(8).map(Threads::Count)
        );
        assert!("0".parse::<Threads>().is_err());
        assert!("many".parse::<Threads>().is_err());
        assert_eq!(Threads::Auto.to_string(), "AUTO");
    }

    #[test]
    fn test_command_line() {
        let params = TreeParams {
            bootstrap_replicates: 100,
            threads: "4".parse().expect("valid threads"),
            ..TreeParams::default()
        };
        let builder = TreeBuilder::new("iqtree2".to_owned(), params, false);
        let cmd = builder.command(Path::new("/a/adhA_aligned.fasta"), Path::new("/a/adhA"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-s",
                "/a/adhA_aligned.fasta",
                "-m",
                "TEST",
                "--alrt",
                "1000",
                "-b",
                "100",
                "-T",
                "4",
                "-redo",
                "--prefix",
                "/a/adhA"
            ]
        );
    }

    #[test]
    fn test_artifact_names() {
        let a = TreeArtifacts::at(Path::new("/out/ver-1/ver-1"));
        assert_eq!(a.treefile, Path::new("/out/ver-1/ver-1.treefile"));
        assert_eq!(a.log, Path::new("/out/ver-1/ver-1.log"));
        assert_eq!(a.report, Path::new("/out/ver-1/ver-1.iqtree"));
    }
}
