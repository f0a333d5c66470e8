use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// A uniquely named temporary input file for one tool job.
///
/// The file is deleted when this value is dropped, so it is gone on every
/// exit path out of the job: success, tool failure, missing executable,
/// or an error while the input was still being written.
#[derive(Debug)]
pub struct ScopedInput {
    file: NamedTempFile,
}

impl ScopedInput {
    /// Write `contents` to a new temporary file in `tmp_dir` (or the system
    /// temp dir). `label` becomes part of the filename for easier debugging.
    pub fn create(tmp_dir: Option<&Path>, label: &str, contents: &str) -> Result<Self> {
        let suffix = format!("_{label}_in.fasta");
        let mut builder = tempfile::Builder::new();
        builder.prefix("mlsa_").suffix(&suffix);
        let mut file = match tmp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("creating temporary tool input")?;

        file.write_all(contents.as_bytes())
            .and_then(|_| file.flush())
            .with_context(|| format!("writing temporary tool input {:?}", file.path()))?;

        log::debug!("Created temporary input {:?}", file.path());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, surfacing any error that dropping would swallow.
    pub fn remove(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file
            .close()
            .with_context(|| format!("removing temporary input {path:?}"))?;
        log::debug!("Removed temporary input {path:?}");
        Ok(())
    }
}
