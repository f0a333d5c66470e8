use std::path::{Component, Path, PathBuf};
use std::{fs, io};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use util::PathEncodingError;

/// Utility fns
mod ops;

/// Defines fns for creating common paths in the output directory
mod paths;
pub use paths::DEFAULT_ALIGNMENT_NAME;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Specified output directory \"{0}\" is not a directory")]
    NotDirectory(String),
    #[error("Can't write \"{0}\": not inside the output directory")]
    NotWhitelisted(String),
    #[error("Path has no parent directory: \"{0}\"")]
    NoParent(String),
}

/// All writes made by the pipeline go through this struct.
///
/// Every destructive operation checks that the path in question is inside the
/// single whitelisted prefix (the output dir); otherwise it is refused.
/// External tools write their own outputs, so callers check the tool's
/// output location with [`Fs::check_writable`] before launching it.
#[derive(Debug)]
pub struct Fs {
    /// The directory we are allowed to modify
    output_prefix: PathBuf,
}

impl Fs {
    /// Create a new `Fs` with the given output directory.
    pub fn new(output_prefix: &Path) -> Self {
        Self {
            output_prefix: output_prefix.to_path_buf(),
        }
    }

    /// The whitelisted output directory.
    pub fn output_prefix(&self) -> &Path {
        &self.output_prefix
    }

    /// Check whether output dir exists, and create it if not.
    pub fn ensure_output_dir_exists(&mut self) -> Result<()> {
        if !self.output_prefix.exists() {
            log::info!(
                "Output directory {:?} doesn't exist. Creating.",
                self.output_prefix
            );
            fs::create_dir_all(&self.output_prefix).context("creating output directory")?;
        } else if !self.output_prefix.is_dir() {
            return Err(Error::NotDirectory(path_str(&self.output_prefix)?.to_owned()).into());
        } else {
            log::debug!(
                "Output directory {:?} already exists. Not creating.",
                self.output_prefix
            );
        }

        self.output_prefix = self.output_prefix.canonicalize()?;
        Ok(())
    }

    /// Check if path exists on disk.
    pub fn exists<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.exists() || path.is_symlink()
    }

    /// Create a directory (uses `std::fs::create_dir_all`, so an entire tree of dirs can be created).
    pub fn create_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_writable(path)?;
        fs::create_dir_all(path).with_context(|| format!("creating dir {path:?}"))?;
        Ok(())
    }

    /// Create an anonymous file in `dir`, to be moved into place with [`Fs::persist`]
    /// once complete. Removed on drop if never persisted.
    pub fn create_staging_file<T: AsRef<Path>>(&self, dir: T) -> Result<NamedTempFile> {
        let dir = dir.as_ref();
        self.check_writable(dir)?;
        let mut builder = tempfile::Builder::new();
        builder.prefix(".staging_");
        // plain rw-rw-rw- less the umask, like any other newly created file:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let f = builder
            .tempfile_in(dir)
            .with_context(|| format!("creating staging file in {dir:?}"))?;
        Ok(f)
    }

    /// Atomically move a staged file to `path`, replacing anything already there.
    pub fn persist<T: AsRef<Path>>(&self, staged: NamedTempFile, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_writable(path)?;
        staged
            .persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("moving staged file to {path:?}"))?;
        Ok(())
    }

    /// Copy file `src` to `tgt`, keeping its permissions and timestamps.
    pub fn copy<T: AsRef<Path>, U: AsRef<Path>>(&self, src: T, tgt: U) -> Result<()> {
        let (src, tgt) = (src.as_ref(), tgt.as_ref());
        self.check_writable(tgt)?;
        ops::copy_preserving(src, tgt).with_context(|| format!("copying {src:?} to {tgt:?}"))?;
        Ok(())
    }

    /// Read entire file into a String.
    pub fn read_to_buf<T: AsRef<Path>>(&self, path: T, strbuf: &mut String) -> Result<(), io::Error> {
        use std::io::Read;
        let path = path.as_ref();
        let mut f = fs::File::open(path)?;
        let cap = f.metadata()?.len() as usize;
        strbuf.reserve(cap);
        f.read_to_string(strbuf)?;
        Ok(())
    }

    /// Fail unless `path` is inside the output directory.
    pub fn check_writable(&self, path: &Path) -> Result<()> {
        if self.is_whitelisted(path) {
            Ok(())
        } else {
            Err(Error::NotWhitelisted(path_str(path)?.to_owned()).into())
        }
    }

    fn is_whitelisted(&self, path: &Path) -> bool {
        if path.components().any(|c| c == Component::ParentDir) {
            return false;
        }
        if path.starts_with(&self.output_prefix) {
            return true;
        }
        // non-canonical spellings of a path inside the prefix:
        path.ancestors()
            .find(|p| p.exists())
            .and_then(|p| p.canonicalize().ok())
            .is_some_and(|p| p.starts_with(&self.output_prefix))
    }
}

fn path_str(path: &Path) -> Result<&str, PathEncodingError> {
    path.to_str().ok_or(PathEncodingError)
}
