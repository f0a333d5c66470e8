use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::{CoreGenes, Error};

// trailing alphanumeric run directly before the extension:
static ISOLATE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_([0-9A-Za-z]+)\.(?:fa|fasta)$").expect("isolate suffix regex is valid")
});

/// Identifier of one biological isolate, unique within a run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Isolate(String);

impl Isolate {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isolate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Isolate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Recover the isolate id from a sequence filename, e.g.
/// `Extracted_adhA_short_chain_alcohol_dehydrogenase_10B.fa` -> `10B`.
pub fn isolate_from_filename(fname: &str) -> Option<&str> {
    ISOLATE_SUFFIX
        .captures(fname)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Derive the set of isolates from the files in the reference gene's directory
/// (the first gene in canonical order) under `genes_root`.
///
/// Returns isolates sorted by id. An existing directory with no matching
/// filenames yields an empty set and a warning: callers should read this as
/// "no isolates", not as a failure.
pub fn discover_isolates(genes_root: &Path, genes: &CoreGenes) -> Result<Vec<Isolate>, Error> {
    let reference_dir = genes_root.join(genes.reference());
    if !reference_dir.is_dir() {
        return Err(Error::MissingReferenceDir(reference_dir));
    }

    let entries =
        fs::read_dir(&reference_dir).map_err(|e| Error::ListDir(reference_dir.clone(), e))?;

    let mut isolates = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::ListDir(reference_dir.clone(), e))?;
        let fname = entry.file_name();
        let Some(fname) = fname.to_str() else {
            log::debug!("Skipping non-UTF-8 filename {:?}", entry.path());
            continue;
        };
        if let Some(id) = isolate_from_filename(fname) {
            isolates.insert(Isolate::new(id));
        }
    }

    if isolates.is_empty() {
        log::warn!(
            "No isolate ids found in {:?}; check the file naming convention",
            reference_dir
        );
    }
    Ok(isolates.into_iter().collect())
}

/// List isolate source directories: the immediate subdirectories of
/// `source_root`, named by isolate id, sorted.
/// `exclude` is skipped if present (e.g. an output dir nested inside the source root).
pub fn isolate_dirs(source_root: &Path, exclude: Option<&Path>) -> Result<Vec<Isolate>, Error> {
    let exclude = exclude.and_then(|p| p.canonicalize().ok());

    let entries =
        fs::read_dir(source_root).map_err(|e| Error::ListDir(source_root.to_path_buf(), e))?;

    let mut isolates = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::ListDir(source_root.to_path_buf(), e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(exclude) = &exclude {
            if path.canonicalize().is_ok_and(|p| &p == exclude) {
                log::debug!("Skipping output directory {:?}", path);
                continue;
            }
        }
        match entry.file_name().to_str() {
            Some(name) => {
                isolates.insert(Isolate::new(name));
            }
            None => log::warn!("Skipping isolate directory with non-UTF-8 name {:?}", path),
        }
    }
    Ok(isolates.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_isolate_from_filename() {
        assert_eq!(
            isolate_from_filename("Extracted_adhA_short_chain_alcohol_dehydrogenase_10B.fa"),
            Some("10B")
        );
        assert_eq!(isolate_from_filename("Extracted_ver-1_x_K3.fasta"), Some("K3"));
        assert_eq!(isolate_from_filename("Extracted_ver-1_x_K-3.fa"), None);
        assert_eq!(isolate_from_filename("Extracted_adhA_10B.txt"), None);
        assert_eq!(isolate_from_filename("10B.fa"), None);
    }

    #[test]
    fn test_discover_sorted_and_deduped() -> Result<()> {
        let dir = tempdir()?;
        let genes = CoreGenes::new(["g1", "g2"])?;
        let g1 = dir.path().join("g1");
        fs::create_dir(&g1)?;
        for f in [
            "Extracted_g1_a_Y.fa",
            "Extracted_g1_a_X.fa",
            "Extracted_g1_b_X.fasta",
            "readme.txt",
        ] {
            fs::write(g1.join(f), ">h\nA\n")?;
        }

        let isolates = discover_isolates(dir.path(), &genes)?;
        assert_eq!(isolates, vec![Isolate::new("X"), Isolate::new("Y")]);
        Ok(())
    }

    #[test]
    fn test_discover_missing_reference_dir() -> Result<()> {
        let dir = tempdir()?;
        let genes = CoreGenes::new(["g1"])?;
        let res = discover_isolates(dir.path(), &genes);
        assert!(matches!(res, Err(Error::MissingReferenceDir(_))));
        Ok(())
    }

    #[test]
    fn test_discover_no_matches_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let genes = CoreGenes::new(["g1"])?;
        fs::create_dir(dir.path().join("g1"))?;
        fs::write(dir.path().join("g1").join("notes.txt"), "nothing")?;
        assert!(discover_isolates(dir.path(), &genes)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_isolate_dirs_excludes_output() -> Result<()> {
        let dir = tempdir()?;
        for d in ["B", "A", "core_genes"] {
            fs::create_dir(dir.path().join(d))?;
        }
        fs::write(dir.path().join("stray.fa"), ">x\nA\n")?;

        let out = dir.path().join("core_genes");
        let isolates = isolate_dirs(dir.path(), Some(&out))?;
        assert_eq!(isolates, vec![Isolate::new("A"), Isolate::new("B")]);
        Ok(())
    }
}
