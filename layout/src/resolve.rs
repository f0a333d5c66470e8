use std::fs;
use std::path::{Path, PathBuf};

use crate::{has_fasta_extension, isolate_from_filename, Error, Isolate, FASTA_EXTENSIONS, FILE_PREFIX};

/// The file resolved for one (gene, isolate) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// The chosen file: the lexicographically smallest matching filename.
    pub path: PathBuf,
    /// Other files matching the same pair, in filename order.
    pub also_matched: Vec<PathBuf>,
}

impl Match {
    /// True if more than one file matched the pair.
    pub fn is_ambiguous(&self) -> bool {
        !self.also_matched.is_empty()
    }
}

/// A sequence file belonging to one gene, with the isolate id recovered from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneFile {
    pub path: PathBuf,
    pub isolate: Option<Isolate>,
}

/// Does `fname` follow `Extracted_<gene>_..._<isolate>.<fa|fasta>`?
pub fn matches_pair(fname: &str, gene: &str, isolate: &str) -> bool {
    let starts = fname
        .strip_prefix(FILE_PREFIX)
        .and_then(|rest| rest.strip_prefix(gene))
        .is_some_and(|rest| rest.starts_with('_'));
    starts
        && FASTA_EXTENSIONS.iter().any(|ext| {
            fname
                .strip_suffix(ext)
                .and_then(|rest| rest.strip_suffix('.'))
                .and_then(|rest| rest.strip_suffix(isolate))
                .is_some_and(|rest| rest.ends_with('_'))
        })
}

/// Find the file for `gene` in `isolate` within `dir`.
///
/// Returns `Ok(None)` if nothing matches; it is up to the caller whether that
/// is fatal. A missing `dir` is reported as [`Error::MissingGeneDirectory`].
/// When several files match, the lexicographically smallest name wins and the
/// rest are listed in [`Match::also_matched`].
pub fn resolve(dir: &Path, gene: &str, isolate: &Isolate) -> Result<Option<Match>, Error> {
    let names = list_file_names(dir)?;
    Ok(pick(dir, &names, gene, isolate))
}

/// All sequence files for `gene` in `dir`, in filename order.
pub fn gene_files(dir: &Path, gene: &str) -> Result<Vec<GeneFile>, Error> {
    let names = list_file_names(dir)?;
    let files = names
        .iter()
        .filter(|name| {
            name.strip_prefix(FILE_PREFIX)
                .and_then(|rest| rest.strip_prefix(gene))
                .is_some_and(|rest| rest.starts_with('_'))
                && has_fasta_extension(name)
        })
        .map(|name| GeneFile {
            path: dir.join(name),
            isolate: isolate_from_filename(name).map(Isolate::new),
        })
        .collect();
    Ok(files)
}

/// Every `.fa`/`.fasta` file in `dir`, in filename order.
pub fn sequence_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let names = list_file_names(dir)?;
    Ok(names
        .iter()
        .filter(|name| has_fasta_extension(name))
        .map(|name| dir.join(name))
        .collect())
}

/// Sorted names of regular files (or links to them) in `dir`.
pub(crate) fn list_file_names(dir: &Path) -> Result<Vec<String>, Error> {
    if !dir.is_dir() {
        return Err(Error::MissingGeneDirectory(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|e| Error::ListDir(dir.to_path_buf(), e))?;

    let mut names = Vec::with_capacity(64);
    for entry in entries {
        let entry = entry.map_err(|e| Error::ListDir(dir.to_path_buf(), e))?;
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => log::debug!("Skipping non-UTF-8 filename {name:?}"),
        }
    }
    names.sort_unstable();
    Ok(names)
}

/// Pick the match for a pair from an already sorted listing.
pub(crate) fn pick(dir: &Path, sorted_names: &[String], gene: &str, isolate: &Isolate) -> Option<Match> {
    let mut hits = sorted_names
        .iter()
        .filter(|name| matches_pair(name, gene, isolate.as_str()))
        .map(|name| dir.join(name));
    let path = hits.next()?;
    Some(Match {
        path,
        also_matched: hits.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_matches_pair() {
        assert!(matches_pair("Extracted_adhA_short_chain_10B.fa", "adhA", "10B"));
        assert!(matches_pair("Extracted_adhA_short_chain_10B.fasta", "adhA", "10B"));
        assert!(!matches_pair("Extracted_adhA_short_chain_110B.fa", "adhA", "10B"));
        assert!(!matches_pair("Extracted_adhAB_x_10B.fa", "adhA", "10B"));
        assert!(!matches_pair("Extracted_ver-1_x_10B.fa", "ver", "10B"));
        assert!(!matches_pair("Extracted_adhA_x_10B.fa.bak", "adhA", "10B"));
    }

    #[test]
    fn test_resolve_found_and_missing() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("Extracted_g1_desc_A.fa"), ">A\nACGT\n")?;

        let hit = resolve(dir.path(), "g1", &Isolate::new("A"))?.expect("file for A");
        assert_eq!(hit.path, dir.path().join("Extracted_g1_desc_A.fa"));
        assert!(!hit.is_ambiguous());

        assert!(resolve(dir.path(), "g1", &Isolate::new("B"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_resolve_missing_dir_is_distinct() -> Result<()> {
        let dir = tempdir()?;
        let res = resolve(&dir.path().join("g9"), "g9", &Isolate::new("A"));
        assert!(matches!(res, Err(Error::MissingGeneDirectory(_))));
        Ok(())
    }

    #[test]
    fn test_ambiguous_match_takes_smallest_name() -> Result<()> {
        let dir = tempdir()?;
        // written in reverse order so creation order can't be what decides:
        fs::write(dir.path().join("Extracted_g1_zeta_A.fa"), ">A\nTTTT\n")?;
        fs::write(dir.path().join("Extracted_g1_beta_A.fasta"), ">A\nCCCC\n")?;
        fs::write(dir.path().join("Extracted_g1_alpha_A.fa"), ">A\nGGGG\n")?;

        let hit = resolve(dir.path(), "g1", &Isolate::new("A"))?.expect("file for A");
        assert_eq!(hit.path, dir.path().join("Extracted_g1_alpha_A.fa"));
        assert!(hit.is_ambiguous());
        assert_eq!(
            hit.also_matched,
            vec![
                dir.path().join("Extracted_g1_beta_A.fasta"),
                dir.path().join("Extracted_g1_zeta_A.fa"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_gene_files() -> Result<()> {
        let dir = tempdir()?;
        for f in [
            "Extracted_g1_x_B.fa",
            "Extracted_g1_x_A.fasta",
            "Extracted_g1_x_C-1.fa",
            "Extracted_g2_x_A.fa",
            "Extracted_g1_x_A.txt",
        ] {
            fs::write(dir.path().join(f), ">h\nA\n")?;
        }
        fs::create_dir(dir.path().join("Extracted_g1_dir_D.fa"))?;

        let files = gene_files(dir.path(), "g1")?;
        let isolates: Vec<Option<&str>> = files
            .iter()
            .map(|f| f.isolate.as_ref().map(Isolate::as_str))
            .collect();
        assert_eq!(isolates, vec![Some("A"), Some("B"), None]);
        Ok(())
    }

    #[test]
    fn test_sequence_files() -> Result<()> {
        let dir = tempdir()?;
        for f in ["b.fasta", "a.fa", "notes.txt", ".fa"] {
            fs::write(dir.path().join(f), ">h\nA\n")?;
        }
        let files = sequence_files(dir.path())?;
        assert_eq!(files, vec![dir.path().join("a.fa"), dir.path().join("b.fasta")]);
        Ok(())
    }
}
