use std::path::{Path, PathBuf};

use util::{HashMap, Hasher, IdVec};

use crate::resolve::{list_file_names, pick};
use crate::{CoreGenes, Error, GeneId, Isolate, Match};

/// Resolution state of one (gene, isolate) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Found(Match),
    /// The directory exists but holds no file for the pair.
    Missing,
    /// The directory that should hold the pair does not exist.
    MissingDir(PathBuf),
    /// The directory could not be listed.
    Unlistable(PathBuf, String),
}

impl Slot {
    pub fn found(&self) -> Option<&Match> {
        match self {
            Self::Found(m) => Some(m),
            _ => None,
        }
    }
}

/// Explicit (gene, isolate) -> file mapping, built in one pass before any
/// processing so that every gap and every ambiguity is known up front.
#[derive(Debug)]
pub struct FileIndex {
    isolates: Vec<Isolate>,
    /// one row per gene, one slot per isolate (same order as `isolates`).
    rows: IdVec<GeneId, Vec<Slot>>,
}

impl FileIndex {
    /// Resolve every pair in `genes` x `isolates`.
    /// `dir_for` says which directory holds the file for a given pair.
    /// Each distinct directory is listed only once.
    pub fn build<F>(genes: &CoreGenes, isolates: Vec<Isolate>, mut dir_for: F) -> Self
    where
        F: FnMut(&str, &Isolate) -> PathBuf,
    {
        let mut listings: HashMap<PathBuf, Result<Vec<String>, Error>> =
            HashMap::with_capacity_and_hasher(genes.len().max(isolates.len()), Hasher::default());
        let mut rows = IdVec::with_capacity(genes.len());

        for (_, gene) in genes.iter() {
            let mut row = Vec::with_capacity(isolates.len());
            for isolate in &isolates {
                let dir = dir_for(gene, isolate);
                let listing = &*listings
                    .entry(dir.clone())
                    .or_insert_with(|| list_file_names(&dir));
                row.push(match listing {
                    Ok(names) => match pick(&dir, names, gene, isolate) {
                        Some(m) => Slot::Found(m),
                        None => Slot::Missing,
                    },
                    Err(Error::MissingGeneDirectory(_)) => Slot::MissingDir(dir),
                    Err(e) => Slot::Unlistable(dir, e.to_string()),
                });
            }
            rows.push(row);
        }

        Self { isolates, rows }
    }

    /// Isolates covered by this index, in processing order.
    pub fn isolates(&self) -> &[Isolate] {
        &self.isolates
    }

    /// Slot for gene `gene` and the isolate at position `isolate` in [`Self::isolates`].
    pub fn get(&self, gene: GeneId, isolate: usize) -> &Slot {
        &self.rows.get(gene)[isolate]
    }

    /// Resolved file for a pair, if any.
    pub fn path(&self, gene: GeneId, isolate: usize) -> Option<&Path> {
        self.get(gene, isolate).found().map(|m| m.path.as_path())
    }

    /// Every pair without a resolved file.
    pub fn gaps(&self) -> impl Iterator<Item = (GeneId, &Isolate, &Slot)> {
        self.pairs().filter(|(_, _, slot)| slot.found().is_none())
    }

    /// Every pair that matched more than one file.
    pub fn ambiguities(&self) -> impl Iterator<Item = (GeneId, &Isolate, &Match)> {
        self.pairs().filter_map(|(gene, isolate, slot)| match slot {
            Slot::Found(m) if m.is_ambiguous() => Some((gene, isolate, m)),
            _ => None,
        })
    }

    /// Log a warning for every gap and ambiguity in the index.
    pub fn warn_problems(&self, genes: &CoreGenes) {
        for (gene, isolate, slot) in self.gaps() {
            let gene = genes.name(gene);
            match slot {
                Slot::Missing => log::warn!(
                    "Core gene '{gene}' (expected: Extracted_{gene}_*_{isolate}.fa) not found for isolate '{isolate}'"
                ),
                Slot::MissingDir(dir) => log::warn!(
                    "Core gene '{gene}' for isolate '{isolate}': directory {dir:?} does not exist"
                ),
                Slot::Unlistable(dir, e) => log::warn!(
                    "Core gene '{gene}' for isolate '{isolate}': unable to list {dir:?}: {e}"
                ),
                Slot::Found(_) => {}
            }
        }
        for (gene, isolate, m) in self.ambiguities() {
            log::warn!(
                "Core gene '{}' for isolate '{isolate}' matched {} files; using {:?}",
                genes.name(gene),
                m.also_matched.len() + 1,
                m.path,
            );
        }
    }

    fn pairs(&self) -> impl Iterator<Item = (GeneId, &Isolate, &Slot)> {
        self.rows.iter_ids().flat_map(move |(gene, row)| {
            self.isolates
                .iter()
                .zip(row.iter())
                .map(move |(isolate, slot)| (gene, isolate, slot))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_build_by_gene_dir() -> Result<()> {
        let dir = tempdir()?;
        let genes = CoreGenes::new(["g1", "g2", "g3"])?;
        fs::create_dir(dir.path().join("g1"))?;
        fs::create_dir(dir.path().join("g2"))?;
        fs::write(dir.path().join("g1/Extracted_g1_x_X.fa"), ">X\nAC\n")?;
        fs::write(dir.path().join("g1/Extracted_g1_x_Y.fa"), ">Y\nAC\n")?;
        fs::write(dir.path().join("g2/Extracted_g2_x_X.fa"), ">X\nGG\n")?;
        fs::write(dir.path().join("g2/Extracted_g2_y_X.fa"), ">X\nTT\n")?;

        let isolates = vec![Isolate::new("X"), Isolate::new("Y")];
        let root = dir.path().to_path_buf();
        let index = FileIndex::build(&genes, isolates, |gene, _| root.join(gene));

        let g1 = genes.id("g1").expect("g1");
        let g2 = genes.id("g2").expect("g2");
        let g3 = genes.id("g3").expect("g3");

        assert!(index.path(g1, 0).is_some());
        assert!(index.path(g1, 1).is_some());
        assert_eq!(index.get(g2, 1), &Slot::Missing);
        assert!(matches!(index.get(g3, 0), Slot::MissingDir(_)));

        let gaps: Vec<(GeneId, &str)> = index
            .gaps()
            .map(|(g, i, _)| (g, i.as_str()))
            .collect();
        assert_eq!(gaps, vec![(g2, "Y"), (g3, "X"), (g3, "Y")]);

        let ambiguous: Vec<(GeneId, &str)> = index
            .ambiguities()
            .map(|(g, i, _)| (g, i.as_str()))
            .collect();
        assert_eq!(ambiguous, vec![(g2, "X")]);
        assert_eq!(
            index.path(g2, 0),
            Some(dir.path().join("g2/Extracted_g2_x_X.fa").as_path())
        );
        Ok(())
    }

    #[test]
    fn test_build_by_isolate_dir() -> Result<()> {
        let dir = tempdir()?;
        let genes = CoreGenes::new(["g1", "g2"])?;
        fs::create_dir(dir.path().join("A"))?;
        fs::write(dir.path().join("A/Extracted_g2_x_A.fa"), ">A\nAC\n")?;

        let root = dir.path().to_path_buf();
        let index = FileIndex::build(&genes, vec![Isolate::new("A")], |_, isolate| {
            root.join(isolate.as_str())
        });
        assert_eq!(index.get(GeneId::from(0), 0), &Slot::Missing);
        assert!(index.path(GeneId::from(1), 0).is_some());
        Ok(())
    }
}
