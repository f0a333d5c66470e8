use util::{HashMap, Hasher, IdVec};

use crate::{Error, GeneId};

/// Canonical order of the aflatoxin biosynthesis cluster core genes.
pub const AFLATOXIN_CLUSTER: [&str; 16] = [
    "adhA", "aflJ", "avfA", "avnA", "cypX", "estA", "moxY", "norA", "omtA", "omtB", "ordA",
    "ordB", "vbs", "ver-1", "verA", "verB",
];

/// The canonical concatenation order of core genes for one run.
///
/// Built once from configuration and passed by reference into every stage,
/// so all stages agree on both the gene set and its order.
/// A `CoreGenes` is never empty; the first gene is the reference gene used
/// to discover isolates.
#[derive(Debug, Clone)]
pub struct CoreGenes {
    names: IdVec<GeneId, String>,
    lookup: HashMap<String, GeneId>,
}

impl CoreGenes {
    /// Validate `names` and build the canonical order.
    pub fn new<I, S>(names: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let iter = names.into_iter();
        let (lower, _) = iter.size_hint();
        let mut genes = Self {
            names: IdVec::with_capacity(lower),
            lookup: HashMap::with_capacity_and_hasher(lower, Hasher::default()),
        };

        for name in iter {
            let name = name.into();
            if !is_valid_gene_name(&name) {
                return Err(Error::InvalidGeneName(name));
            }
            if genes.lookup.contains_key(&name) {
                return Err(Error::DuplicateGene(name));
            }
            if genes.names.len() > u16::MAX as usize {
                return Err(Error::TooManyGenes(genes.names.len() + 1));
            }
            let id = genes.names.push(name.clone());
            genes.lookup.insert(name, id);
        }

        if genes.names.is_empty() {
            return Err(Error::EmptyGeneOrder);
        }
        Ok(genes)
    }

    /// The built-in aflatoxin cluster order.
    pub fn aflatoxin_cluster() -> Self {
        Self::new(AFLATOXIN_CLUSTER).expect("built-in gene order is valid")
    }

    /// Number of genes.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: construction rejects an empty order.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The first gene in canonical order.
    pub fn reference(&self) -> &str {
        self.name(GeneId::default())
    }

    /// Name of the gene with the given id.
    #[inline]
    pub fn name(&self, id: GeneId) -> &str {
        self.names.get(id)
    }

    /// Look up a gene's position by name.
    pub fn id(&self, name: &str) -> Option<GeneId> {
        self.lookup.get(name).copied()
    }

    /// Iterate through genes in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (GeneId, &str)> {
        self.names.iter_ids().map(|(id, name)| (id, name.as_str()))
    }

    /// Gene names in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

// gene names end up in directory names and filename prefixes:
fn is_valid_gene_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '\\' || c == ',')
}
