use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::{
    analysis::{RelationshipCatalog, RelationshipInstance},
    registry::SpecRegistry,
};

/// Why a pair of elements was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateReason {
    /// The same `(source, destination, predicate)` is declared more than once.
    IdenticalTriple,
    /// Distinct predicates that restate one another link the same pair.
    OverlappingPredicates,
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IdenticalTriple => "identical-triple",
            Self::OverlappingPredicates => "overlapping-predicates",
        })
    }
}

/// A pair of elements linked by redundant relationships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCandidate {
    /// Source element id.
    pub source: String,
    /// Destination element id.
    pub destination: String,
    /// The redundant predicates, sorted.
    pub predicates: Vec<String>,
    /// Why the pair was flagged.
    pub reason: DuplicateReason,
}

/// Finds element pairs linked more than once in ways that say the same thing.
#[derive(Debug)]
pub struct DuplicateDetector<'c> {
    registry: &'c SpecRegistry,
    similarity: f64,
}

impl<'c> DuplicateDetector<'c> {
    /// Creates a detector flagging distinct predicates whose overlap score
    /// reaches `similarity`.
    #[must_use]
    pub const fn new(registry: &'c SpecRegistry, similarity: f64) -> Self {
        Self {
            registry,
            similarity,
        }
    }

    /// Candidates across the whole catalog, sorted by source, destination
    /// and reason.
    #[must_use]
    pub fn detect(&self, catalog: &RelationshipCatalog<'_>) -> Vec<DuplicateCandidate> {
        self.detect_where(catalog, |_| true)
    }

    /// Candidates for pairs with at least one end in `layer`.
    #[must_use]
    pub fn detect_in_layer(
        &self,
        catalog: &RelationshipCatalog<'_>,
        layer: &str,
    ) -> Vec<DuplicateCandidate> {
        self.detect_where(catalog, |instance| instance.touches_layer(layer))
    }

    fn detect_where<'a>(
        &self,
        catalog: &RelationshipCatalog<'a>,
        include: impl Fn(&RelationshipInstance<'a>) -> bool,
    ) -> Vec<DuplicateCandidate> {
        // (source, destination) -> predicate -> occurrences
        let mut pairs: BTreeMap<(&str, &str), BTreeMap<&str, usize>> = BTreeMap::new();
        for instance in catalog.all().filter(|i| include(i)) {
            *pairs
                .entry((instance.source_id, instance.destination_id))
                .or_default()
                .entry(instance.predicate)
                .or_default() += 1;
        }

        let mut candidates = Vec::new();
        for ((source, destination), predicates) in pairs {
            let candidate = |predicates: Vec<&str>, reason| DuplicateCandidate {
                source: source.to_string(),
                destination: destination.to_string(),
                predicates: predicates.into_iter().map(str::to_string).collect(),
                reason,
            };

            let repeated: Vec<&str> = predicates
                .iter()
                .filter(|&(_, &count)| count > 1)
                .map(|(&predicate, _)| predicate)
                .collect();
            if !repeated.is_empty() {
                candidates.push(candidate(repeated, DuplicateReason::IdenticalTriple));
            }

            let overlapping = self.overlapping(predicates.keys().copied().collect());
            if !overlapping.is_empty() {
                candidates.push(candidate(overlapping, DuplicateReason::OverlappingPredicates));
            }
        }

        tracing::debug!(candidates = candidates.len(), "Duplicate detection complete");
        candidates
    }

    /// The sorted predicates taking part in at least one overlapping pair.
    fn overlapping<'p>(&self, predicates: Vec<&'p str>) -> Vec<&'p str> {
        let mut flagged = vec![false; predicates.len()];
        for (i, a) in predicates.iter().enumerate() {
            for (j, b) in predicates.iter().enumerate().skip(i + 1) {
                if self.registry.predicate_overlap(a, b) >= self.similarity {
                    flagged[i] = true;
                    flagged[j] = true;
                }
            }
        }

        predicates
            .into_iter()
            .zip(flagged)
            .filter_map(|(predicate, flagged)| flagged.then_some(predicate))
            .collect()
    }
}
