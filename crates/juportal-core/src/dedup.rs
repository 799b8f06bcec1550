//! ECLI alias deduplication.
//!
//! Records are nodes of an undirected [`AliasGraph`]. Two records are joined
//! when they carry the same ECLI, when one declares the other's ECLI as an
//! alias or version, or when both reference each other in the same
//! related-publication list. Connected components are resolved with a
//! union-find over record indices, so cycles need no special handling.
//!
//! Each component keeps one canonical record, chosen by a total order:
//!
//! 1. non-German `metaLanguage` first
//! 2. more populated fields
//! 3. later `decisionDate` (`YYYY-MM-DD` > `YYYY` > empty at equal year)
//! 4. smaller `fileName`
//!
//! A tie on all four falls back to comparing the serialized records and is
//! reported as [`SelectionReason::Indistinguishable`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ecli;
use crate::mapping::TargetField;
use crate::record::{RelatedPublications, TransformedRecord};

/// Why two records were considered the same decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AliasLink {
    SharedEcli,
    DeclaredAlias,
    MutualReference,
}

/// The first selection criterion that separated the canonical record from
/// the best of the removed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionReason {
    Language,
    PopulatedFields,
    DecisionDate,
    FileName,
    Indistinguishable,
}

/// Outcome for one connected component with more than one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupDecision {
    pub canonical_ecli: String,
    pub canonical_file: String,
    pub removed_eclis: BTreeSet<String>,
    pub removed_files: Vec<String>,
    pub reason: SelectionReason,
    pub links: BTreeSet<AliasLink>,
}

#[derive(Debug, Default)]
pub struct DedupOutcome {
    /// Surviving records, ordered by `fileName`.
    pub survivors: Vec<TransformedRecord>,
    /// One entry per merged component, ordered by canonical ECLI then file.
    pub log: Vec<DedupDecision>,
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            Ordering::Less => self.parent[ra] = rb,
            Ordering::Greater => self.parent[rb] = ra,
            Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Undirected alias edges over record indices.
#[derive(Debug, Default)]
pub struct AliasGraph {
    edges: Vec<(usize, usize, AliasLink)>,
}

fn reference_keys(refs: &[String]) -> HashSet<String> {
    refs.iter().filter_map(|r| ecli::parse(r).key()).collect()
}

impl AliasGraph {
    pub fn build(records: &[TransformedRecord]) -> Self {
        let keys: Vec<Option<String>> = records.iter().map(|r| ecli::parse(&r.ecli).key()).collect();

        let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, key) in keys.iter().enumerate() {
            if let Some(key) = key {
                by_key.entry(key.as_str()).or_default().push(i);
            }
        }

        let mut edges = Vec::new();

        for members in by_key.values() {
            for pair in members.windows(2) {
                edges.push((pair[0], pair[1], AliasLink::SharedEcli));
            }
        }

        for (i, record) in records.iter().enumerate() {
            let declared = reference_keys(&record.ecli_alias)
                .into_iter()
                .chain(reference_keys(&record.versions));
            for key in declared {
                for &j in by_key.get(key.as_str()).into_iter().flatten() {
                    if j != i {
                        edges.push((i, j, AliasLink::DeclaredAlias));
                    }
                }
            }
        }

        let reference_fields: Vec<TargetField> = RelatedPublications::FIELDS
            .into_iter()
            .filter(|f| *f != TargetField::Justel)
            .collect();
        let refs: Vec<BTreeMap<TargetField, HashSet<String>>> = records
            .iter()
            .map(|r| {
                reference_fields
                    .iter()
                    .map(|f| (*f, reference_keys(r.related.get(*f))))
                    .filter(|(_, keys)| !keys.is_empty())
                    .collect()
            })
            .collect();

        for (i, fields) in refs.iter().enumerate() {
            let Some(own) = &keys[i] else { continue };
            for (field, targets) in fields {
                for key in targets {
                    for &j in by_key.get(key.as_str()).into_iter().flatten() {
                        // Each mutual pair is seen from both ends; keep one.
                        if j <= i {
                            continue;
                        }
                        if refs[j].get(field).is_some_and(|back| back.contains(own)) {
                            edges.push((i, j, AliasLink::MutualReference));
                        }
                    }
                }
            }
        }

        debug!(records = records.len(), edges = edges.len(), "built alias graph");
        Self { edges }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn is_german(record: &TransformedRecord) -> bool {
    record.meta_language.eq_ignore_ascii_case("DE")
}

/// `Less` means `a` is preferred over `b`.
fn compare(a: &TransformedRecord, b: &TransformedRecord) -> (Ordering, SelectionReason) {
    let steps = [
        (is_german(a).cmp(&is_german(b)), SelectionReason::Language),
        (
            b.populated_field_count().cmp(&a.populated_field_count()),
            SelectionReason::PopulatedFields,
        ),
        (b.decision_date.cmp(&a.decision_date), SelectionReason::DecisionDate),
        (a.file_name.cmp(&b.file_name), SelectionReason::FileName),
    ];
    for (ord, reason) in steps {
        if ord != Ordering::Equal {
            return (ord, reason);
        }
    }
    let sa = serde_json::to_string(a).unwrap_or_default();
    let sb = serde_json::to_string(b).unwrap_or_default();
    (sa.cmp(&sb), SelectionReason::Indistinguishable)
}

/// Collapse alias-linked records to one canonical survivor per component.
pub fn deduplicate(records: Vec<TransformedRecord>) -> DedupOutcome {
    let graph = AliasGraph::build(&records);
    let mut uf = UnionFind::new(records.len());
    for &(a, b, _) in &graph.edges {
        uf.union(a, b);
    }

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..records.len() {
        let root = uf.find(i);
        components.entry(root).or_default().push(i);
    }
    let mut links: HashMap<usize, BTreeSet<AliasLink>> = HashMap::new();
    for &(a, _, link) in &graph.edges {
        let root = uf.find(a);
        links.entry(root).or_default().insert(link);
    }

    let mut keep = vec![false; records.len()];
    let mut log = Vec::new();

    for (root, mut members) in components {
        members.sort_by(|&a, &b| compare(&records[a], &records[b]).0);
        let canonical = members[0];
        keep[canonical] = true;
        if members.len() == 1 {
            continue;
        }

        let runner_up = members[1];
        let reason = compare(&records[canonical], &records[runner_up]).1;
        let removed = &members[1..];
        let mut removed_files: Vec<String> = removed.iter().map(|&i| records[i].file_name.clone()).collect();
        removed_files.sort();

        log.push(DedupDecision {
            canonical_ecli: records[canonical].ecli.clone(),
            canonical_file: records[canonical].file_name.clone(),
            removed_eclis: removed.iter().map(|&i| records[i].ecli.clone()).collect(),
            removed_files,
            reason,
            links: links.remove(&root).unwrap_or_default(),
        });
    }

    log.sort_by(|a, b| {
        a.canonical_ecli
            .cmp(&b.canonical_ecli)
            .then_with(|| a.canonical_file.cmp(&b.canonical_file))
    });

    let mut survivors: Vec<TransformedRecord> = records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, kept)| kept.then_some(record))
        .collect();
    survivors.sort_by(compare_for_output);

    debug!(survivors = survivors.len(), merged = log.len(), "deduplication done");
    DedupOutcome { survivors, log }
}

fn compare_for_output(a: &TransformedRecord, b: &TransformedRecord) -> Ordering {
    a.file_name
        .cmp(&b.file_name)
        .then_with(|| compare(a, b).0)
}
