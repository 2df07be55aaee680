//! Column normalization: allow-listing, header folding and synonym renaming.
//!
//! Headers are folded (surrounding whitespace trimmed, lower-cased) before
//! anything else, so two sheets whose headers differ only in case or padding
//! come out with identical schemas. Canonical names always resolve to
//! themselves, which keeps [`normalize`] idempotent.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;

/// A parsed sheet: one header row and string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

pub fn fold_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Raw (folded) header name to canonical field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymTable {
    entries: BTreeMap<String, String>,
    canonical: HashSet<String>,
}

impl SynonymTable {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries = BTreeMap::new();
        for (raw, canonical) in pairs {
            entries.insert(fold_header(raw.as_ref()), fold_header(canonical.as_ref()));
        }
        let canonical = entries.values().cloned().collect();
        Self { entries, canonical }
    }

    pub fn is_canonical(&self, folded: &str) -> bool {
        self.canonical.contains(folded)
    }

    /// Resolves a folded header. Canonical names map to themselves even when a
    /// synonym entry with the same spelling points elsewhere.
    pub fn resolve<'a>(&'a self, folded: &'a str) -> &'a str {
        if self.is_canonical(folded) {
            return folded;
        }
        self.entries.get(folded).map(String::as_str).unwrap_or(folded)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// How to resolve several source columns normalizing to the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    FirstWins,
    #[default]
    LastWins,
    /// Folded source headers in priority order; unlisted sources rank last,
    /// leftmost first.
    Prefer(Vec<String>),
    Reject,
}

impl CollisionPolicy {
    fn pick_winner(
        &self,
        canonical: &str,
        sources: &[(usize, String)],
    ) -> Result<usize, NormalizeError> {
        if sources.len() == 1 {
            return Ok(sources[0].0);
        }
        match self {
            CollisionPolicy::FirstWins => Ok(sources[0].0),
            CollisionPolicy::LastWins => Ok(sources[sources.len() - 1].0),
            CollisionPolicy::Prefer(order) => {
                let rank = |folded: &str| {
                    order
                        .iter()
                        .position(|preferred| fold_header(preferred) == folded)
                        .unwrap_or(usize::MAX)
                };
                let winner = sources
                    .iter()
                    .min_by_key(|(idx, folded)| (rank(folded), *idx))
                    .map(|(idx, _)| *idx)
                    .unwrap_or(sources[0].0);
                Ok(winner)
            }
            CollisionPolicy::Reject => Err(NormalizeError::Collision {
                canonical: canonical.to_string(),
                sources: sources.iter().map(|(_, folded)| folded.clone()).collect(),
            }),
        }
    }
}

/// Keeps allow-listed columns, folds their headers and renames them to
/// canonical names. Columns that are not admissible are dropped silently;
/// a winning column keeps its original position.
pub fn normalize(
    table: &Table,
    allowed: &[String],
    synonyms: &SynonymTable,
    policy: &CollisionPolicy,
) -> Result<Table, NormalizeError> {
    let allowed: HashSet<String> = allowed.iter().map(|name| fold_header(name)).collect();

    let mut targets: BTreeMap<String, Vec<(usize, String)>> = BTreeMap::new();
    for (idx, header) in table.headers.iter().enumerate() {
        let folded = fold_header(header);
        if !allowed.contains(&folded) && !synonyms.is_canonical(&folded) {
            continue;
        }
        let canonical = synonyms.resolve(&folded).to_string();
        targets.entry(canonical).or_default().push((idx, folded));
    }

    let mut kept = Vec::with_capacity(targets.len());
    for (canonical, sources) in &targets {
        let winner = policy.pick_winner(canonical, sources)?;
        kept.push((winner, canonical.clone()));
    }
    kept.sort_by_key(|(idx, _)| *idx);

    let mut rows = Vec::with_capacity(table.rows.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        if row.len() != table.headers.len() {
            return Err(NormalizeError::RaggedRow {
                row: row_idx + 1,
                expected: table.headers.len(),
                found: row.len(),
            });
        }
        rows.push(kept.iter().map(|(idx, _)| row[*idx].clone()).collect());
    }

    Ok(Table {
        headers: kept.into_iter().map(|(_, name)| name).collect(),
        rows,
    })
}
