//! Persisted concept mappings: learned aliases plus the pending queue.
//!
//! Two small JSON documents back the store: a mappings file (canonical
//! concept to alias set) and a pending file (mid-confidence candidates
//! awaiting promotion). Both are read on open and rewritten whole on every
//! change via a sibling temp file and atomic rename, so a crashed writer
//! never leaves a torn document. An in-memory mode exists for callers that
//! do not want persistence.

use crate::standardize::StandardConcept;
use quarry_core::{QuarryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A mid-confidence mapping candidate awaiting promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMapping {
    /// Filer concept local name
    pub alias: String,
    /// The canonical concept it would map to
    pub standard: StandardConcept,
    /// Similarity score at the time of queueing
    pub confidence: f64,
    /// The label that produced the candidate
    pub source_label: String,
}

#[derive(Debug)]
struct StorePaths {
    mappings: PathBuf,
    pending: PathBuf,
}

/// The bidirectional concept-mapping store.
///
/// Lookups go through a reverse index rebuilt whenever the alias table
/// changes. Writers serialize through `&mut self`; cross-process locking is
/// the host's concern.
#[derive(Debug)]
pub struct ConceptMappingStore {
    mappings: BTreeMap<StandardConcept, BTreeSet<String>>,
    reverse: HashMap<String, StandardConcept>,
    pending: Vec<PendingMapping>,
    paths: Option<StorePaths>,
}

impl ConceptMappingStore {
    /// Creates a non-persisted store seeded with the default aliases.
    pub fn in_memory() -> Self {
        let mappings = seed_mappings();
        let reverse = build_reverse(&mappings);
        Self {
            mappings,
            reverse,
            pending: Vec::new(),
            paths: None,
        }
    }

    /// Opens a file-backed store in `dir`, creating and seeding the
    /// documents when absent.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let paths = StorePaths {
            mappings: dir.join("concept_mappings.json"),
            pending: dir.join("pending_mappings.json"),
        };

        let mappings = if paths.mappings.exists() {
            let raw = fs::read_to_string(&paths.mappings)?;
            serde_json::from_str(&raw)?
        } else {
            seed_mappings()
        };
        let pending = if paths.pending.exists() {
            let raw = fs::read_to_string(&paths.pending)?;
            serde_json::from_str(&raw)?
        } else {
            Vec::new()
        };

        let reverse = build_reverse(&mappings);
        let store = Self {
            mappings,
            reverse,
            pending,
            paths: Some(paths),
        };
        store.save()?;
        Ok(store)
    }

    /// Looks up the canonical concept for a filer alias.
    pub fn lookup(&self, alias: &str) -> Option<StandardConcept> {
        self.reverse.get(alias).copied()
    }

    /// All aliases learned for a canonical concept.
    pub fn aliases(&self, standard: StandardConcept) -> Option<&BTreeSet<String>> {
        self.mappings.get(&standard)
    }

    /// The pending queue, oldest first.
    pub fn pending(&self) -> &[PendingMapping] {
        &self.pending
    }

    /// Learns a new alias and persists.
    pub fn add_alias(&mut self, standard: StandardConcept, alias: &str) -> Result<()> {
        if let Some(existing) = self.reverse.get(alias) {
            if *existing != standard {
                return Err(QuarryError::Store(format!(
                    "alias {} already maps to {}",
                    alias, existing
                )));
            }
            return Ok(());
        }
        self.mappings
            .entry(standard)
            .or_default()
            .insert(alias.to_string());
        self.reverse.insert(alias.to_string(), standard);
        debug!(alias, %standard, "learned concept alias");
        self.save()
    }

    /// Queues a mid-confidence candidate and persists. Duplicate aliases
    /// keep the higher-confidence entry.
    pub fn queue_pending(&mut self, candidate: PendingMapping) -> Result<()> {
        match self
            .pending
            .iter_mut()
            .find(|p| p.alias == candidate.alias && p.standard == candidate.standard)
        {
            Some(existing) => {
                if candidate.confidence > existing.confidence {
                    *existing = candidate;
                }
            }
            None => self.pending.push(candidate),
        }
        self.save()
    }

    /// Promotes a pending candidate into the mappings table and persists
    /// both documents. Returns the canonical concept it now maps to, or
    /// `None` when the alias is not pending.
    pub fn promote(&mut self, alias: &str) -> Result<Option<StandardConcept>> {
        let Some(pos) = self.pending.iter().position(|p| p.alias == alias) else {
            return Ok(None);
        };
        let candidate = self.pending.remove(pos);
        self.mappings
            .entry(candidate.standard)
            .or_default()
            .insert(candidate.alias.clone());
        self.reverse
            .insert(candidate.alias.clone(), candidate.standard);
        debug!(alias, standard = %candidate.standard, "promoted pending mapping");
        self.save()?;
        Ok(Some(candidate.standard))
    }

    /// Writes both documents when file-backed; a no-op in memory.
    fn save(&self) -> Result<()> {
        let Some(paths) = &self.paths else {
            return Ok(());
        };
        write_atomic(&paths.mappings, &serde_json::to_vec_pretty(&self.mappings)?)?;
        write_atomic(&paths.pending, &serde_json::to_vec_pretty(&self.pending)?)?;
        Ok(())
    }
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn seed_mappings() -> BTreeMap<StandardConcept, BTreeSet<String>> {
    let mut mappings = BTreeMap::new();
    for standard in StandardConcept::ALL {
        let aliases: BTreeSet<String> = standard
            .default_aliases()
            .iter()
            .map(|s| s.to_string())
            .collect();
        mappings.insert(standard, aliases);
    }
    mappings
}

fn build_reverse(
    mappings: &BTreeMap<StandardConcept, BTreeSet<String>>,
) -> HashMap<String, StandardConcept> {
    let mut reverse = HashMap::new();
    for (standard, aliases) in mappings {
        for alias in aliases {
            reverse.insert(alias.clone(), *standard);
        }
    }
    reverse
}
