//! Child ledger: the parent's durable record of which children it owns.
//!
//! # Invariants
//!
//! - **Unique**: at most one entry per [`Reference`]. Both [`ChildLedger::upsert`]
//!   and deserialization enforce this.
//! - **Stable order**: entries keep insertion order for display; correctness
//!   never depends on it.
//! - **Lossless layout**: an entry persists as
//!   `{"objectReference": {...}, "observedGeneration": n}` and the ledger as a
//!   plain JSON array.

use serde::{Deserialize, Serialize};

use crate::Reference;

/// One owned child and the parent generation at which it was last asserted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(rename = "objectReference")]
    pub reference: Reference,
    pub observed_generation: i64,
}

impl LedgerEntry {
    pub fn new(reference: Reference, observed_generation: i64) -> Self {
        Self {
            reference,
            observed_generation,
        }
    }
}

/// What [`ChildLedger::upsert`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated { previous_generation: i64 },
}

/// Ordered, duplicate-free list of [`LedgerEntry`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LedgerEntry>", into = "Vec<LedgerEntry>")]
pub struct ChildLedger {
    entries: Vec<LedgerEntry>,
}

impl ChildLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LedgerEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, reference: &Reference) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| &e.reference == reference)
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        self.get(reference).is_some()
    }

    /// Stamp `reference` with `observed_generation`, appending it if absent.
    pub fn upsert(&mut self, reference: Reference, observed_generation: i64) -> Upsert {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.reference == reference) {
            let previous_generation = entry.observed_generation;
            entry.observed_generation = observed_generation;
            return Upsert::Updated {
                previous_generation,
            };
        }
        self.entries
            .push(LedgerEntry::new(reference, observed_generation));
        Upsert::Inserted
    }

    /// Highest `observed_generation`, or `None` for an empty ledger.
    pub fn max_observed_generation(&self) -> Option<i64> {
        self.entries.iter().map(|e| e.observed_generation).max()
    }

    pub(crate) fn take_entries(&mut self) -> Vec<LedgerEntry> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn replace_entries(&mut self, entries: Vec<LedgerEntry>) {
        self.entries = entries;
    }
}

/// Collapses duplicate references: the first position is kept, the last
/// generation wins.
impl From<Vec<LedgerEntry>> for ChildLedger {
    fn from(entries: Vec<LedgerEntry>) -> Self {
        let mut ledger = ChildLedger::new();
        for entry in entries {
            ledger.upsert(entry.reference, entry.observed_generation);
        }
        ledger
    }
}

impl From<ChildLedger> for Vec<LedgerEntry> {
    fn from(ledger: ChildLedger) -> Self {
        ledger.entries
    }
}

impl FromIterator<LedgerEntry> for ChildLedger {
    fn from_iter<I: IntoIterator<Item = LedgerEntry>>(iter: I) -> Self {
        ChildLedger::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a ChildLedger {
    type Item = &'a LedgerEntry;
    type IntoIter = std::slice::Iter<'a, LedgerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
