//! Session-scoped identifier registry.
//!
//! For the duration of one mapping pass the registry's maps are
//! authoritative: rows sharing a new external identifier converge on one
//! canonical id without re-querying storage.

use std::collections::HashMap;

use cbh_model::{CanonicalId, CrossReference, IdKind, Identifiers};

use crate::error::RegistryError;

/// First counter value when storage holds no identifier of a kind.
pub const FALLBACK_COUNTER: u64 = 1_000_000;

#[derive(Debug, Clone)]
struct KindState {
    existing: HashMap<String, CanonicalId>,
    /// `None` once `u64::MAX` has been issued.
    next_counter: Option<u64>,
}

impl Default for KindState {
    fn default() -> Self {
        Self {
            existing: HashMap::new(),
            next_counter: Some(FALLBACK_COUNTER),
        }
    }
}

impl KindState {
    fn mint(&mut self, kind: IdKind) -> Result<CanonicalId, RegistryError> {
        let counter = self
            .next_counter
            .ok_or(RegistryError::Exhausted { kind })?;
        self.next_counter = counter.checked_add(1);
        Ok(CanonicalId::mint(kind, counter))
    }
}

/// External-to-canonical maps and per-kind counters.
#[derive(Debug, Clone)]
pub struct IdentifierRegistry {
    kinds: Identifiers<KindState>,
    pending: Vec<CrossReference>,
}

impl Default for IdentifierRegistry {
    fn default() -> Self {
        Self {
            kinds: Identifiers {
                donor: KindState::default(),
                master: KindState::default(),
                sample: KindState::default(),
            },
            pending: Vec::new(),
        }
    }
}

impl IdentifierRegistry {
    /// Empty registry with every counter at [`FALLBACK_COUNTER`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot of storage for `kind`.
    ///
    /// The counter becomes one past the highest suffix found in either the
    /// record table (`max_record`) or the cross-reference table, or
    /// [`FALLBACK_COUNTER`] when both are empty. A stored `u64::MAX` leaves
    /// the kind exhausted.
    pub fn seed(
        &mut self,
        kind: IdKind,
        references: Vec<CrossReference>,
        max_record: Option<&CanonicalId>,
    ) {
        let highest = references
            .iter()
            .map(|reference| &reference.canonical_id)
            .chain(max_record)
            .filter(|id| id.kind() == kind)
            .filter_map(CanonicalId::counter)
            .max();

        let state = self.kinds.get_mut(kind);
        state.next_counter = highest.map_or(Some(FALLBACK_COUNTER), |max| max.checked_add(1));
        state.existing = references
            .into_iter()
            .filter(|reference| reference.kind == kind)
            .map(|reference| (reference.external_id, reference.canonical_id))
            .collect();
        tracing::debug!(
            %kind,
            known = state.existing.len(),
            next = ?state.next_counter,
            "seeded identifier registry"
        );
    }

    /// Resolves an external identifier to a canonical one.
    ///
    /// External ids are compared after trimming surrounding whitespace, so
    /// `"D-1 "` and `"D-1"` name the same donor and a whitespace-only cell
    /// counts as absent.
    ///
    /// - `None` (or blank): a fresh id is minted and nothing is recorded.
    /// - Known: the stored id is returned; nothing changes.
    /// - Unknown: a fresh id is minted, remembered, and queued as a pending
    ///   cross-reference.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Exhausted`] when a fresh id is needed and the kind's
    /// counter has run out. Known ids still resolve.
    pub fn resolve(
        &mut self,
        kind: IdKind,
        external_id: Option<&str>,
    ) -> Result<CanonicalId, RegistryError> {
        let external_id = external_id.map(str::trim).filter(|id| !id.is_empty());
        let state = self.kinds.get_mut(kind);
        let Some(external_id) = external_id else {
            return state.mint(kind);
        };
        if let Some(existing) = state.existing.get(external_id) {
            return Ok(existing.clone());
        }

        let canonical_id = state.mint(kind)?;
        state
            .existing
            .insert(external_id.to_string(), canonical_id.clone());
        self.pending.push(CrossReference {
            kind,
            external_id: external_id.to_string(),
            canonical_id: canonical_id.clone(),
        });
        Ok(canonical_id)
    }

    pub fn lookup(&self, kind: IdKind, external_id: &str) -> Option<&CanonicalId> {
        self.kinds.get(kind).existing.get(external_id.trim())
    }

    /// Counter value the next minted id of `kind` will carry; `None` when
    /// the kind is exhausted.
    pub fn next_counter(&self, kind: IdKind) -> Option<u64> {
        self.kinds.get(kind).next_counter
    }

    /// Number of known external ids of `kind`.
    pub fn known(&self, kind: IdKind) -> usize {
        self.kinds.get(kind).existing.len()
    }

    /// Cross-references minted since the last [`Self::take_pending`].
    pub fn pending(&self) -> &[CrossReference] {
        &self.pending
    }

    pub fn take_pending(&mut self) -> Vec<CrossReference> {
        std::mem::take(&mut self.pending)
    }
}
