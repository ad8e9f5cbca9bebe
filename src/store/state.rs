use crate::error::ErrorType;
use crate::model::Transaction;
use serde::Serialize;

/// Where the store is in its lifecycle. Derived from `StoreState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nobody owns the cache: no data and nothing loading.
    Unauthenticated,
    Loading,
    Ready,
    /// The last fetch failed. The transactions are the last known-good list.
    Error,
}

/// A snapshot of everything the store exposes to observers. Each transition replaces the whole
/// snapshot, so an observer never sees a half-applied change.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreState {
    pub(super) transactions: Vec<Transaction>,
    pub(super) loading: bool,
    /// A message suitable for a persistent banner.
    pub(super) error: Option<String>,
    pub(super) error_type: Option<ErrorType>,
    /// The id of the transaction currently being removed optimistically.
    pub(super) is_deleting: Option<String>,
    /// The user whose transactions are cached.
    pub(super) owner: Option<String>,
    /// Whether a fetch for `owner` has succeeded since the cache was last cleared. Until then the
    /// list only holds what this process added, not the user's full set.
    pub(super) loaded: bool,
    /// Sequence number of the last fetch whose response was applied.
    #[serde(skip)]
    pub(super) applied_fetch: u64,
}

impl StoreState {
    /// An empty state owned by `user_id`.
    pub(super) fn owned_by(user_id: &str) -> Self {
        Self {
            owner: Some(user_id.to_string()),
            ..Self::default()
        }
    }

    /// Clears the cache if it belongs to someone other than `user_id`. The invariant is that every
    /// cached transaction belongs to `owner`.
    pub(super) fn claim(&mut self, user_id: &str) {
        if self.owner.as_deref() != Some(user_id) {
            *self = Self::owned_by(user_id);
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_type(&self) -> Option<ErrorType> {
        self.error_type
    }

    pub fn is_deleting(&self) -> Option<&str> {
        self.is_deleting.as_deref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// True when a fetch would add nothing: the owner's list has been loaded, is non-empty, and no
    /// fetch is in flight.
    pub(super) fn is_cached(&self) -> bool {
        self.loaded && !self.transactions.is_empty() && !self.loading
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.owner.is_none() {
            Phase::Unauthenticated
        } else if self.error.is_some() {
            Phase::Error
        } else {
            Phase::Ready
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionType;
    use crate::test::txn;

    #[test]
    fn test_phase() {
        let mut state = StoreState::default();
        assert_eq!(state.phase(), Phase::Unauthenticated);
        assert!(!state.loading());

        state.claim("u1");
        assert_eq!(state.phase(), Phase::Ready);
        assert!(!state.loaded());

        state.loading = true;
        assert_eq!(state.phase(), Phase::Loading);

        state.loading = false;
        state.error = Some("boom".into());
        assert_eq!(state.phase(), Phase::Error);
    }

    #[test]
    fn test_claim_clears_other_owner() {
        let mut state = StoreState::owned_by("u1");
        state.error = Some("x".into());
        state.claim("u1");
        assert_eq!(state.error(), Some("x"));
        state.claim("u2");
        assert_eq!(state.owner(), Some("u2"));
        assert!(state.error().is_none());
    }

    #[test]
    fn test_is_cached_requires_a_load() {
        let mut state = StoreState::owned_by("u1");
        state.transactions.push(txn("1", 1.0, TransactionType::Expense));
        assert!(!state.is_cached());

        state.loaded = true;
        assert!(state.is_cached());

        state.loading = true;
        assert!(!state.is_cached());

        state.loading = false;
        state.transactions.clear();
        assert!(!state.is_cached());
    }
}
