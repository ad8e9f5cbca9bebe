//! The transaction store: the single in-memory copy of the signed-in user's transactions.
//!
//! Every mutation goes through the `TransactionApi`. Adds and updates only touch the cached list
//! once the service has confirmed them, while deletes remove the record immediately and put it
//! back if the service call fails. Observers follow the store through `subscribe`, which yields a
//! new `StoreState` after every transition, and through `notices`, which carries the outcome of
//! each operation.

mod notice;
mod options;
mod state;

use crate::api::TransactionApi;
use crate::error::{Error, ErrorType, IntoResult, Result};
use crate::identity::IdentityProvider;
use crate::model::{Transaction, TransactionInput};
use crate::normalize::{normalize, reject_html, RawResponse};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

pub use notice::{Notice, NoticeLevel};
pub use options::{IdAssignment, RollbackPolicy, StoreOptions};
pub use state::{Phase, StoreState};

const NOTICE_CAPACITY: usize = 64;

pub struct Store {
    api: Arc<dyn TransactionApi>,
    identity: Arc<dyn IdentityProvider>,
    options: StoreOptions,
    state: watch::Sender<StoreState>,
    notices: broadcast::Sender<Notice>,
    /// The sequence number of the most recently started fetch.
    fetch_seq: AtomicU64,
}

/// What a delete needs to undo its optimistic removal.
#[derive(Debug, Default)]
struct Rollback {
    snapshot: Vec<Transaction>,
    removed: Option<(usize, Transaction)>,
}

impl Store {
    /// Creates an empty store. Nothing is fetched until `fetch_transactions` is called.
    pub fn new(
        api: Arc<dyn TransactionApi>,
        identity: Arc<dyn IdentityProvider>,
        options: StoreOptions,
    ) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            api,
            identity,
            options,
            state,
            notices,
            fetch_seq: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// A copy of the current state.
    pub fn state(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// The cached transactions, most recent additions first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.borrow().transactions.clone()
    }

    /// A receiver that sees every state transition.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// A receiver for the notices emitted from now on.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Drops everything, returning the store to the unauthenticated state. A fetch issued
    /// afterwards goes to the network even if the user is the same.
    pub fn reset(&self) {
        debug!("Resetting the transaction store");
        self.state.send_replace(StoreState::default());
    }

    /// Spawns a task that resets the store whenever the signed-in user changes away from the user
    /// who owns the cache. The task ends when the identity provider goes away, or at the first
    /// identity change after the store has been dropped.
    pub fn bind_identity(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        let mut rx = self.identity.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let uid = rx.borrow_and_update().as_ref().map(|u| u.uid().to_string());
                let Some(store) = store.upgrade() else {
                    break;
                };
                let owner = store.state.borrow().owner.clone();
                if owner.is_some() && owner != uid {
                    debug!(
                        "Signed-in user changed from {:?} to {:?}",
                        owner.as_deref(),
                        uid.as_deref()
                    );
                    store.reset();
                }
            }
            trace!("Identity binding ended");
        })
    }

    /// Loads the transactions of `user_id` unless they are already cached.
    ///
    /// With nobody signed in the store is cleared and nothing is fetched. On failure the cached
    /// transactions are kept, the error is recorded in the state, and the error is returned.
    pub async fn fetch_transactions(&self, user_id: &str) -> Result<()> {
        if self.identity.current_user().is_none() {
            debug!("Nobody is signed in, nothing to fetch");
            self.reset();
            return Ok(());
        }
        self.require_user(user_id)?;

        let mut started = None;
        self.state.send_if_modified(|state| {
            state.claim(user_id);
            if state.is_cached() {
                return false;
            }
            state.loading = true;
            state.error = None;
            state.error_type = None;
            started = Some(self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1);
            true
        });
        let Some(seq) = started else {
            trace!("Transactions for {user_id} are cached, not fetching");
            return Ok(());
        };

        trace!("Fetching transactions for {user_id} (fetch {seq})");
        let result = self.api.list(user_id).await.and_then(normalize);

        match result {
            Ok(transactions) => {
                let transactions = keep_owned(user_id, transactions);
                let count = transactions.len();
                let applied = self.apply_for(user_id, |state| {
                    if self.is_stale(seq, state) {
                        return false;
                    }
                    state.applied_fetch = seq;
                    state.loading = self.still_loading(seq);
                    state.loaded = true;
                    state.transactions = transactions;
                    state.error = None;
                    state.error_type = None;
                    true
                });
                if applied {
                    debug!("Loaded {count} transactions for {user_id}");
                }
                Ok(())
            }
            Err(e) => {
                warn!("Unable to fetch transactions for {user_id}: {e}");
                let error_type = e.error_type();
                self.apply_for(user_id, |state| {
                    if self.is_stale(seq, state) {
                        return false;
                    }
                    state.applied_fetch = seq;
                    state.loading = self.still_loading(seq);
                    state.error = Some(error_type.user_message().to_string());
                    state.error_type = Some(error_type);
                    true
                });
                self.notify(Notice::error(error_type.user_message()));
                Err(e)
            }
        }
    }

    /// Creates a transaction. The cached list is only changed once the service has confirmed the
    /// new record, which is then placed at the front.
    pub async fn add_transaction(
        &self,
        input: TransactionInput,
        user_id: &str,
    ) -> Result<Transaction> {
        let result = self.add(input, user_id).await;
        match &result {
            Ok(t) => {
                debug!("Added transaction {}", t.id());
                self.notify(Notice::success("Transaction added!"));
            }
            Err(e) => {
                warn!("Unable to add a transaction: {e}");
                self.notify(Notice::error(format!(
                    "Failed to add the transaction. {}",
                    e.error_type().user_message()
                )));
            }
        }
        result
    }

    /// Replaces the transaction `id` with `input`. Only the matching cached record is changed, and
    /// only after the service has confirmed the update.
    pub async fn update_transaction(
        &self,
        id: &str,
        input: TransactionInput,
        user_id: &str,
    ) -> Result<Transaction> {
        let result = self.update(id, input, user_id).await;
        match &result {
            Ok(_) => {
                debug!("Updated transaction {id}");
                self.notify(Notice::success("Transaction updated!"));
            }
            Err(e) => {
                warn!("Unable to update transaction {id}: {e}");
                self.notify(Notice::error(format!(
                    "Failed to update the transaction. {}",
                    e.error_type().user_message()
                )));
            }
        }
        result
    }

    /// Deletes the transaction `id`. The record disappears from the cached list right away and
    /// comes back if the service call fails; see `RollbackPolicy` for what exactly is restored.
    pub async fn delete_transaction(&self, id: &str, user_id: &str) -> Result<()> {
        let key = format!("delete-{id}");
        if let Err(e) = self.require_user(user_id) {
            self.notify(Notice::error(e.error_type().user_message()).keyed(&key));
            return Err(e);
        }

        let mut rollback = Rollback::default();
        self.state.send_modify(|state| {
            state.claim(user_id);
            rollback.snapshot = state.transactions.clone();
            rollback.removed = state
                .transactions
                .iter()
                .position(|t| t.id() == id)
                .map(|ix| (ix, state.transactions.remove(ix)));
            state.is_deleting = Some(id.to_string());
        });
        self.notify(Notice::pending("Removing...").keyed(&key));

        match self.remove(id, user_id).await {
            Ok(()) => {
                debug!("Deleted transaction {id}");
                self.state
                    .send_if_modified(|state| clear_deleting(state, id));
                self.notify(Notice::success("Transaction removed!").keyed(&key));
                Ok(())
            }
            Err(e) => {
                warn!("Unable to delete transaction {id}, restoring it: {e}");
                self.apply_for(user_id, |state| {
                    match self.options.delete_rollback {
                        RollbackPolicy::Snapshot => state.transactions = rollback.snapshot,
                        RollbackPolicy::PerOperation => {
                            if let Some((ix, t)) = rollback.removed {
                                if state.get(t.id()).is_none() {
                                    let ix = ix.min(state.transactions.len());
                                    state.transactions.insert(ix, t);
                                }
                            }
                        }
                    }
                    clear_deleting(state, id);
                    true
                });
                self.notify(Notice::error("Failed to remove. Restoring...").keyed(&key));
                Err(e)
            }
        }
    }

    async fn add(&self, input: TransactionInput, user_id: &str) -> Result<Transaction> {
        self.require_user(user_id)?;
        input.validate().pub_result(ErrorType::Validation)?;
        let id = match self.options.id_assignment {
            IdAssignment::Client => Uuid::new_v4().to_string(),
            IdAssignment::Server => String::new(),
        };
        let transaction = Transaction::from_input(id, user_id, input);

        trace!("Creating transaction '{}'", transaction.id());
        let raw = self.api.create(&transaction).await?;
        let mut created = first_record(raw, "create")?;
        if created.user_id.is_empty() {
            created.user_id = transaction.user_id;
        }

        let confirmed = created.clone();
        self.apply_for(user_id, move |state| {
            state.transactions.retain(|t| t.id() != confirmed.id());
            state.transactions.insert(0, confirmed);
            true
        });
        Ok(created)
    }

    async fn update(
        &self,
        id: &str,
        input: TransactionInput,
        user_id: &str,
    ) -> Result<Transaction> {
        self.require_user(user_id)?;
        input.validate().pub_result(ErrorType::Validation)?;
        let transaction = Transaction::from_input(id, user_id, input);

        trace!("Updating transaction '{id}'");
        let raw = self.api.update(id, user_id, &transaction).await?;
        if matches!(&raw, RawResponse::Records(r) | RawResponse::Envelope(r) if r.is_empty()) {
            return Err(not_found(id, user_id));
        }
        let mut updated = first_record(raw, "update")?;
        if updated.user_id.is_empty() {
            updated.user_id = transaction.user_id;
        }

        let confirmed = updated.clone();
        self.apply_for(user_id, move |state| {
            match state.transactions.iter_mut().find(|t| t.id() == id) {
                Some(slot) => {
                    *slot = confirmed;
                    true
                }
                None => false,
            }
        });
        Ok(updated)
    }

    async fn remove(&self, id: &str, user_id: &str) -> Result<()> {
        trace!("Deleting transaction '{id}'");
        let raw = self.api.delete(id, user_id).await?;
        reject_html(&raw)?;
        match deleted_count(&raw) {
            Some(0) => Err(not_found(id, user_id)),
            Some(_) => Ok(()),
            None => Err(Error::msg(
                ErrorType::InvalidResponse,
                format!("The delete response has no 'deleted' count: {raw:?}"),
            )),
        }
    }

    /// Fails with `ErrorType::Unauthenticated` unless `user_id` is the signed-in user.
    fn require_user(&self, user_id: &str) -> Result<()> {
        match self.identity.current_user() {
            Some(user) if user.uid() == user_id => Ok(()),
            Some(user) => Err(Error::msg(
                ErrorType::Unauthenticated,
                format!("'{user_id}' is not the signed-in user '{}'", user.uid()),
            )),
            None => Err(Error::msg(ErrorType::Unauthenticated, "Nobody is signed in")),
        }
    }

    /// Applies `f` to the state if `user_id` is still signed in, first clearing a cache that
    /// belongs to someone else. Returns whether `f` changed anything.
    fn apply_for(&self, user_id: &str, f: impl FnOnce(&mut StoreState) -> bool) -> bool {
        let signed_in = self.identity.current_user();
        if signed_in.as_ref().map(|u| u.uid()) != Some(user_id) {
            warn!("Dropping a response for {user_id}, who is no longer signed in");
            return false;
        }
        let mut applied = false;
        self.state.send_if_modified(|state| {
            let claimed = state.owner.as_deref() != Some(user_id);
            state.claim(user_id);
            applied = f(state);
            claimed || applied
        });
        applied
    }

    fn is_stale(&self, seq: u64, state: &StoreState) -> bool {
        let stale = self.options.discard_stale_fetches && seq < state.applied_fetch;
        if stale {
            warn!(
                "Discarding the response of fetch {seq}, fetch {} was already applied",
                state.applied_fetch
            );
        }
        stale
    }

    /// Whether a fetch newer than `seq` is still outstanding once `seq` completes.
    fn still_loading(&self, seq: u64) -> bool {
        self.options.discard_stale_fetches && seq < self.fetch_seq.load(Ordering::SeqCst)
    }

    fn notify(&self, notice: Notice) {
        trace!("Notice: {notice:?}");
        // No receivers is fine.
        let _ = self.notices.send(notice);
    }
}

fn clear_deleting(state: &mut StoreState, id: &str) -> bool {
    if state.is_deleting.as_deref() == Some(id) {
        state.is_deleting = None;
        true
    } else {
        false
    }
}

/// Keeps the records of `user_id`. The list is already scoped by user, so a record without an
/// owner is taken to be theirs.
fn keep_owned(user_id: &str, transactions: Vec<Transaction>) -> Vec<Transaction> {
    transactions
        .into_iter()
        .filter_map(|mut t| {
            if t.user_id.is_empty() {
                t.user_id = user_id.to_string();
            }
            if t.user_id == user_id {
                Some(t)
            } else {
                warn!("Dropping transaction '{}' owned by '{}'", t.id(), t.user_id);
                None
            }
        })
        .collect()
}

fn not_found(id: &str, user_id: &str) -> Error {
    Error::msg(
        ErrorType::NotFoundOrForbidden,
        format!("Transaction '{id}' does not exist or does not belong to '{user_id}'"),
    )
}

/// The first record of a create or update response.
fn first_record(raw: RawResponse, what: &str) -> Result<Transaction> {
    normalize(raw)?.into_iter().next().ok_or_else(|| {
        Error::msg(
            ErrorType::InvalidResponse,
            format!("The {what} response did not contain a transaction"),
        )
    })
}

/// Reads `deleted` from a delete response. Spreadsheet cells may come back as numbers, numeric
/// strings or booleans.
fn deleted_count(raw: &RawResponse) -> Option<u64> {
    match raw.field("deleted")? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(u64::from(*b)),
        _ => None,
    }
}
