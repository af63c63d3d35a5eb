use crate::error::{IsengError, Result, WriteFailure};
use crate::traits::{UserReader, UserWriter};
use crate::transaction::TransactionState;
use crate::types::{ListUserRequest, User, UserId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Committed user rows, shared between the fake reader and writer
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    rows: Arc<Mutex<BTreeMap<UserId, User>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> MutexGuard<'_, BTreeMap<UserId, User>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a committed row directly, bypassing transactions
    pub fn insert(&self, user: User) {
        self.rows().insert(user.id.clone(), user);
    }

    /// Committed row for `id`, if any
    pub fn get(&self, id: &UserId) -> Option<User> {
        self.rows().get(id).cloned()
    }

    /// Number of committed rows
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    fn matching(&self, filter: &ListUserRequest) -> Vec<User> {
        let needle = filter.name_filter().map(str::to_lowercase);
        let mut users: Vec<User> = self
            .rows()
            .values()
            .filter(|user| match &needle {
                Some(needle) => user.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        users
    }
}

#[async_trait]
impl UserReader for InMemoryStore {
    async fn detail_user(&self, id: &UserId) -> Result<User> {
        self.get(id)
            .ok_or_else(|| IsengError::not_found("User", id.as_str()))
    }

    async fn list_users(&self, filter: &ListUserRequest) -> Result<Vec<User>> {
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        Ok(self
            .matching(filter)
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .collect())
    }

    async fn count_users(&self, filter: &ListUserRequest) -> Result<u64> {
        Ok(self.matching(filter).len() as u64)
    }
}

#[derive(Debug, Clone)]
enum Staged {
    Put(User),
    Remove(UserId),
}

/// Transaction of the fake writer: a buffer of staged mutations
#[derive(Debug)]
pub struct InMemoryTx {
    state: TransactionState,
    staged: Vec<Staged>,
}

impl InMemoryTx {
    pub fn state(&self) -> TransactionState {
        self.state
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == TransactionState::Open {
            Ok(())
        } else {
            Err(IsengError::write(
                WriteFailure::TransactionClosed,
                format!("transaction is {:?}", self.state),
            ))
        }
    }
}

/// Fake writer with fault injection and lifecycle counters
#[derive(Debug, Default)]
pub struct InMemoryWriter {
    store: InMemoryStore,
    fail_begin: AtomicBool,
    fail_next_write: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
}

impl InMemoryWriter {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// Make every `begin_transaction` fail with a connection error
    pub fn fail_begin(&self, fail: bool) {
        self.fail_begin.store(fail, Ordering::SeqCst);
    }

    /// Make the next mutation (only) fail with a store write error
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Make every commit fail, leaving the transaction open
    pub fn fail_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Make rollback of an open transaction fail
    pub fn fail_rollback(&self, fail: bool) {
        self.fail_rollback.store(fail, Ordering::SeqCst);
    }

    pub fn begun(&self) -> usize {
        self.begun.load(Ordering::SeqCst)
    }

    pub fn committed(&self) -> usize {
        self.committed.load(Ordering::SeqCst)
    }

    pub fn rolled_back(&self) -> usize {
        self.rolled_back.load(Ordering::SeqCst)
    }

    fn injected_write_failure(&self) -> Result<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(IsengError::write(WriteFailure::Store, "injected write failure"));
        }
        Ok(())
    }

    /// Whether `id` exists as seen from inside `tx`
    fn visible(&self, tx: &InMemoryTx, id: &UserId) -> bool {
        for staged in tx.staged.iter().rev() {
            match staged {
                Staged::Put(user) if &user.id == id => return true,
                Staged::Remove(removed) if removed == id => return false,
                _ => {}
            }
        }
        self.store.get(id).is_some()
    }
}

#[async_trait]
impl UserWriter for InMemoryWriter {
    type Tx = InMemoryTx;

    async fn begin_transaction(&self) -> Result<InMemoryTx> {
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err(IsengError::connection("primary store unreachable"));
        }
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(InMemoryTx {
            state: TransactionState::Open,
            staged: Vec::new(),
        })
    }

    async fn commit_transaction(&self, tx: &mut InMemoryTx) -> Result<()> {
        if tx.state != TransactionState::Open {
            return Err(IsengError::commit(format!(
                "cannot commit a transaction that is {:?}",
                tx.state
            )));
        }
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(IsengError::commit("injected commit failure"));
        }

        let mut rows = self.store.rows();
        for staged in tx.staged.drain(..) {
            match staged {
                Staged::Put(user) => {
                    rows.insert(user.id.clone(), user);
                }
                Staged::Remove(id) => {
                    rows.remove(&id);
                }
            }
        }
        tx.state = TransactionState::Committed;
        self.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback_transaction(&self, tx: &mut InMemoryTx) -> Result<()> {
        if tx.state != TransactionState::Open {
            return Ok(());
        }
        if self.fail_rollback.load(Ordering::SeqCst) {
            return Err(IsengError::connection("injected rollback failure"));
        }
        tx.staged.clear();
        tx.state = TransactionState::RolledBack;
        self.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_user(&self, tx: &mut InMemoryTx, user: &User) -> Result<()> {
        tx.ensure_open()?;
        self.injected_write_failure()?;
        if self.visible(tx, &user.id) {
            return Err(IsengError::write(
                WriteFailure::Constraint,
                format!("user {} already exists", user.id),
            ));
        }
        tx.staged.push(Staged::Put(user.clone()));
        Ok(())
    }

    async fn update_user(&self, tx: &mut InMemoryTx, user: &User) -> Result<()> {
        tx.ensure_open()?;
        self.injected_write_failure()?;
        if !self.visible(tx, &user.id) {
            return Err(IsengError::write(
                WriteFailure::NoMatchingRow,
                format!("update matched no user {}", user.id),
            ));
        }
        tx.staged.push(Staged::Put(user.clone()));
        Ok(())
    }

    async fn delete_user(&self, tx: &mut InMemoryTx, id: &UserId) -> Result<()> {
        tx.ensure_open()?;
        self.injected_write_failure()?;
        if !self.visible(tx, id) {
            return Err(IsengError::write(
                WriteFailure::NoMatchingRow,
                format!("delete matched no user {}", id),
            ));
        }
        tx.staged.push(Staged::Remove(id.clone()));
        Ok(())
    }
}
