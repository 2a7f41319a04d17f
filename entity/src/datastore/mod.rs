//! In-memory state of one replica.
//!
//! ```text
//! DataStore
//! ├── objects        "{keyname}:by_id:{uuid}" -> codec bytes
//! ├── registrations  object key -> tags it was indexed under
//! ├── sets           tag -> insertion-ordered IDs
//! ├── users          registered signer keys
//! └── roles          role key -> members + write patterns
//! ```
//!
//! Every primitive mutation is journaled while a transaction is open, so
//! [`DataStore::transaction`] can restore the exact previous state when the
//! closure fails or panics. Transactions nest: an inner failure only unwinds
//! the inner work.

mod access;
mod journal;
mod sets;

pub use access::{Role, Roles, Users};
pub use sets::TagSets;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::codec::Codec;
use journal::{Journal, Undo};

#[derive(Debug, Clone, Default)]
pub struct DataStore {
    codec: Codec,
    objects: BTreeMap<String, Vec<u8>>,
    registrations: BTreeMap<String, Vec<String>>,
    sets: TagSets,
    users: Users,
    roles: Roles,
    journal: Journal,
}

impl DataStore {
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            ..Self::default()
        }
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Run `f` atomically. On `Err` or panic every change made inside is
    /// undone; a panic is then resumed.
    pub fn transaction<T, E>(
        &mut self,
        f: impl FnOnce(&mut DataStore) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let checkpoint = self.journal.begin();
        match panic::catch_unwind(AssertUnwindSafe(|| f(self))) {
            Ok(Ok(value)) => {
                self.journal.commit(checkpoint);
                Ok(value)
            }
            Ok(Err(err)) => {
                self.rollback(checkpoint);
                Err(err)
            }
            Err(payload) => {
                self.rollback(checkpoint);
                panic::resume_unwind(payload)
            }
        }
    }

    fn rollback(&mut self, checkpoint: journal::Checkpoint) {
        let undone = self.journal.unwind(checkpoint);
        debug!(entries = undone.len(), depth = self.journal.depth(), "Rolling back store transaction");
        for undo in undone {
            match undo {
                Undo::Object { key, previous } => match previous {
                    Some(bytes) => {
                        self.objects.insert(key, bytes);
                    }
                    None => {
                        self.objects.remove(&key);
                    }
                },
                Undo::Registration { key, previous } => match previous {
                    Some(tags) => {
                        self.registrations.insert(key, tags);
                    }
                    None => {
                        self.registrations.remove(&key);
                    }
                },
                Undo::TagInserted { tag, id } => {
                    self.sets.remove(&tag, id);
                }
                Undo::TagRemoved { tag, id, position } => {
                    self.sets.insert_at(&tag, id, position);
                }
                Undo::Users(users) => self.users = users,
                Undo::Roles(roles) => self.roles = roles,
            }
        }
    }

    // ========================================================================
    // Records
    // ========================================================================

    pub fn contains_object(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn object(&self, key: &str) -> Option<&[u8]> {
        self.objects.get(key).map(Vec::as_slice)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn sets(&self) -> &TagSets {
        &self.sets
    }

    /// Tags the object at `key` is indexed under.
    pub fn registration(&self, key: &str) -> &[String] {
        self.registrations
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Write a record and index it under `tags`.
    pub(crate) fn insert_record(&mut self, key: String, id: Uuid, bytes: Vec<u8>, tags: Vec<String>) {
        let previous = self.objects.insert(key.clone(), bytes);
        self.journal.record(Undo::Object {
            key: key.clone(),
            previous,
        });

        for tag in &tags {
            if self.sets.insert(tag, id) {
                self.journal.record(Undo::TagInserted {
                    tag: tag.clone(),
                    id,
                });
            }
        }

        let previous = self.registrations.insert(key.clone(), tags);
        self.journal.record(Undo::Registration { key, previous });
    }

    /// Remove a record and purge exactly the tag memberships it was
    /// registered with.
    pub(crate) fn remove_record(&mut self, key: &str, id: Uuid) -> bool {
        let Some(bytes) = self.objects.remove(key) else {
            return false;
        };
        self.journal.record(Undo::Object {
            key: key.to_string(),
            previous: Some(bytes),
        });

        let tags = self.registrations.remove(key).unwrap_or_default();
        for tag in &tags {
            if let Some(position) = self.sets.remove(tag, id) {
                self.journal.record(Undo::TagRemoved {
                    tag: tag.clone(),
                    id,
                    position,
                });
            }
        }
        self.journal.record(Undo::Registration {
            key: key.to_string(),
            previous: Some(tags),
        });
        true
    }

    // ========================================================================
    // Users and roles
    // ========================================================================

    pub fn users(&self) -> &Users {
        &self.users
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    pub fn register_user(&mut self, pub_key: impl Into<String>) -> bool {
        self.snapshot_users();
        self.users.insert(pub_key)
    }

    pub fn unregister_user(&mut self, pub_key: &str) -> bool {
        self.snapshot_users();
        self.users.remove(pub_key)
    }

    pub fn add_role_members<I, S>(&mut self, key: &str, pub_keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.snapshot_roles();
        self.roles.add_members(key, pub_keys)
    }

    pub fn enable_write_access<I, S>(&mut self, key: &str, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.snapshot_roles();
        self.roles.enable_write_access(key, patterns)
    }

    pub fn disable_write_access<I, S>(&mut self, key: &str, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.snapshot_roles();
        self.roles.disable_write_access(key, patterns)
    }

    pub fn has_write_access(&self, key: &str, pub_key: &str, path: &str) -> bool {
        self.roles.has_write_access(key, pub_key, path)
    }

    fn snapshot_users(&mut self) {
        if self.journal.is_recording() {
            self.journal.record(Undo::Users(self.users.clone()));
        }
    }

    fn snapshot_roles(&mut self) {
        if self.journal.is_recording() {
            self.journal.record(Undo::Roles(self.roles.clone()));
        }
    }

    // ========================================================================
    // Hashing
    // ========================================================================

    /// Deterministic digest of the whole replicated state, hex encoded.
    ///
    /// Every field is length-prefixed so adjacent values cannot collide.
    pub fn head_hash(&self) -> String {
        let mut hasher = Sha256::new();

        hash_section(&mut hasher, b"objects", self.objects.len());
        for (key, bytes) in &self.objects {
            hash_field(&mut hasher, key.as_bytes());
            hash_field(&mut hasher, bytes);
        }

        hash_section(&mut hasher, b"sets", self.sets.tag_count());
        for (tag, ids) in self.sets.iter() {
            hash_field(&mut hasher, tag.as_bytes());
            hasher.update((ids.len() as u64).to_be_bytes());
            for id in ids {
                hasher.update(id.as_bytes());
            }
        }

        hash_section(&mut hasher, b"users", self.users.len());
        for key in self.users.iter() {
            hash_field(&mut hasher, key.as_bytes());
        }

        let roles = self.roles.iter().collect::<Vec<_>>();
        hash_section(&mut hasher, b"roles", roles.len());
        for (key, role) in roles {
            hash_field(&mut hasher, key.as_bytes());
            for member in role.members() {
                hash_field(&mut hasher, member.as_bytes());
            }
            hasher.update([0xff]);
            for pattern in role.write_patterns() {
                hash_field(&mut hasher, pattern.as_bytes());
            }
            hasher.update([0xff]);
        }

        hex::encode(hasher.finalize())
    }
}

fn hash_section(hasher: &mut Sha256, name: &[u8], len: usize) {
    hash_field(hasher, name);
    hasher.update((len as u64).to_be_bytes());
}

fn hash_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(store: &mut DataStore, n: u128, tags: &[&str]) {
        let id = Uuid::from_u128(n);
        store.insert_record(
            format!("things:by_id:{}", id),
            id,
            vec![n as u8],
            tags.iter().map(|t| t.to_string()).collect(),
        );
    }

    #[test]
    fn test_remove_record_purges_only_own_memberships() {
        let mut store = DataStore::default();
        record(&mut store, 1, &["things", "things:red"]);
        record(&mut store, 2, &["things", "things:red"]);

        let id = Uuid::from_u128(1);
        assert!(store.remove_record(&format!("things:by_id:{}", id), id));
        assert_eq!(store.sets().members("things"), &[Uuid::from_u128(2)]);
        assert_eq!(store.sets().members("things:red"), &[Uuid::from_u128(2)]);
    }

    #[test]
    fn test_failed_transaction_restores_state() {
        let mut store = DataStore::default();
        record(&mut store, 1, &["things"]);
        store.add_role_members("r", ["k"]);
        let before = store.head_hash();

        let result: Result<(), &str> = store.transaction(|store| {
            record(store, 2, &["things"]);
            let id = Uuid::from_u128(1);
            store.remove_record(&format!("things:by_id:{}", id), id);
            store.register_user("k");
            store.enable_write_access("r", ["/x"]);
            Err("boom")
        });

        assert!(result.is_err());
        assert_eq!(store.head_hash(), before);
        assert_eq!(store.sets().members("things"), &[Uuid::from_u128(1)]);
        assert!(store.users().is_empty());
    }

    #[test]
    fn test_nested_failure_keeps_outer_work() {
        let mut store = DataStore::default();
        let result: Result<(), &str> = store.transaction(|store| {
            record(store, 1, &["things"]);
            let inner: Result<(), &str> = store.transaction(|store| {
                record(store, 2, &["things"]);
                Err("inner")
            });
            assert!(inner.is_err());
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(store.object_count(), 1);
        assert_eq!(store.sets().members("things"), &[Uuid::from_u128(1)]);
    }

    #[test]
    fn test_panic_inside_transaction_rolls_back() {
        let mut store = DataStore::default();
        let before = store.head_hash();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: Result<(), ()> = store.transaction(|store| {
                record(store, 1, &["things"]);
                panic!("handler bug");
            });
        }));

        assert!(outcome.is_err());
        assert_eq!(store.head_hash(), before);
        assert_eq!(store.object_count(), 0);
    }

    #[test]
    fn test_head_hash_tracks_roles() {
        let mut store = DataStore::default();
        let empty = store.head_hash();
        store.enable_write_access("r", ["/a"]);
        assert_ne!(store.head_hash(), empty);
        store.disable_write_access("r", ["/a"]);
        store.add_role_members("r", Vec::<String>::new());
        assert_ne!(store.head_hash(), empty);
    }
}
