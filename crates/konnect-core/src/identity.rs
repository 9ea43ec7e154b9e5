//! Local user identity.
//!
//! The display name is the only credential: there is no separate
//! authentication, and the identity ID is derived from the name. The name is
//! persisted through a [`KeyValueStore`] so it survives process restarts.
//!
//! Lifecycle: [`IdentityStore::open`] loads the slot once at startup,
//! [`IdentityStore::set`] writes through, [`IdentityStore::clear`] deletes.

use std::collections::HashMap;

use crate::error::{IdentityError, StoreError, ValidationError};

/// Key of the durable slot holding the display name.
pub const USER_NAME_KEY: &str = "userName";

/// The local user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Stable ID. Always equal to `name`.
    pub id: String,
    /// Display name
    pub name: String,
}

impl Identity {
    /// Build an identity from a name, trimming surrounding whitespace.
    pub fn from_name(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self { id: name.to_string(), name: name.to_string() })
    }
}

/// Durable string slots.
///
/// Implementations decide the backing medium; the identity store only needs
/// single-key load, save and remove.
pub trait KeyValueStore {
    /// Value stored under `key`. `None` if absent.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Deleting an absent key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Forgets everything when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.slots.remove(key);
        Ok(())
    }
}

/// Persisted identity of the local user.
///
/// Empty iff no identity has been set or it was cleared.
#[derive(Debug)]
pub struct IdentityStore<S: KeyValueStore> {
    store: S,
    current: Option<Identity>,
}

impl<S: KeyValueStore> IdentityStore<S> {
    /// Open the store and load any persisted identity.
    ///
    /// A persisted blank name is treated as absent.
    pub fn open(store: S) -> Result<Self, StoreError> {
        let current =
            store.load(USER_NAME_KEY)?.and_then(|name| Identity::from_name(&name).ok());
        Ok(Self { store, current })
    }

    /// Current identity. `None` if not set.
    pub fn get(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    /// Set the display name.
    ///
    /// Validation runs before anything is written; on any error the current
    /// identity is unchanged.
    pub fn set(&mut self, name: &str) -> Result<Identity, IdentityError> {
        let identity = Identity::from_name(name)?;
        self.store.save(USER_NAME_KEY, &identity.name)?;
        tracing::debug!(name = %identity.name, "identity set");
        self.current = Some(identity.clone());
        Ok(identity)
    }

    /// Delete the identity.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(USER_NAME_KEY)?;
        self.current = None;
        Ok(())
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the identity store, returning the backing store.
    pub fn into_store(self) -> S {
        self.store
    }
}
