//! Cart repositories
//!
//! Carts are found or created per owner and saved back whole. Callers that
//! share a repository across threads get last-write-wins semantics per owner.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::carts::{Cart, CartId, OwnerId};

/// Errors raised by cart storage.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// IO error reading or writing a snapshot file
    #[error("failed to access cart snapshot: {0}")]
    Io(#[from] io::Error),

    /// Snapshot file is not valid JSON
    #[error("failed to parse cart snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored cart breaks the line item invariants
    #[error("stored cart {0} is inconsistent")]
    InconsistentCart(CartId),

    /// The in-memory store lock was poisoned
    #[error("cart store lock poisoned")]
    Poisoned,
}

/// Storage for carts, keyed by owner.
pub trait CartRepository {
    /// Return the owner's cart, creating and storing an empty one on first use.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if storage cannot be read or written.
    fn find_or_create(&self, owner: Option<&OwnerId>) -> Result<Cart, RepositoryError>;

    /// Replace the stored cart for the cart's owner.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] if storage cannot be written.
    fn save(&self, cart: &Cart) -> Result<(), RepositoryError>;
}

/// Carts held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCartRepository {
    carts: Mutex<FxHashMap<Option<OwnerId>, Cart>>,
}

impl InMemoryCartRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored carts.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Poisoned`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.carts.lock().map_err(|_err| RepositoryError::Poisoned)?.len())
    }
}

impl CartRepository for InMemoryCartRepository {
    fn find_or_create(&self, owner: Option<&OwnerId>) -> Result<Cart, RepositoryError> {
        let mut carts = self.carts.lock().map_err(|_err| RepositoryError::Poisoned)?;

        let cart = carts
            .entry(owner.cloned())
            .or_insert_with(|| Cart::new(owner.cloned()));

        Ok(cart.clone())
    }

    fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut carts = self.carts.lock().map_err(|_err| RepositoryError::Poisoned)?;

        carts.insert(cart.owner_id().cloned(), cart.clone());

        Ok(())
    }
}

/// On-disk layout of a snapshot file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    carts: Vec<Cart>,
}

/// Carts persisted as a JSON snapshot file, the durable client-side copy.
#[derive(Debug, Clone)]
pub struct JsonFileCartRepository {
    path: PathBuf,
}

impl JsonFileCartRepository {
    /// Use the snapshot at `path`; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Snapshot, RepositoryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Snapshot::default()),
            Err(err) => return Err(err.into()),
        };

        let snapshot: Snapshot = serde_json::from_str(&contents)?;

        if let Some(cart) = snapshot.carts.iter().find(|cart| !cart.is_consistent()) {
            return Err(RepositoryError::InconsistentCart(cart.id()));
        }

        Ok(snapshot)
    }

    fn store(&self, snapshot: &Snapshot) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}

impl CartRepository for JsonFileCartRepository {
    fn find_or_create(&self, owner: Option<&OwnerId>) -> Result<Cart, RepositoryError> {
        let mut snapshot = self.load()?;

        if let Some(cart) = snapshot.carts.iter().find(|c| c.owner_id() == owner) {
            return Ok(cart.clone());
        }

        let cart = Cart::new(owner.cloned());
        snapshot.carts.push(cart.clone());
        self.store(&snapshot)?;

        Ok(cart)
    }

    fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let mut snapshot = self.load()?;

        match snapshot
            .carts
            .iter_mut()
            .find(|c| c.owner_id() == cart.owner_id())
        {
            Some(existing) => *existing = cart.clone(),
            None => snapshot.carts.push(cart.clone()),
        }

        self.store(&snapshot)
    }
}
