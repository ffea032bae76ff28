//! Node registry: the table of locally hosted servants.
//!
//! Registering a servant is the only way a local object becomes remotely
//! callable. Incoming calls name an [`Identity`]; the registry resolves it to
//! the servant and dispatches the operation.
//!
//! One registry is created per hosting process and passed explicitly to
//! whoever activates nodes or serves calls. Tests build as many isolated
//! registries as they like.
//!
//! # Thread Safety
//!
//! Backed by a sharded concurrent map: lookups run in parallel, and the
//! duplicate check plus insert of `register` happen under one shard lock.

use crate::dispatch::{Operation, Reply};
use crate::error::{DispatchError, RegistryError};
use crate::identity::Identity;
use crate::node::Servant;
use crate::proxy::RemoteRef;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

pub struct NodeRegistry {
    /// Label used in logs (the adapter name when hosted).
    name: String,
    servants: DashMap<Identity, Servant>,
}

impl NodeRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            servants: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds `servant` to `identity` and returns a reference to it.
    ///
    /// Fails with `DuplicateIdentity` if the identity is already bound; the
    /// existing entry is left untouched.
    pub fn register(
        &self,
        identity: Identity,
        servant: Servant,
    ) -> Result<RemoteRef, RegistryError> {
        match self.servants.entry(identity) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateIdentity(entry.key().clone())),
            Entry::Vacant(entry) => {
                let reference = RemoteRef::new(entry.key().clone(), servant.kind());
                debug!(registry = %self.name, reference = %reference, "registered servant");
                entry.insert(servant);
                Ok(reference)
            }
        }
    }

    /// Looks up the servant bound to `identity`.
    pub fn resolve(&self, identity: &Identity) -> Result<Servant, RegistryError> {
        self.servants
            .get(identity)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::NotFound(identity.clone()))
    }

    /// Resolves a reference, checking that the servant has the kind the
    /// reference claims.
    pub fn resolve_ref(&self, reference: &RemoteRef) -> Result<Servant, RegistryError> {
        let servant = self.resolve(&reference.identity)?;
        if servant.kind() != reference.kind {
            return Err(RegistryError::KindMismatch {
                identity: reference.identity.clone(),
                expected: reference.kind,
                actual: servant.kind(),
            });
        }
        Ok(servant)
    }

    /// Mints a reference for an identity this registry holds.
    pub fn proxy(&self, identity: &Identity) -> Result<RemoteRef, RegistryError> {
        let servant = self.resolve(identity)?;
        Ok(RemoteRef::new(identity.clone(), servant.kind()))
    }

    /// Resolves `identity` and runs `operation` against its servant.
    pub fn dispatch(
        &self,
        identity: &Identity,
        operation: Operation,
    ) -> Result<Reply, DispatchError> {
        let servant = self.resolve(identity).map_err(|_| {
            warn!(registry = %self.name, identity = %identity, "dispatch to unknown object");
            DispatchError::NotFound(identity.clone())
        })?;
        servant.dispatch(identity, operation)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.servants.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.servants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servants.is_empty()
    }

    /// All registered identities, in no particular order.
    pub fn identities(&self) -> Vec<Identity> {
        self.servants.iter().map(|entry| entry.key().clone()).collect()
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("name", &self.name)
            .field("servants", &self.servants.len())
            .finish()
    }
}
