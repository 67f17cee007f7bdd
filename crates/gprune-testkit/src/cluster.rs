use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use gprune_core::{
    DeleteError, DeleteMode, DeletionTransport, PruneContext, Reference, ResolveError,
    ResourceHandle, TypeIdentity, TypeResolver,
};
use serde::{Deserialize, Serialize};

/// A child object as the in-memory cluster stores it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub uid: String,
}

impl Object {
    pub fn new(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
            uid: String::new(),
        }
    }

    pub fn type_identity(&self) -> TypeIdentity {
        TypeIdentity::new(self.api_version.clone(), self.kind.clone())
    }

    /// The reference `mark_reconciled` will record for this (applied) object.
    pub fn reference(&self) -> Reference {
        Reference::new(
            self.type_identity(),
            self.namespace.clone(),
            self.name.clone(),
            self.uid.clone(),
        )
    }

    fn key(&self) -> ObjectKey {
        (self.type_identity(), self.namespace.clone(), self.name.clone())
    }
}

impl ResourceHandle for Object {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn uid(&self) -> &str {
        &self.uid
    }
}

type ObjectKey = (TypeIdentity, String, String);

/// One recorded `delete` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteCall {
    pub type_identity: TypeIdentity,
    pub namespace: String,
    pub name: String,
    pub mode: DeleteMode,
}

/// In-memory cluster: the type resolver and the deletion transport in one.
///
/// Single-threaded by construction (`RefCell` inside), matching the engine's
/// one-pass-at-a-time model.
#[derive(Debug, Default)]
pub struct MemoryCluster {
    types: BTreeSet<TypeIdentity>,
    objects: RefCell<BTreeMap<ObjectKey, Object>>,
    faults: RefCell<BTreeMap<ObjectKey, DeleteError>>,
    calls: RefCell<Vec<DeleteCall>>,
    next_uid: Cell<u64>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, api_version: &str, kind: &str) -> Self {
        self.types.insert(TypeIdentity::new(api_version, kind));
        self
    }

    pub fn knows(&self, type_identity: &TypeIdentity) -> bool {
        self.types.contains(type_identity)
    }

    /// Create-or-get: returns the stored object, assigning a uid on first apply.
    pub fn apply(&self, obj: &Object) -> Result<Object, ResolveError> {
        let type_identity = obj.type_identity();
        if !self.knows(&type_identity) {
            return Err(ResolveError::UnknownType { type_identity });
        }

        let mut objects = self.objects.borrow_mut();
        let stored = objects.entry(obj.key()).or_insert_with(|| {
            let n = self.next_uid.get() + 1;
            self.next_uid.set(n);
            Object {
                uid: format!("uid-{n:06}"),
                ..obj.clone()
            }
        });
        Ok(stored.clone())
    }

    /// Remove an object behind the engine's back (someone else deleted it).
    pub fn delete_out_of_band(&self, obj: &Object) -> bool {
        self.objects.borrow_mut().remove(&obj.key()).is_some()
    }

    pub fn exists(&self, obj: &Object) -> bool {
        self.objects.borrow().contains_key(&obj.key())
    }

    pub fn object_count(&self) -> usize {
        self.objects.borrow().len()
    }

    /// Every delete of `obj` fails with `err` until cleared.
    pub fn inject_delete_fault(&self, obj: &Object, err: DeleteError) {
        self.faults.borrow_mut().insert(obj.key(), err);
    }

    pub fn clear_faults(&self) {
        self.faults.borrow_mut().clear();
    }

    pub fn delete_calls(&self) -> Vec<DeleteCall> {
        self.calls.borrow().clone()
    }

    pub fn commit_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.mode == DeleteMode::Commit)
            .count()
    }
}

impl TypeResolver for MemoryCluster {
    type Handle = Object;

    fn type_of(&self, handle: &Object) -> Result<TypeIdentity, ResolveError> {
        if handle.api_version.is_empty() || handle.kind.is_empty() {
            return Err(ResolveError::Unresolvable {
                message: format!("{}/{} has no apiVersion/kind", handle.namespace, handle.name),
            });
        }
        let type_identity = handle.type_identity();
        if !self.knows(&type_identity) {
            return Err(ResolveError::UnknownType { type_identity });
        }
        Ok(type_identity)
    }

    fn empty_handle(
        &self,
        type_identity: &TypeIdentity,
        namespace: &str,
        name: &str,
    ) -> Result<Object, ResolveError> {
        if !self.knows(type_identity) {
            return Err(ResolveError::UnknownType {
                type_identity: type_identity.clone(),
            });
        }
        Ok(Object::new(
            type_identity.api_version.clone(),
            type_identity.kind.clone(),
            namespace,
            name,
        ))
    }
}

impl DeletionTransport<Object> for MemoryCluster {
    fn delete(&self, handle: &Object, mode: DeleteMode, ctx: &PruneContext) -> Result<(), DeleteError> {
        self.calls.borrow_mut().push(DeleteCall {
            type_identity: handle.type_identity(),
            namespace: handle.namespace.clone(),
            name: handle.name.clone(),
            mode,
        });

        ctx.check()?;

        let key = handle.key();
        if let Some(err) = self.faults.borrow().get(&key) {
            return Err(err.clone());
        }

        let mut objects = self.objects.borrow_mut();
        if !objects.contains_key(&key) {
            return Err(DeleteError::NotFound);
        }
        if mode == DeleteMode::Commit {
            objects.remove(&key);
        }
        Ok(())
    }
}
