//! File-backed inventory: the CLI's type resolver and deletion transport.
//!
//! ```json
//! {
//!   "types":   [{"apiVersion": "v1", "kind": "ConfigMap"}],
//!   "objects": [{"apiVersion": "v1", "kind": "ConfigMap", "namespace": "default",
//!                "name": "cfg", "uid": "…", "protected": true}]
//! }
//! ```
//!
//! A `protected` object refuses deletion, which is how failure paths are
//! exercised from the command line.

use std::cell::RefCell;

use anyhow::Result;
use gprune_core::{
    DeleteError, DeleteMode, DeletionTransport, PruneContext, ResolveError, ResourceHandle,
    TypeIdentity, TypeResolver,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{read_json, write_json};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub protected: bool,
}

impl Child {
    pub fn type_identity(&self) -> TypeIdentity {
        TypeIdentity::new(self.api_version.clone(), self.kind.clone())
    }

    fn same_object(&self, other: &Child) -> bool {
        self.api_version == other.api_version
            && self.kind == other.kind
            && self.namespace == other.namespace
            && self.name == other.name
    }
}

impl ResourceHandle for Child {
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

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InventoryFile {
    #[serde(default)]
    pub types: Vec<TypeIdentity>,
    #[serde(default)]
    pub objects: Vec<Child>,
}

#[derive(Debug)]
pub struct FileInventory {
    types: Vec<TypeIdentity>,
    objects: RefCell<Vec<Child>>,
}

impl FileInventory {
    pub fn load(path: &str) -> Result<Self> {
        let file: InventoryFile = read_json(path)?;
        Ok(Self::from_file(file))
    }

    pub fn from_file(file: InventoryFile) -> Self {
        Self {
            types: file.types,
            objects: RefCell::new(file.objects),
        }
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let file = InventoryFile {
            types: self.types.clone(),
            objects: self.objects.borrow().clone(),
        };
        write_json(path, &file)
    }

    fn knows(&self, type_identity: &TypeIdentity) -> bool {
        self.types.contains(type_identity)
    }

    /// Create-or-get. A new object gets a fresh v4 uid; an existing one keeps
    /// its uid and flags.
    pub fn apply(&self, desired: &Child) -> Result<Child, ResolveError> {
        let type_identity = desired.type_identity();
        if !self.knows(&type_identity) {
            return Err(ResolveError::UnknownType { type_identity });
        }

        let mut objects = self.objects.borrow_mut();
        if let Some(existing) = objects.iter().find(|o| o.same_object(desired)) {
            return Ok(existing.clone());
        }

        let created = Child {
            uid: Uuid::new_v4().to_string(),
            ..desired.clone()
        };
        debug!(kind = %created.kind, name = %created.name, uid = %created.uid, "created child");
        objects.push(created.clone());
        Ok(created)
    }

    pub fn object_count(&self) -> usize {
        self.objects.borrow().len()
    }
}

impl TypeResolver for FileInventory {
    type Handle = Child;

    fn type_of(&self, handle: &Child) -> Result<TypeIdentity, ResolveError> {
        let type_identity = handle.type_identity();
        if self.knows(&type_identity) {
            Ok(type_identity)
        } else {
            Err(ResolveError::UnknownType { type_identity })
        }
    }

    fn empty_handle(
        &self,
        type_identity: &TypeIdentity,
        namespace: &str,
        name: &str,
    ) -> Result<Child, ResolveError> {
        if !self.knows(type_identity) {
            return Err(ResolveError::UnknownType {
                type_identity: type_identity.clone(),
            });
        }
        Ok(Child {
            api_version: type_identity.api_version.clone(),
            kind: type_identity.kind.clone(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            uid: String::new(),
            protected: false,
        })
    }
}

impl DeletionTransport<Child> for FileInventory {
    fn delete(&self, handle: &Child, mode: DeleteMode, ctx: &PruneContext) -> Result<(), DeleteError> {
        ctx.check()?;

        let mut objects = self.objects.borrow_mut();
        let Some(idx) = objects.iter().position(|o| o.same_object(handle)) else {
            return Err(DeleteError::NotFound);
        };
        if objects[idx].protected {
            return Err(DeleteError::rejected("object is protected"));
        }
        if mode == DeleteMode::Commit {
            objects.remove(idx);
        }
        Ok(())
    }
}
