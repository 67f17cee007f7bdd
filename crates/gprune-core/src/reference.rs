use serde::{Deserialize, Serialize};

use crate::{MarkError, ResourceHandle, TypeResolver};

/// Type identity of a resource: `apiVersion` (`group/version`, or bare
/// `version` for the core group) plus `kind`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeIdentity {
    pub api_version: String,
    pub kind: String,
}

impl TypeIdentity {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// API group; empty for the core group (`v1`).
    pub fn group(&self) -> &str {
        match self.api_version.split_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }

    pub fn version(&self) -> &str {
        match self.api_version.split_once('/') {
            Some((_, version)) => version,
            None => &self.api_version,
        }
    }
}

impl std::fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, Kind={}", self.api_version, self.kind)
    }
}

/// Identifies one child resource.
///
/// Equality is structural over every field, including the creation
/// identifier (`uid`): a child deleted and re-created under the same name is a
/// different reference.
///
/// Fields are private so a reference cannot be edited after construction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    api_version: String,
    kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    namespace: String,
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    uid: String,
}

impl Reference {
    pub fn new(
        type_identity: TypeIdentity,
        namespace: impl Into<String>,
        name: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            api_version: type_identity.api_version,
            kind: type_identity.kind,
            namespace: namespace.into(),
            name: name.into(),
            uid: uid.into(),
        }
    }

    pub fn type_identity(&self) -> TypeIdentity {
        TypeIdentity::new(self.api_version.clone(), self.kind.clone())
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// `namespace/name`, or just `name` for cluster-scoped children.
    pub fn key(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, Kind={} {}", self.api_version, self.kind, self.key())
    }
}

/// Build the [`Reference`] for an applied resource.
///
/// Fails with [`MarkError::UnappliedResource`] when the handle carries no
/// creation identifier, and with [`MarkError::ReferenceConstructionFailed`]
/// when the resolver does not know the handle's type. The uid check runs
/// first so the resolver is never consulted for an unapplied resource.
pub fn reference_for<R>(resolver: &R, handle: &R::Handle) -> Result<Reference, MarkError>
where
    R: TypeResolver + ?Sized,
{
    if handle.uid().is_empty() {
        return Err(MarkError::UnappliedResource {
            namespace: handle.namespace().to_string(),
            name: handle.name().to_string(),
        });
    }

    let type_identity =
        resolver
            .type_of(handle)
            .map_err(|source| MarkError::ReferenceConstructionFailed {
                namespace: handle.namespace().to_string(),
                name: handle.name().to_string(),
                source,
            })?;

    Ok(Reference::new(
        type_identity,
        handle.namespace(),
        handle.name(),
        handle.uid(),
    ))
}
