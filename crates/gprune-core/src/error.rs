use crate::{PruneResult, Reference, TypeIdentity};

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Type resolution failure reported by a [`TypeResolver`](crate::TypeResolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The resolver has no registration for this type.
    UnknownType { type_identity: TypeIdentity },
    /// The handle carries no usable type information.
    Unresolvable { message: String },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownType { type_identity } => {
                write!(f, "no type registered for {type_identity}")
            }
            Self::Unresolvable { message } => write!(f, "cannot resolve type: {message}"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Deletion failure reported by a [`DeletionTransport`](crate::DeletionTransport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteError {
    /// The resource is already absent. The engine counts this as pruned.
    NotFound,
    /// The transport gave up because the context was cancelled or timed out.
    Cancelled,
    /// Any other refusal or transport failure.
    Rejected { message: String },
}

impl DeleteError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl std::fmt::Display for DeleteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Rejected { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for DeleteError {}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

/// Why `Session::mark_reconciled` refused a resource. The session is left
/// untouched in both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkError {
    /// The resource has no creation identifier: apply it before marking.
    UnappliedResource { namespace: String, name: String },
    /// The type resolver could not identify the resource.
    ReferenceConstructionFailed {
        namespace: String,
        name: String,
        source: ResolveError,
    },
}

impl std::fmt::Display for MarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnappliedResource { namespace, name } => write!(
                f,
                "UNAPPLIED_RESOURCE: {namespace}/{name} has no uid \
                 (has it been created yet?)"
            ),
            Self::ReferenceConstructionFailed {
                namespace,
                name,
                source,
            } => write!(
                f,
                "REFERENCE_CONSTRUCTION_FAILED: {namespace}/{name}: {source}"
            ),
        }
    }
}

impl std::error::Error for MarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnappliedResource { .. } => None,
            Self::ReferenceConstructionFailed { source, .. } => Some(source),
        }
    }
}

/// One stale child that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneError {
    /// A stored reference could not be turned back into a deletable handle.
    ReferenceConstructionFailed {
        reference: Reference,
        source: ResolveError,
    },
    /// The transport failed and the error policy kept the failure.
    DeletionFailed {
        reference: Reference,
        source: DeleteError,
    },
    /// A custom error policy replaced the transport error with its own.
    Policy {
        reference: Reference,
        message: String,
    },
}

impl PruneError {
    pub fn reference(&self) -> &Reference {
        match self {
            Self::ReferenceConstructionFailed { reference, .. }
            | Self::DeletionFailed { reference, .. }
            | Self::Policy { reference, .. } => reference,
        }
    }
}

impl std::fmt::Display for PruneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReferenceConstructionFailed { reference, source } => write!(
                f,
                "REFERENCE_CONSTRUCTION_FAILED: cannot build handle for {reference}: {source}"
            ),
            Self::DeletionFailed { reference, source } => {
                write!(f, "DELETION_FAILED: failed to delete {reference}: {source}")
            }
            Self::Policy { reference, message } => write!(f, "{reference}: {message}"),
        }
    }
}

impl std::error::Error for PruneError {}

/// Returned by `Session::prune` when at least one stale child survived
/// because of an error.
///
/// Carries the partial [`PruneResult`]: whatever *was* pruned is real and the
/// ledger already reflects it, so the caller must still persist the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateFailure {
    pub result: PruneResult,
    pub errors: Vec<PruneError>,
}

impl AggregateFailure {
    /// References whose removal failed, in scan order.
    pub fn failed_references(&self) -> Vec<&Reference> {
        self.errors.iter().map(PruneError::reference).collect()
    }
}

impl std::fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PRUNE_FAILED: {} stale child(ren) could not be removed",
            self.errors.len()
        )?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}
