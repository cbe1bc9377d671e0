//! Shared traits implemented by persisted entities.

use uuid::Uuid;

/// Exposes a stable identifier for entities stored behind a repository.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}
