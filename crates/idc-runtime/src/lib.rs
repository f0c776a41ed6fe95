// Remote client traits (identity store, SSO admin)
pub mod adapter;

pub mod diff;

// Per-kind capabilities for the generic reconciler
pub mod kinds;

// Locate-by-natural-key over paged listings
pub mod locator;

// In-memory directory backing the test-suites
pub mod memory;

pub mod pagination;

// Read-only queries (list users)
pub mod query;

pub mod reconciler;

pub mod result;

// Bounded post-create existence wait
pub mod wait;

pub use adapter::{AttributeFilter, IdentityStoreClient, Page, SsoAdminClient};
pub use diff::Diff;
pub use kinds::{AssignmentKind, GroupKind, PermissionSetKind, ResourceKind, UserKind};
pub use memory::InMemoryDirectory;
pub use query::{QueryError, UserListing};
pub use reconciler::Reconciler;
pub use result::Outcome;
