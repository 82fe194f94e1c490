//! Role membership data model
//!
//! Three levels, each with a typed key:
//! - `GroupId`: the namespace a set of roles is scoped to
//! - `RoleName`: trimmed, lower-cased single token
//! - `Member`: platform handle without its `@` prefix, case preserved
//!
//! `Snapshot` is the whole state and the unit of persistence. Its mutators
//! are the only place where normalization, dedup and pruning happen.

mod errors;
mod names;
mod snapshot;

pub use errors::{ModelError, ModelResult};
pub use names::{GroupId, Member, RoleName, MENTION_PREFIX};
pub use snapshot::{GroupRoles, MemberSet, Snapshot};
