use crate::domain::model::Role;

/// One local rule in a chain.
///
/// `check` only answers for this link. Delegation to the successor is done by
/// [`crate::core::chain::Link`], which calls the next link only when this
/// predicate returns `true`.
pub trait Middleware: Send + Sync {
    /// Stable name used in logs, chain summaries and duplicate detection.
    fn name(&self) -> &str;

    fn check(&self, identifier: &str, secret: &str) -> bool;
}

pub trait AccountStore: Send + Sync {
    fn contains(&self, identifier: &str) -> bool;
    fn verify(&self, identifier: &str, secret: &str) -> bool;
    fn role_of(&self, identifier: &str) -> Option<Role>;
}
