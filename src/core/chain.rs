use crate::domain::ports::Middleware;
use crate::utils::error::{AuthError, Result};
use serde::Serialize;
use std::collections::HashSet;

/// One node of a published chain: a middleware plus the link it owns next.
pub struct Link {
    middleware: Box<dyn Middleware>,
    next: Option<Box<Link>>,
}

impl Link {
    pub fn name(&self) -> &str {
        self.middleware.name()
    }

    pub fn next(&self) -> Option<&Link> {
        self.next.as_deref()
    }

    /// Runs this link's rule and, only if it passes, the rest of the chain.
    pub fn check(&self, identifier: &str, secret: &str) -> bool {
        if !self.middleware.check(identifier, secret) {
            tracing::trace!(link = self.name(), "chain short-circuited");
            return false;
        }
        self.check_next(identifier, secret)
    }

    /// End of chain is an implicit pass.
    fn check_next(&self, identifier: &str, secret: &str) -> bool {
        match &self.next {
            None => true,
            Some(next) => next.check(identifier, secret),
        }
    }
}

/// Assembles links in order before anything can evaluate them.
///
/// `link_with` attaches the successor to the link added last and moves the
/// builder onto it, so `ChainBuilder::new(a).link_with(b).link_with(c)` wires
/// a -> b -> c. [`ChainBuilder::tail`] returns the link most recently attached.
pub struct ChainBuilder {
    head: Box<dyn Middleware>,
    rest: Vec<Box<dyn Middleware>>,
}

impl ChainBuilder {
    pub fn new(head: impl Middleware + 'static) -> Self {
        Self::from_boxed(Box::new(head))
    }

    pub fn from_boxed(head: Box<dyn Middleware>) -> Self {
        Self {
            head,
            rest: Vec::new(),
        }
    }

    /// Builds from an ordered list; the first entry becomes the head.
    pub fn from_links(links: Vec<Box<dyn Middleware>>) -> Result<Self> {
        let mut links = links.into_iter();
        let head = links.next().ok_or(AuthError::EmptyChain)?;
        Ok(Self {
            head,
            rest: links.collect(),
        })
    }

    pub fn link_with(self, next: impl Middleware + 'static) -> Self {
        self.link_boxed(Box::new(next))
    }

    pub fn link_boxed(mut self, next: Box<dyn Middleware>) -> Self {
        self.rest.push(next);
        self
    }

    pub fn tail(&self) -> &dyn Middleware {
        self.rest.last().unwrap_or(&self.head).as_ref()
    }

    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn build(self) -> Chain {
        let len = self.len();
        let mut next: Option<Box<Link>> = None;
        for middleware in self.rest.into_iter().rev() {
            next = Some(Box::new(Link { middleware, next }));
        }

        Chain {
            head: Link {
                middleware: self.head,
                next,
            },
            len,
        }
    }

    /// Like [`ChainBuilder::build`], but refuses a chain where two links
    /// share a name.
    pub fn build_unique(self) -> Result<Chain> {
        if let Some(name) = self.first_duplicate_name() {
            return Err(AuthError::DuplicateLink { name });
        }
        Ok(self.build())
    }

    fn first_duplicate_name(&self) -> Option<String> {
        let mut seen = HashSet::new();
        std::iter::once(&self.head)
            .chain(self.rest.iter())
            .map(|middleware| middleware.name())
            .find(|name| !seen.insert(*name))
            .map(str::to_string)
    }
}

/// Immutable, fully wired chain. Evaluation starts at the head.
pub struct Chain {
    head: Link,
    len: usize,
}

impl Chain {
    pub fn check(&self, identifier: &str, secret: &str) -> bool {
        self.head.check(identifier, secret)
    }

    pub fn head(&self) -> &Link {
        &self.head
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        std::iter::successors(Some(&self.head), |link| link.next())
    }

    pub fn names(&self) -> Vec<&str> {
        self.links().map(Link::name).collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn summary(&self) -> ChainSummary {
        ChainSummary {
            length: self.len,
            links: self.names().into_iter().map(str::to_string).collect(),
        }
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
    pub length: usize,
    pub links: Vec<String>,
}

/// Wraps a closure as a link. Handy for ad-hoc rules and tests.
pub struct PredicateLink<F> {
    name: String,
    predicate: F,
}

impl<F> PredicateLink<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> Middleware for PredicateLink<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, identifier: &str, secret: &str) -> bool {
        (self.predicate)(identifier, secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingLink {
        name: String,
        result: bool,
        calls: Arc<AtomicUsize>,
    }

    impl CountingLink {
        fn new(name: &str, result: bool) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name: name.to_string(),
                    result,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl Middleware for CountingLink {
        fn name(&self) -> &str {
            &self.name
        }

        fn check(&self, _identifier: &str, _secret: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
        }
    }

    #[test]
    fn test_single_link_returns_own_result() {
        let passing = ChainBuilder::new(PredicateLink::new("yes", |_: &str, _: &str| true)).build();
        let failing = ChainBuilder::new(PredicateLink::new("no", |_: &str, _: &str| false)).build();

        assert!(passing.check("a", "b"));
        assert!(!failing.check("a", "b"));
        assert_eq!(passing.len(), 1);
        assert!(passing.head().next().is_none());
    }

    #[test]
    fn test_link_with_wires_in_order() {
        let builder = ChainBuilder::new(PredicateLink::new("a", |_: &str, _: &str| true))
            .link_with(PredicateLink::new("b", |_: &str, _: &str| true));
        assert_eq!(builder.tail().name(), "b");

        let builder = builder.link_with(PredicateLink::new("c", |_: &str, _: &str| true));
        assert_eq!(builder.tail().name(), "c");

        let chain = builder.build();
        let head = chain.head();
        assert_eq!(head.name(), "a");
        let second = head.next().unwrap();
        assert_eq!(second.name(), "b");
        let third = second.next().unwrap();
        assert_eq!(third.name(), "c");
        assert!(third.next().is_none());
        assert_eq!(chain.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_tail_of_fresh_builder_is_head() {
        let builder = ChainBuilder::new(PredicateLink::new("only", |_: &str, _: &str| true));
        assert_eq!(builder.tail().name(), "only");
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_failure_short_circuits_remaining_links() {
        let (first, first_calls) = CountingLink::new("first", true);
        let (second, second_calls) = CountingLink::new("second", false);
        let (third, third_calls) = CountingLink::new("third", true);

        let chain = ChainBuilder::new(first)
            .link_with(second)
            .link_with(third)
            .build();

        assert!(!chain.check("id", "secret"));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_result_is_conjunction_of_all_links() {
        for mask in 0u8..8 {
            let outcomes = [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0];
            let links: Vec<Box<dyn Middleware>> = outcomes
                .iter()
                .enumerate()
                .map(|(i, &ok)| {
                    Box::new(PredicateLink::new(format!("link{}", i), move |_: &str, _: &str| ok))
                        as Box<dyn Middleware>
                })
                .collect();
            let chain = ChainBuilder::from_links(links).unwrap().build();
            assert_eq!(chain.check("x", "y"), outcomes.iter().all(|&ok| ok));
        }
    }

    #[test]
    fn test_results_depend_only_on_input() {
        let chain = ChainBuilder::new(PredicateLink::new("non-empty", |id: &str, _: &str| {
            !id.is_empty()
        }))
        .link_with(PredicateLink::new("long", |_: &str, secret: &str| secret.len() >= 8))
        .build();

        assert!(!chain.check("", "longenough"));
        assert!(chain.check("bob", "longenough"));
        assert!(!chain.check("bob", "short"));
        assert!(chain.check("bob", "longenough"));
        assert!(!chain.check("", "longenough"));
    }

    #[test]
    fn test_from_links_rejects_empty_list() {
        assert!(matches!(
            ChainBuilder::from_links(Vec::new()),
            Err(AuthError::EmptyChain)
        ));
    }

    #[test]
    fn test_build_unique_rejects_repeated_names() {
        let result = ChainBuilder::new(PredicateLink::new("same", |_: &str, _: &str| true))
            .link_with(PredicateLink::new("other", |_: &str, _: &str| true))
            .link_with(PredicateLink::new("same", |_: &str, _: &str| true))
            .build_unique();

        match result {
            Err(AuthError::DuplicateLink { name }) => assert_eq!(name, "same"),
            other => panic!("expected DuplicateLink, got {:?}", other.map(|c| c.names().len())),
        }
    }

    #[test]
    fn test_build_unique_accepts_distinct_names() {
        let chain = ChainBuilder::new(PredicateLink::new("a", |_: &str, _: &str| true))
            .link_with(PredicateLink::new("b", |_: &str, _: &str| true))
            .build_unique()
            .unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_summary_serializes_link_names() {
        let chain = ChainBuilder::new(PredicateLink::new("a", |_: &str, _: &str| true))
            .link_with(PredicateLink::new("b", |_: &str, _: &str| true))
            .build();
        let json = serde_json::to_value(chain.summary()).unwrap();
        assert_eq!(json["length"], 2);
        assert_eq!(json["links"][1], "b");
    }

    #[test]
    fn test_chain_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Chain>();
    }
}
