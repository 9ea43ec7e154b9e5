//! Session invariants checked during simulation.
//!
//! A [`SystemSnapshot`] records what every simulated client looks like at one
//! point in time: its session manager's state, and the links and in-flight
//! opens the network holds for it. Each [`Invariant`] is a predicate over that
//! snapshot; the property and scenario tests capture one after every step and
//! run the whole [`InvariantRegistry`] against it.
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SystemSnapshot::capture(&network, [&alice, &bob]);
//! registry.assert_all(&snapshot, "after switch");
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    LogScopedToTarget, OpenImpliesCompleteTarget, SingleLiveTransport, TargetFollowsSelection,
};
pub use snapshot::{ClientSnapshot, SystemSnapshot};

/// Outcome of one invariant check.
pub type InvariantResult = Result<(), Violation>;

/// A failed invariant and the client state that broke it.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Which invariant failed
    pub invariant: &'static str,
    /// Offending client and values
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Predicate over a [`SystemSnapshot`].
pub trait Invariant: Send + Sync {
    /// Short `snake_case` name used in violation reports.
    fn name(&self) -> &'static str;

    /// Inspect `state`, reporting the first client that breaks the rule.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Ordered set of invariants run together.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Registry with nothing in it.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Every session invariant:
    /// - [`SingleLiveTransport`]: at most one transport per client
    /// - [`LogScopedToTarget`]: no events without a bound target
    /// - [`OpenImpliesCompleteTarget`]: open sessions have identity and group
    /// - [`TargetFollowsSelection`]: bound target matches identity and group
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SingleLiveTransport);
        registry.add(LogScopedToTarget);
        registry.add(OpenImpliesCompleteTarget);
        registry.add(TargetFollowsSelection);
        registry
    }

    /// Register another invariant.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every invariant, collecting each violation rather than stopping at
    /// the first.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// [`Self::check_all`], panicking with `context` and every violation.
    #[allow(clippy::panic, reason = "Test assertion helper")]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Registered invariant count.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
