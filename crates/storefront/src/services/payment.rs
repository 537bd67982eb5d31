//! Payment authorization.
//!
//! The checkout engine asks a [`PaymentGate`] once per attempt whether payment
//! is authorized. Real gateway integration lives behind this trait; the
//! implementations here are policies for development and tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Result of consulting the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDecision {
    Approved,
    Denied,
}

/// Opaque accept/deny decision for a checkout attempt.
pub trait PaymentGate: Send + Sync {
    /// Decide on one attempt. Called exactly once per validated checkout.
    fn authorize(&self) -> PaymentDecision;
}

/// Approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysApprove;

impl PaymentGate for AlwaysApprove {
    fn authorize(&self) -> PaymentDecision {
        PaymentDecision::Approved
    }
}

/// Mock card processor that declines every `n`th attempt.
///
/// The counter is shared by all requests; a race between two attempts can
/// only swap which of them gets declined.
#[derive(Debug)]
pub struct EveryNthDenied {
    every: u64,
    attempts: AtomicU64,
}

impl EveryNthDenied {
    /// Create the policy. Values below 1 are treated as 1 (deny everything).
    #[must_use]
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            attempts: AtomicU64::new(0),
        }
    }
}

impl PaymentGate for EveryNthDenied {
    fn authorize(&self) -> PaymentDecision {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        if attempt % self.every == 0 {
            PaymentDecision::Denied
        } else {
            PaymentDecision::Approved
        }
    }
}

/// Always returns the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub PaymentDecision);

impl PaymentGate for FixedDecision {
    fn authorize(&self) -> PaymentDecision {
        self.0
    }
}
