//! # Acceptance Decision
//!
//! Whether the simulated authority accepts a submission is decided by an
//! injectable [`AcceptanceDecider`], so tests and demos can pin the outcome.

use std::sync::Mutex;

use cajero_core::Document;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Decides the outcome of one submission.
pub trait AcceptanceDecider: Send + Sync {
    /// Returns true when the document is accepted.
    fn accepts(&self, doc: &Document) -> bool;
}

/// Accepts with a fixed probability.
///
/// With a seed, the sequence of outcomes is reproducible.
#[derive(Debug)]
pub struct RandomDecider {
    success_rate: f64,
    rng: Mutex<StdRng>,
}

impl RandomDecider {
    /// `success_rate` is clamped to `0.0..=1.0`.
    pub fn new(success_rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomDecider {
            success_rate: success_rate.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl AcceptanceDecider for RandomDecider {
    fn accepts(&self, _doc: &Document) -> bool {
        // A poisoned lock still holds a usable RNG.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_bool(self.success_rate)
    }
}

/// Always returns the same outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDecider(pub bool);

impl FixedDecider {
    pub const fn accept() -> Self {
        FixedDecider(true)
    }

    pub const fn reject() -> Self {
        FixedDecider(false)
    }
}

impl AcceptanceDecider for FixedDecider {
    fn accepts(&self, _doc: &Document) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cajero_core::{
        Client, CompanyProfile, DocumentKind, PaymentTerm, SeriesNumber, TaxBreakdown,
    };

    fn doc() -> Document {
        Document::issue(
            DocumentKind::Receipt,
            SeriesNumber::new("B001", 1),
            CompanyProfile::demo().local_now(),
            Client::anonymous(),
            PaymentTerm::Cash,
            Vec::new(),
            TaxBreakdown::default(),
        )
    }

    #[test]
    fn test_seeded_decider_is_reproducible() {
        let doc = doc();
        let a = RandomDecider::new(0.5, Some(42));
        let b = RandomDecider::new(0.5, Some(42));
        let first: Vec<bool> = (0..32).map(|_| a.accepts(&doc)).collect();
        let second: Vec<bool> = (0..32).map(|_| b.accepts(&doc)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extreme_rates() {
        let doc = doc();
        let always = RandomDecider::new(1.0, None);
        let never = RandomDecider::new(0.0, None);
        assert!((0..50).all(|_| always.accepts(&doc)));
        assert!((0..50).all(|_| !never.accepts(&doc)));
    }

    #[test]
    fn test_rate_is_clamped() {
        assert_eq!(RandomDecider::new(3.0, Some(1)).success_rate(), 1.0);
        assert_eq!(RandomDecider::new(-1.0, Some(1)).success_rate(), 0.0);
    }

    #[test]
    fn test_fixed_decider() {
        let doc = doc();
        assert!(FixedDecider::accept().accepts(&doc));
        assert!(!FixedDecider::reject().accepts(&doc));
    }
}
