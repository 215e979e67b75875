use polychat_types::ProviderId;
use serde::{Serialize, Serializer};

/// Running cost per provider for one session.
///
/// Always holds exactly one entry per [`ProviderId`]. Entries only grow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostLedger {
    totals: [f64; 4],
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `cost` to `provider`'s running total.
    ///
    /// Negative or non-finite costs are dropped so totals stay monotonic.
    pub fn record(&mut self, provider: ProviderId, cost: f64) {
        if !cost.is_finite() || cost < 0.0 {
            tracing::warn!(provider = %provider, cost, "Ignoring invalid cost");
            return;
        }
        self.totals[provider.index()] += cost;
    }

    pub fn get(&self, provider: ProviderId) -> f64 {
        self.totals[provider.index()]
    }

    pub fn total(&self) -> f64 {
        self.totals.iter().sum()
    }

    /// Entries in [`ProviderId::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (ProviderId, f64)> + '_ {
        ProviderId::ALL.into_iter().map(|id| (id, self.get(id)))
    }
}

impl Serialize for CostLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
