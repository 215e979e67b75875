use crate::Message;

/// Heuristic ratio used when a provider does not report usage.
///
/// Applied to character counts, so any cost derived from it is approximate.
pub const ESTIMATED_TOKENS_PER_CHAR: f64 = 1.3;

const TOKENS_PER_PRICE_UNIT: f64 = 1_000_000.0;

/// Estimate the tokens consumed by sending `history`.
pub fn estimate_tokens(history: &[Message]) -> f64 {
    let chars: usize = history.iter().map(|m| m.content.chars().count()).sum();
    chars as f64 * ESTIMATED_TOKENS_PER_CHAR
}

/// Cost of `tokens` at a price quoted per million tokens.
pub fn compute_cost(tokens: f64, price_per_million: f64) -> f64 {
    (tokens / TOKENS_PER_PRICE_UNIT) * price_per_million
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
