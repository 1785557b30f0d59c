//! Confidence scoring helpers for species recommendations.
//!
//! Scores are either server-supplied (clamped into [0, 1]) or synthesised
//! deterministically from list position. Nothing here is random.

/// Synthetic scores never reach this value through the linear segment.
pub const SYNTHETIC_FLOOR: f64 = 0.05;

/// Lower bound of the external-fallback confidence band.
pub const FALLBACK_BASE: f64 = 0.75;

/// Width of the external-fallback band: scores land in [0.75, 0.90).
pub const FALLBACK_SPREAD: f64 = 0.15;

/// Synthetic confidence for the item at `index`: `base - index * step`.
///
/// Once the linear segment would drop to the floor, the score keeps
/// decaying harmonically below it, so the sequence stays strictly
/// decreasing and strictly positive for any list length.
pub fn synthetic_confidence(base: f64, step: f64, index: usize) -> f64 {
    let base = base.clamp(0.0, 1.0);
    let knee = if step > 0.0 {
        ((base - SYNTHETIC_FLOOR) / step).ceil().max(0.0) as usize
    } else {
        usize::MAX
    };

    if index < knee {
        base - index as f64 * step
    } else {
        SYNTHETIC_FLOOR / (2 + index - knee) as f64
    }
}

/// Deterministic confidence for an external-fallback result.
///
/// The jitter comes from an FNV-1a hash of the taxon id, so the same
/// taxon always gets the same score.
pub fn fallback_confidence(taxon_id: u64) -> f64 {
    let bucket = fnv64(&taxon_id.to_le_bytes()) % 1000;
    FALLBACK_BASE + (bucket as f64 / 1000.0) * FALLBACK_SPREAD
}

/// Clamp a server-declared score into [0, 1]. Non-finite values are discarded.
pub fn clamp_score(raw: f64) -> Option<f64> {
    if raw.is_finite() {
        Some(raw.clamp(0.0, 1.0))
    } else {
        None
    }
}

/// FNV-1a 64-bit hash.
fn fnv64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}
