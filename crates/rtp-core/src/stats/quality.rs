//! Call quality estimation using a simplified ITU-T G.107 E-model

use std::fmt;

use serde::{Deserialize, Serialize};

/// Baseline R-factor for narrowband G.711 voice with no impairments
pub const BASELINE_R_FACTOR: f64 = 93.2;

/// One-way delay (ms) above which the steeper delay impairment applies
const DELAY_KNEE_MS: f64 = 177.3;

/// Jitter (ms) above which the jitter penalty applies
const JITTER_PENALTY_THRESHOLD_MS: f64 = 30.0;

/// Quality rating derived from a MOS score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityRating {
    /// MOS >= 4.3
    Excellent,
    /// 4.0 <= MOS < 4.3
    Good,
    /// 3.6 <= MOS < 4.0
    Fair,
    /// 3.1 <= MOS < 3.6
    Poor,
    /// MOS < 3.1
    Bad,
}

impl QualityRating {
    /// Rate a MOS score. Bands are closed on the low side.
    pub fn from_mos(mos: f64) -> Self {
        if mos >= 4.3 {
            Self::Excellent
        } else if mos >= 4.0 {
            Self::Good
        } else if mos >= 3.6 {
            Self::Fair
        } else if mos >= 3.1 {
            Self::Poor
        } else {
            Self::Bad
        }
    }

    /// Human-facing label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::Bad => "Bad",
        }
    }
}

impl fmt::Display for QualityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delay impairment `Id` for a one-way delay in milliseconds
pub fn delay_impairment(one_way_delay_ms: f64) -> f64 {
    if one_way_delay_ms > DELAY_KNEE_MS {
        0.024 * one_way_delay_ms + 0.11 * (one_way_delay_ms - DELAY_KNEE_MS)
    } else {
        0.024 * one_way_delay_ms
    }
}

/// Effective equipment impairment `Ie_eff` for a packet loss percentage
pub fn loss_impairment(packet_loss_percent: f64) -> f64 {
    if packet_loss_percent > 0.0 {
        10.0 + 10.0 * (1.0 + 15.0 * packet_loss_percent).log10()
    } else {
        0.0
    }
}

/// Heuristic penalty for jitter above 30ms. Not part of G.107.
pub fn jitter_penalty(jitter_ms: f64) -> f64 {
    if jitter_ms > JITTER_PENALTY_THRESHOLD_MS {
        (jitter_ms - JITTER_PENALTY_THRESHOLD_MS) * 0.1
    } else {
        0.0
    }
}

/// Compute the R-factor from round-trip time, loss and jitter
pub fn calculate_r_factor(rtt_ms: f64, packet_loss_percent: f64, jitter_ms: f64) -> f64 {
    BASELINE_R_FACTOR
        - delay_impairment(rtt_ms / 2.0)
        - loss_impairment(packet_loss_percent)
        - jitter_penalty(jitter_ms)
}

/// Convert an R-factor to MOS, clamped to `[1.0, 5.0]`
pub fn r_factor_to_mos(r: f64) -> f64 {
    let mos = if r < 0.0 {
        1.0
    } else if r > 100.0 {
        4.5
    } else {
        1.0 + 0.035 * r + 7.0e-6 * r * (r - 60.0) * (100.0 - r)
    };
    mos.clamp(1.0, 5.0)
}

/// Estimate MOS from round-trip time, loss and jitter
pub fn calculate_mos(rtt_ms: f64, packet_loss_percent: f64, jitter_ms: f64) -> f64 {
    r_factor_to_mos(calculate_r_factor(rtt_ms, packet_loss_percent, jitter_ms))
}

/// Round to two decimal places for reporting
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
