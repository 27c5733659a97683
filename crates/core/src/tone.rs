//! The four-dimensional tone vector shared by email personas and the
//! LinkedIn persona.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneVector {
    pub formality: u8,
    pub warmth: u8,
    pub authority: u8,
    pub directness: u8,
}

#[derive(Debug, thiserror::Error)]
#[error("tone vector component {component}={value} is out of range [1, 10]")]
pub struct ToneVectorRangeError {
    component: &'static str,
    value: u8,
}

impl ToneVector {
    pub fn new(formality: u8, warmth: u8, authority: u8, directness: u8) -> Result<Self, ToneVectorRangeError> {
        for (component, value) in [
            ("formality", formality),
            ("warmth", warmth),
            ("authority", authority),
            ("directness", directness),
        ] {
            if !(1..=10).contains(&value) {
                return Err(ToneVectorRangeError { component, value });
            }
        }
        Ok(Self { formality, warmth, authority, directness })
    }

    /// Clamp each component into `[1, 10]` rather than rejecting — used when
    /// building a tone vector from a continuous heuristic score that may
    /// fall just outside the integer range due to rounding.
    pub fn clamped(formality: f64, warmth: f64, authority: f64, directness: f64) -> Self {
        let clamp = |v: f64| v.round().clamp(1.0, 10.0) as u8;
        Self {
            formality: clamp(formality),
            warmth: clamp(warmth),
            authority: clamp(authority),
            directness: clamp(directness),
        }
    }

    pub fn as_array(&self) -> [u8; 4] {
        [self.formality, self.warmth, self.authority, self.directness]
    }

    /// Weighted mean with another tone vector, rounding to the nearest
    /// integer component. Weights need not sum to 1.
    pub fn weighted_mean(&self, self_weight: f64, other: &ToneVector, other_weight: f64) -> ToneVector {
        let total = (self_weight + other_weight).max(f64::EPSILON);
        let mix = |a: u8, b: u8| (a as f64 * self_weight + b as f64 * other_weight) / total;
        ToneVector::clamped(
            mix(self.formality, other.formality),
            mix(self.warmth, other.warmth),
            mix(self.authority, other.authority),
            mix(self.directness, other.directness),
        )
    }

    /// `1 - mean_abs_diff/10`, the validator's tone-match formula (spec.md §4.9).
    pub fn match_score(&self, other: &ToneVector) -> f64 {
        let diffs = [
            (self.formality as i32 - other.formality as i32).unsigned_abs(),
            (self.warmth as i32 - other.warmth as i32).unsigned_abs(),
            (self.authority as i32 - other.authority as i32).unsigned_abs(),
            (self.directness as i32 - other.directness as i32).unsigned_abs(),
        ];
        let mean_abs_diff = diffs.iter().sum::<u32>() as f64 / diffs.len() as f64;
        1.0 - mean_abs_diff / 10.0
    }
}

impl TryFrom<[u8; 4]> for ToneVector {
    type Error = ToneVectorRangeError;

    fn try_from(value: [u8; 4]) -> Result<Self, Self::Error> {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_components() {
        assert!(ToneVector::new(0, 5, 5, 5).is_err());
        assert!(ToneVector::new(11, 5, 5, 5).is_err());
        assert!(ToneVector::new(1, 5, 10, 5).is_ok());
    }

    #[test]
    fn identical_vectors_match_perfectly() {
        let a = ToneVector::new(5, 5, 5, 5).unwrap();
        assert_eq!(a.match_score(&a), 1.0);
    }

    #[test]
    fn weighted_mean_stays_in_range() {
        let a = ToneVector::new(1, 1, 1, 1).unwrap();
        let b = ToneVector::new(10, 10, 10, 10).unwrap();
        let mixed = a.weighted_mean(1.0, &b, 1.0);
        for component in mixed.as_array() {
            assert!((1..=10).contains(&component));
        }
    }

    proptest::proptest! {
        /// `clamped` never produces a component outside `[1, 10]`, for any
        /// float input including values far past either edge.
        #[test]
        fn clamped_always_in_range(f in -1000.0f64..1000.0, w in -1000.0f64..1000.0, a in -1000.0f64..1000.0, d in -1000.0f64..1000.0) {
            let tone = ToneVector::clamped(f, w, a, d);
            for component in tone.as_array() {
                prop_assert!((1..=10).contains(&component));
            }
        }

        /// `weighted_mean` of two in-range vectors stays in range regardless
        /// of the (non-negative) weights chosen.
        #[test]
        fn weighted_mean_always_in_range(
            fa in 1u8..=10, wa in 1u8..=10, aa in 1u8..=10, da in 1u8..=10,
            fb in 1u8..=10, wb in 1u8..=10, ab in 1u8..=10, db in 1u8..=10,
            weight_a in 0.0f64..100.0, weight_b in 0.0f64..100.0,
        ) {
            let a = ToneVector::new(fa, wa, aa, da).unwrap();
            let b = ToneVector::new(fb, wb, ab, db).unwrap();
            let mixed = a.weighted_mean(weight_a + 0.001, &b, weight_b + 0.001);
            for component in mixed.as_array() {
                prop_assert!((1..=10).contains(&component));
            }
        }
    }
}
