//! Emotion fusion: dominant text signal → generation parameters.

use super::types::EmotionSignal;

/// Temperature for confident emotional input.
pub const TEMPERATURE_HIGH: f64 = 0.9;
/// Temperature for moderately confident input.
pub const TEMPERATURE_MEDIUM: f64 = 0.75;
/// Temperature for weak emotional signal.
pub const TEMPERATURE_LOW: f64 = 0.6;
/// Temperature for neutral or low-confidence input.
pub const TEMPERATURE_CONSERVATIVE: f64 = 0.45;

/// Map a dominant-emotion score to a generation temperature.
///
/// Four bands, lower bound inclusive:
///
/// | score        | temperature |
/// |--------------|-------------|
/// | `>= 0.75`    | 0.9         |
/// | `[0.5,0.75)` | 0.75        |
/// | `[0.3,0.5)`  | 0.6         |
/// | `< 0.3`      | 0.45        |
///
/// Total over all `f32` inputs; NaN lands in the conservative band.
pub fn temperature_for(score: f32) -> f64 {
    if score >= 0.75 {
        TEMPERATURE_HIGH
    } else if score >= 0.5 {
        TEMPERATURE_MEDIUM
    } else if score >= 0.3 {
        TEMPERATURE_LOW
    } else {
        TEMPERATURE_CONSERVATIVE
    }
}

/// Tone directive embedded as the last rule of the system instruction.
pub fn tone_directive(signal: &EmotionSignal) -> String {
    format!("Current emotional tone: {}", signal.label)
}

/// Generation parameters derived from the dominant text emotion.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutcome {
    /// Sampling temperature for the reply model.
    pub temperature: f64,
    /// Tone directive for the system instruction.
    pub tone_directive: String,
}

impl FusionOutcome {
    /// Derive parameters from the dominant text signal.
    pub fn from_signal(signal: &EmotionSignal) -> Self {
        Self {
            temperature: temperature_for(signal.score),
            tone_directive: tone_directive(signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_are_inclusive_on_lower_bound() {
        assert_eq!(temperature_for(1.0), 0.9);
        assert_eq!(temperature_for(0.75), 0.9);
        assert_eq!(temperature_for(0.7499), 0.75);
        assert_eq!(temperature_for(0.5), 0.75);
        assert_eq!(temperature_for(0.4999), 0.6);
        assert_eq!(temperature_for(0.3), 0.6);
        assert_eq!(temperature_for(0.2999), 0.45);
        assert_eq!(temperature_for(0.0), 0.45);
    }

    #[test]
    fn mapping_is_total_and_monotonic() {
        let allowed = [0.9, 0.75, 0.6, 0.45];
        let mut previous = f64::INFINITY;
        for step in (0..=100).rev() {
            let t = temperature_for(step as f32 / 100.0);
            assert!(allowed.contains(&t), "unexpected temperature {t}");
            assert!(t <= previous, "not monotonic at {step}");
            previous = t;
        }
        assert_eq!(temperature_for(f32::NAN), 0.45);
        assert_eq!(temperature_for(-3.0), 0.45);
        assert_eq!(temperature_for(f32::INFINITY), 0.9);
    }

    #[test]
    fn directive_names_label() {
        let outcome = FusionOutcome::from_signal(&EmotionSignal::new("sadness", 0.55));
        assert_eq!(outcome.tone_directive, "Current emotional tone: sadness");
        assert_eq!(outcome.temperature, 0.75);
    }
}
