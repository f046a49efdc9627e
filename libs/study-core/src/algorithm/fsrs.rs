//! FSRS (Free Spaced Repetition Scheduler) algorithm.
//!
//! DSR memory model with a power-law forgetting curve:
//! - Difficulty (D): Card difficulty 1-10
//! - Stability (S): Days until retention drops to the requested level
//! - Retrievability (R): Probability of recall, R = (1 + t / (9 * S))^(-1)
//!
//! Ratings come from three buttons (Wrong, Hard, Easy) which index the weight
//! vector as FSRS grades Again, Hard and Easy. There is no Good rating.

use serde::{Deserialize, Serialize};

use super::ReviewOutcome;
use crate::types::{CardStatus, Quality};

/// Default requested retention.
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Default for `w[3]`, the initial stability of a new card rated Easy.
pub const DEFAULT_INITIAL_EASY_STABILITY: f64 = 4.5;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;
pub const MIN_STABILITY: f64 = 0.1;
pub const MAXIMUM_INTERVAL: f64 = 36500.0;

/// FSRS weight vector (21 weights, FSRS-6 layout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsrsParams {
    pub w: [f64; 21],
}

impl Default for FsrsParams {
    fn default() -> Self {
        Self {
            w: [
                0.212, 1.2931, 2.3065, // w[0-2]: initial stability for Again, Hard, Good
                DEFAULT_INITIAL_EASY_STABILITY, // w[3]: initial stability for Easy
                6.4133, // w[4]: initial difficulty base
                0.8334, // w[5]: initial difficulty exponent
                3.0194, // w[6]: difficulty delta per grade
                0.001,  // w[7]: mean reversion weight
                1.8722, // w[8]: recall stability exp base
                0.1666, // w[9]: stability decay
                0.796,  // w[10]: retrievability effect
                1.4835, // w[11]: forget stability base
                0.0614, // w[12]: difficulty on forget
                0.2629, // w[13]: stability on forget
                1.6483, // w[14]: retrievability on forget
                0.6014, // w[15]: hard penalty
                1.8729, // w[16]: easy bonus
                0.5425, 0.0912, 0.0658, // w[17-19]: short-term (unused by the 3-button scale)
                0.1542, // w[20]: decay (unused, curve is fixed)
            ],
        }
    }
}

impl FsrsParams {
    /// Default weights with a custom Easy seed.
    pub fn with_initial_easy_stability(mut self, value: f64) -> Self {
        self.w[3] = value;
        self
    }

    pub fn initial_easy_stability(&self) -> f64 {
        self.w[3]
    }
}

/// Compute the next interval and memory state for a rating.
///
/// Pure and infallible. `stability` and `difficulty` are ignored for unseen
/// cards; `requested_retention` must lie in (0, 1). Legacy cards must be
/// resolved through [`super::MemoryState::from_card_fields`] first.
pub fn calculate_next_review(
    quality: Quality,
    stability: f64,
    difficulty: f64,
    state: CardStatus,
    days_since_last_review: f64,
    requested_retention: f64,
    custom_params: Option<&FsrsParams>,
) -> ReviewOutcome {
    let fsrs = Fsrs {
        request_retention: requested_retention,
        maximum_interval: MAXIMUM_INTERVAL,
        params: custom_params.cloned().unwrap_or_default(),
    };
    fsrs.next_review(quality, stability, difficulty, state, days_since_last_review)
}

/// FSRS algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Fsrs {
    pub request_retention: f64,
    pub maximum_interval: f64,
    pub params: FsrsParams,
}

impl Default for Fsrs {
    fn default() -> Self {
        Self {
            request_retention: DEFAULT_RETENTION,
            maximum_interval: MAXIMUM_INTERVAL,
            params: FsrsParams::default(),
        }
    }
}

impl Fsrs {
    /// Schedule one rating.
    pub fn next_review(
        &self,
        quality: Quality,
        stability: f64,
        difficulty: f64,
        state: CardStatus,
        elapsed_days: f64,
    ) -> ReviewOutcome {
        debug_assert!(stability >= 0.0, "stability must not be negative");
        let grade = quality.grade();

        let (new_stability, new_difficulty) = if state == CardStatus::New || stability <= 0.0 {
            (self.initial_stability(grade), self.initial_difficulty(grade))
        } else {
            let r = self.retrievability(elapsed_days.max(0.0), stability);
            let new_d = self.next_difficulty(difficulty, grade);
            let new_s = if quality.is_lapse() {
                self.next_stability_forget(stability, difficulty, r)
            } else {
                self.next_stability_recall(stability, difficulty, r, grade)
            };
            (new_s, new_d)
        };

        let interval = if quality.is_lapse() {
            0
        } else {
            self.interval_from_stability(new_stability)
        };

        ReviewOutcome {
            interval,
            stability: new_stability,
            difficulty: new_difficulty,
            state: Self::determine_status(state, quality),
        }
    }

    /// Calculate retrievability (probability of recall).
    /// R = (1 + t / (9 * S))^(-1)
    pub fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64 {
        if stability <= 0.0 {
            return 0.0;
        }
        let factor = 1.0 + elapsed_days / (9.0 * stability);
        factor.powf(-1.0)
    }

    /// Days until retrievability decays to the requested retention.
    /// I = 9 * S * (1/R - 1), rounded, at least one day.
    pub fn interval_from_stability(&self, stability: f64) -> u32 {
        let raw = if self.request_retention <= 0.0 || self.request_retention >= 1.0 {
            stability
        } else {
            9.0 * stability * (1.0 / self.request_retention - 1.0)
        };
        raw.round().clamp(1.0, self.maximum_interval) as u32
    }

    /// S0(G) = w[G-1]
    fn initial_stability(&self, grade: u8) -> f64 {
        let index = grade.saturating_sub(1) as usize;
        self.params.w[index.min(3)].max(MIN_STABILITY)
    }

    /// D0(G) = w[4] - e^(w[5] * (G - 1)) + 1, unclamped.
    fn raw_initial_difficulty(&self, grade: u8) -> f64 {
        self.params.w[4] - (self.params.w[5] * (grade as f64 - 1.0)).exp() + 1.0
    }

    fn initial_difficulty(&self, grade: u8) -> f64 {
        self.raw_initial_difficulty(grade)
            .clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Linear damping toward the bounds, then mean reversion to D0(Easy).
    /// dD = -w[6] * (G - 3)
    /// D' = D + dD * (10 - D) / 9
    /// D'' = w[7] * D0(4) + (1 - w[7]) * D'
    fn next_difficulty(&self, current_d: f64, grade: u8) -> f64 {
        let delta = -self.params.w[6] * (grade as f64 - 3.0);
        let damped = current_d + delta * (10.0 - current_d) / 9.0;
        let reverted =
            self.params.w[7] * self.raw_initial_difficulty(4) + (1.0 - self.params.w[7]) * damped;
        reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// S' = S * (1 + e^(w[8]) * (11 - D) * S^(-w[9]) * (e^(w[10]*(1-R)) - 1) * modifier)
    fn next_stability_recall(
        &self,
        stability: f64,
        difficulty: f64,
        retrievability: f64,
        grade: u8,
    ) -> f64 {
        let w = &self.params.w;
        let d_factor = (11.0 - difficulty).max(0.1);
        let s_decay = stability.powf(-w[9]);
        let r_factor = (w[10] * (1.0 - retrievability)).exp() - 1.0;

        let modifier = match grade {
            2 => w[15], // Hard penalty
            4 => w[16], // Easy bonus
            _ => 1.0,
        };

        let growth = 1.0 + w[8].exp() * d_factor * s_decay * r_factor * modifier;
        (stability * growth).clamp(MIN_STABILITY, self.maximum_interval)
    }

    /// S' = w[11] * D^(-w[12]) * ((S+1)^w[13] - 1) * e^(w[14]*(1-R))
    fn next_stability_forget(&self, stability: f64, difficulty: f64, retrievability: f64) -> f64 {
        let w = &self.params.w;
        let d_factor = difficulty.max(MIN_DIFFICULTY).powf(-w[12]);
        let s_factor = (stability + 1.0).powf(w[13]) - 1.0;
        let r_factor = (w[14] * (1.0 - retrievability)).exp();

        let new_s = w[11] * d_factor * s_factor * r_factor;
        // Never exceed previous stability on lapse
        new_s.min(stability).max(MIN_STABILITY)
    }

    /// Wrong always relearns; anything else graduates to (or stays in) Review.
    fn determine_status(current: CardStatus, quality: Quality) -> CardStatus {
        match (current, quality) {
            (_, Quality::Wrong) => CardStatus::Relearning,
            (CardStatus::New | CardStatus::Learning | CardStatus::Relearning, _) => {
                CardStatus::Review
            }
            (CardStatus::Review, _) => CardStatus::Review,
        }
    }
}
