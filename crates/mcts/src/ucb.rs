//! Upper confidence bound formulas.
//!
//! Exactly one formula is active process-wide; every node evaluation reads
//! the selector. The formulas work on a snapshot of a node's statistics so
//! no lock is held while computing.

use std::sync::atomic::{AtomicU8, Ordering};

/// The available confidence bound formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UcbFormula {
    /// Plain UCB1 from the bandit literature.
    Ucb1,

    /// Variance-aware single-player variant. The default.
    TunedSp,

    /// UCB-V, weighing the empirical variance and the best score.
    UcbV,
}

static SELECTED: AtomicU8 = AtomicU8::new(UcbFormula::TunedSp as u8);

/// Switches the process-wide formula.
pub fn select_ucb(formula: UcbFormula) {
    SELECTED.store(formula as u8, Ordering::Relaxed);
}

/// The formula currently in effect.
pub fn selected_ucb() -> UcbFormula {
    match SELECTED.load(Ordering::Relaxed) {
        x if x == UcbFormula::Ucb1 as u8 => UcbFormula::Ucb1,
        x if x == UcbFormula::UcbV as u8 => UcbFormula::UcbV,
        _ => UcbFormula::TunedSp,
    }
}

/// A consistent snapshot of the statistics a formula needs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stats {
    /// Visits of the parent; 1 for the root.
    pub parent_visits: f64,
    pub visits: f64,
    pub mean: f64,
    pub variance: f64,
    pub best: f64,
    pub c: f64,
    pub w: f64,
}

/// Evaluates `stats` under the given formula.
pub(crate) fn value(formula: UcbFormula, s: &Stats) -> f64 {
    match formula {
        UcbFormula::Ucb1 => ucb1(s),
        UcbFormula::TunedSp => ucb_tuned_sp(s),
        UcbFormula::UcbV => ucb_v(s),
    }
}

/// `μ + C·√(ln Nₚ / nᵢ)` from the original two-armed bandit analysis.
fn ucb1(s: &Stats) -> f64 {
    s.mean + s.c * (s.parent_visits.ln() / s.visits).sqrt()
}

/// Single-player tuned bound: the exploration term is damped by the
/// observed variance, capped at 1/4, and the best score seen through the
/// node can be weighed in.
fn ucb_tuned_sp(s: &Stats) -> f64 {
    let chi = 2.0 * s.parent_visits.ln() / s.visits;
    let damped = (s.variance + chi).min(0.25);
    s.mean + s.c * (chi * damped).sqrt() + s.w * s.best
}

/// `μ + √(2σ·χ) + 3Wβχ` with `χ = C·ln Nₚ / nᵢ`.
fn ucb_v(s: &Stats) -> f64 {
    let chi = s.c * s.parent_visits.ln() / s.visits;
    s.mean + (2.0 * s.variance * chi).sqrt() + 3.0 * s.w * s.best * chi
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> Stats {
        Stats {
            parent_visits: 100.0,
            visits: 10.0,
            mean: 5.0,
            variance: 2.0,
            best: 8.0,
            c: 1.5,
            w: 0.5,
        }
    }

    #[test]
    fn test_ucb1() {
        let s = stats();
        let expected = 5.0 + 1.5 * (100.0f64.ln() / 10.0).sqrt();
        assert!((ucb1(&s) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_tuned_sp_caps_variance() {
        let s = stats();
        let chi = 2.0 * 100.0f64.ln() / 10.0;
        // variance + chi is far above 1/4 here, so the cap engages.
        let expected = 5.0 + 1.5 * (chi * 0.25).sqrt() + 0.5 * 8.0;
        assert!((ucb_tuned_sp(&s) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_tuned_sp_uses_small_variance() {
        let mut s = stats();
        s.variance = 0.01;
        s.parent_visits = 2.0;
        s.visits = 100.0;
        let chi = 2.0 * 2.0f64.ln() / 100.0;
        let expected = s.mean + s.c * (chi * (0.01 + chi)).sqrt() + s.w * s.best;
        assert!((ucb_tuned_sp(&s) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_ucb_v() {
        let s = stats();
        let chi = 1.5 * 100.0f64.ln() / 10.0;
        let expected = 5.0 + (2.0 * 2.0 * chi).sqrt() + 3.0 * 0.5 * 8.0 * chi;
        assert!((ucb_v(&s) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_selector_switches() {
        assert_eq!(selected_ucb(), UcbFormula::TunedSp);
        select_ucb(UcbFormula::Ucb1);
        assert_eq!(selected_ucb(), UcbFormula::Ucb1);
        select_ucb(UcbFormula::TunedSp);
    }

    #[test]
    fn test_root_parent_counts_one_visit() {
        let mut s = stats();
        s.parent_visits = 1.0;
        // ln 1 = 0: exploration vanishes, the mean dominates.
        assert!((ucb1(&s) - s.mean).abs() < 1e-12);
    }
}
