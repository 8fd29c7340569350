//! MODULE G (restart half): restart scheduling policies (spec §4.G).

use clap::ValueEnum;

const LUBY_UNIT: usize = 32;
const GEOMETRIC_BASE: usize = 100;
const GEOMETRIC_FACTOR: f64 = 1.5;
const GLUCOSE_EMA_MIN_CONFLICTS: usize = 50;
const MINISAT_INNER_BASE: f64 = 100.0;
const MINISAT_INNER_FACTOR: f64 = 1.1;
const MINISAT_OUTER_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab_case")]
pub enum RestartPolicy {
    /// Luby sequence scaled by a constant unit, classic Minisat/Picosat
    /// default.
    Luby,
    /// Geometrically growing interval between restarts.
    Geometric,
    /// Minisat's original (pre-Luby) restart schedule: an inner conflict
    /// threshold that grows geometrically between restarts, reset back to
    /// its base and folded into an outer threshold — which itself grows
    /// geometrically — once the inner threshold catches up to it.
    MinisatStyle,
    /// Glucose-style EMA blocking/forcing check layered on a conflict
    /// count floor, ported from the teacher's `ema_policy.rs`.
    GlucoseEma,
    /// Never restart.
    None,
}

/// Tracks restart bookkeeping: the Luby/Geometric conflict counters, the
/// [`RestartPolicy::MinisatStyle`] inner/outer thresholds, and the
/// [`RestartPolicy::GlucoseEma`] signal that blocks or forces a restart.
#[derive(Debug, Clone)]
pub struct Restarter {
    policy: RestartPolicy,
    conflicts_since_restart: usize,
    num_restarts: usize,
    ema: GlucoseEma,
    minisat_inner_limit: f64,
    minisat_outer_limit: f64,
}

impl Restarter {
    pub fn new(policy: RestartPolicy) -> Self {
        Restarter {
            policy,
            conflicts_since_restart: 0,
            num_restarts: 0,
            ema: GlucoseEma::new(),
            minisat_inner_limit: MINISAT_INNER_BASE,
            minisat_outer_limit: MINISAT_INNER_BASE,
        }
    }

    pub fn on_conflict(&mut self, learned_clause_lbd: usize, trail_len: usize) {
        self.conflicts_since_restart += 1;
        self.ema.on_conflict(learned_clause_lbd, trail_len);
    }

    /// Returns whether a restart should happen now. If so, resets the
    /// internal schedule (the caller is responsible for actually unrolling
    /// the trail).
    pub fn due(&mut self) -> bool {
        let scheduled = match self.policy {
            RestartPolicy::Luby => {
                self.conflicts_since_restart >= LUBY_UNIT * Self::luby(self.num_restarts + 1)
            }
            RestartPolicy::Geometric => {
                self.conflicts_since_restart as f64
                    >= GEOMETRIC_BASE as f64 * GEOMETRIC_FACTOR.powi(self.num_restarts as i32)
            }
            RestartPolicy::MinisatStyle => self.conflicts_since_restart as f64 >= self.minisat_inner_limit,
            RestartPolicy::GlucoseEma => {
                self.conflicts_since_restart >= GLUCOSE_EMA_MIN_CONFLICTS
                    && self.ema.forces_restart()
                    && !self.ema.blocks_restart()
            }
            RestartPolicy::None => false,
        };
        if scheduled {
            self.conflicts_since_restart = 0;
            self.num_restarts += 1;
            if self.policy == RestartPolicy::MinisatStyle {
                self.minisat_inner_limit *= MINISAT_INNER_FACTOR;
                if self.minisat_inner_limit >= self.minisat_outer_limit {
                    self.minisat_outer_limit *= MINISAT_OUTER_FACTOR;
                    self.minisat_inner_limit = MINISAT_INNER_BASE;
                }
            }
        }
        scheduled
    }

    /// The Luby sequence, 1-indexed: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8 ...
    fn luby(i: usize) -> usize {
        for k in 1..32 {
            if i == (1 << k) - 1 {
                return 1 << (k - 1);
            }
        }
        let mut k = 1;
        loop {
            if (1 << (k - 1)) <= i && i < (1 << k) - 1 {
                return Self::luby(i - (1 << (k - 1)) + 1);
            }
            k += 1;
        }
    }
}

const LBD_EMA_SHORT_ALPHA: f64 = 2.0 / 51.0;
const LBD_EMA_LONG_ALPHA: f64 = 2e-6;
const ASSIGNMENTS_EMA_SHORT_ALPHA: f64 = 2.0 / 51.0;
const ASSIGNMENTS_EMA_LONG_ALPHA: f64 = 2e-6;
const FORCING_MARGIN: f64 = 1.15;
const BLOCKING_MARGIN: f64 = 1.4;

/// Glucose-style EMA restart refinement (Biere & Fröhlich, "Evaluating CDCL
/// Restart Schemes"): a short-term LBD average spiking above the long-term
/// average forces a restart, unless the trail is unusually deep right now,
/// which blocks it — restarting mid-way through a good run wastes work.
#[derive(Debug, Clone)]
struct GlucoseEma {
    lbd_short: ExponentialMovingAverage,
    lbd_long: ExponentialMovingAverage,
    assignments_short: ExponentialMovingAverage,
    assignments_long: ExponentialMovingAverage,
}

impl GlucoseEma {
    fn new() -> Self {
        GlucoseEma {
            lbd_short: ExponentialMovingAverage::new(LBD_EMA_SHORT_ALPHA),
            lbd_long: ExponentialMovingAverage::new(LBD_EMA_LONG_ALPHA),
            assignments_short: ExponentialMovingAverage::new(ASSIGNMENTS_EMA_SHORT_ALPHA),
            assignments_long: ExponentialMovingAverage::new(ASSIGNMENTS_EMA_LONG_ALPHA),
        }
    }

    fn on_conflict(&mut self, learned_clause_lbd: usize, num_current_assignments: usize) {
        self.lbd_short.update(learned_clause_lbd as f64);
        self.lbd_long.update(learned_clause_lbd as f64);
        self.assignments_short.update(num_current_assignments as f64);
        self.assignments_long.update(num_current_assignments as f64);
    }

    fn forces_restart(&self) -> bool {
        self.lbd_short.value > FORCING_MARGIN * self.lbd_long.value
    }

    fn blocks_restart(&self) -> bool {
        self.assignments_short.value > BLOCKING_MARGIN * self.assignments_long.value
    }
}

#[derive(Debug, Clone)]
struct ExponentialMovingAverage {
    value: f64,
    alpha: f64,
    target_alpha: f64,
}

impl ExponentialMovingAverage {
    fn new(target_alpha: f64) -> Self {
        debug_assert!(0.0 < target_alpha && target_alpha < 1.0);
        ExponentialMovingAverage {
            value: 1.0,
            alpha: 1.0,
            target_alpha,
        }
    }

    fn update(&mut self, new_value: f64) {
        if self.alpha != self.target_alpha {
            self.alpha /= 1.02;
            if self.alpha < self.target_alpha {
                self.alpha = self.target_alpha;
            }
        }
        self.value = self.alpha * new_value + (1.0 - self.alpha) * self.value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luby_sequence_matches_known_prefix() {
        let expected = [1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8];
        for (i, &value) in expected.iter().enumerate() {
            assert_eq!(Restarter::luby(i + 1), value);
        }
    }

    #[test]
    fn none_policy_never_restarts() {
        let mut restarter = Restarter::new(RestartPolicy::None);
        for _ in 0..100_000 {
            restarter.on_conflict(2, 10);
        }
        assert!(!restarter.due());
    }

    #[test]
    fn minisat_style_inner_threshold_grows_after_every_restart() {
        let mut restarter = Restarter::new(RestartPolicy::MinisatStyle);
        for _ in 0..100 {
            restarter.on_conflict(2, 10);
        }
        assert!(restarter.due());
        let first_inner_limit = restarter.minisat_inner_limit;
        assert!(first_inner_limit > MINISAT_INNER_BASE);

        for _ in 0..(first_inner_limit.ceil() as usize) {
            restarter.on_conflict(2, 10);
        }
        assert!(restarter.due());
        assert!(restarter.minisat_inner_limit > first_inner_limit || restarter.minisat_inner_limit == MINISAT_INNER_BASE);
    }

    #[test]
    fn minisat_style_folds_inner_into_outer_once_it_catches_up() {
        let mut restarter = Restarter::new(RestartPolicy::MinisatStyle);
        let mut outer_grew = false;
        let starting_outer = restarter.minisat_outer_limit;
        for _ in 0..64 {
            for _ in 0..(restarter.minisat_inner_limit.ceil() as usize) {
                restarter.on_conflict(2, 10);
            }
            restarter.due();
            if restarter.minisat_outer_limit > starting_outer {
                outer_grew = true;
                break;
            }
        }
        assert!(outer_grew, "outer threshold never grew across 64 restarts");
    }
}
