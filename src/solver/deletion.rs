//! MODULE G (deletion half): learned-clause deletion policies (spec §4.G).

use clap::ValueEnum;

/// Restarts between `RestartBased` sweeps (spec §4.G "delete at every
/// k-th restart").
const RESTART_BASED_K: usize = 3;

/// Geometric growth applied to `Aggressive`'s learned-clause-count limit
/// after every sweep (spec §4.G "drop... when count exceeds a growing limit").
const AGGRESSIVE_GROWTH_FACTOR: f64 = 1.1;

/// Geometric growth applied to `MinisatStyle`'s allowed learned-clause count
/// after every sweep (spec §4.G "grow allowed count geometrically").
const MINISAT_GROWTH_FACTOR: f64 = 1.3;

const AGGRESSIVE_INITIAL_LIMIT: f64 = 2000.0;
const MINISAT_INITIAL_LIMIT: f64 = 1000.0;

/// Fraction of eligible learned clauses a sweep drops, least-active first.
const AGGRESSIVE_REDUCTION_RATIO: f64 = 0.5;
const MINISAT_REDUCTION_RATIO: f64 = 0.3;

/// Decides *when* a deletion sweep runs and what fraction/threshold it uses;
/// [`crate::solver::clause_database::ClauseDatabase`] owns the growing
/// threshold this needs across sweeps and performs the actual activity-
/// ordered removal (spec §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab_case")]
pub enum DeletionPolicy {
    /// Drop the least-active half of learned clauses once their count
    /// exceeds a limit that itself grows after every sweep.
    Aggressive,
    /// Sweep every `RESTART_BASED_K`-th restart, dropping every clause
    /// below the activity quartile.
    RestartBased,
    /// Minisat-style growing allowance: sweep once learned clauses exceed a
    /// geometrically growing count, dropping a fixed least-active fraction.
    MinisatStyle,
}

impl DeletionPolicy {
    /// Starting value for the policy's growing learned-clause-count limit.
    /// Meaningless for `RestartBased`, which is driven by restart count
    /// instead.
    pub fn initial_limit(&self) -> f64 {
        match self {
            DeletionPolicy::Aggressive => AGGRESSIVE_INITIAL_LIMIT,
            DeletionPolicy::MinisatStyle => MINISAT_INITIAL_LIMIT,
            DeletionPolicy::RestartBased => f64::INFINITY,
        }
    }

    /// Grows `limit` the way this policy's threshold grows after a sweep.
    pub fn grow_limit(&self, limit: f64) -> f64 {
        match self {
            DeletionPolicy::Aggressive => limit * AGGRESSIVE_GROWTH_FACTOR,
            DeletionPolicy::MinisatStyle => limit * MINISAT_GROWTH_FACTOR,
            DeletionPolicy::RestartBased => limit,
        }
    }

    pub fn due(&self, learned_count: usize, restarts_since_last: usize, limit: f64) -> bool {
        match self {
            DeletionPolicy::Aggressive | DeletionPolicy::MinisatStyle => learned_count as f64 > limit,
            DeletionPolicy::RestartBased => restarts_since_last >= RESTART_BASED_K,
        }
    }

    /// Fraction of eligible (activity-sorted) learned clauses to drop on a
    /// sweep, or `None` for [`DeletionPolicy::RestartBased`], which instead
    /// uses an activity-quartile threshold (see
    /// `ClauseDatabase::select_deletion_candidates`).
    pub fn reduction_ratio(&self) -> Option<f64> {
        match self {
            DeletionPolicy::Aggressive => Some(AGGRESSIVE_REDUCTION_RATIO),
            DeletionPolicy::MinisatStyle => Some(MINISAT_REDUCTION_RATIO),
            DeletionPolicy::RestartBased => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_based_is_due_only_every_kth_restart() {
        let policy = DeletionPolicy::RestartBased;
        for restarts in 0..RESTART_BASED_K {
            assert!(!policy.due(0, restarts, f64::INFINITY));
        }
        assert!(policy.due(0, RESTART_BASED_K, f64::INFINITY));
    }

    #[test]
    fn aggressive_and_minisat_limits_grow_after_a_sweep() {
        assert!(DeletionPolicy::Aggressive.grow_limit(100.0) > 100.0);
        assert!(DeletionPolicy::MinisatStyle.grow_limit(100.0) > 100.0);
    }
}
