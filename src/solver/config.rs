//! Solver configuration (ambient stack expansion, see `SPEC_FULL.md`).

use crate::cnf::VarId;
use crate::minimization::PredicateMinimizationAlgorithm;
use crate::solver::deletion::DeletionPolicy;
use crate::solver::heuristic::HeuristicType;
use crate::solver::restarts::RestartPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub heuristic: HeuristicType,
    pub restart_policy: RestartPolicy,
    pub deletion_policy: DeletionPolicy,
    /// Runs Minisat-style self-subsumption minimization over every learned
    /// clause before it is attached.
    pub minimize_learned_clauses: bool,
    /// Seeds the watch-position RNG (spec §9: randomized watches must stay
    /// reproducible, never time-seeded).
    pub seed: u64,
    /// Which MODULE J driver, if any, should wrap the search (spec §4.J).
    pub predicate_minimization: PredicateMinimizationAlgorithm,
    /// The atoms a predicate-minimization driver counts and minimizes.
    /// Ignored when `predicate_minimization` is `None`.
    pub atoms_to_minimize: Vec<VarId>,
    /// How many of the most recently learned clauses `HeuristicType::Berkmin`
    /// scans per decision (spec §4.F `BERKMIN(limit>=1)`). Ignored by every
    /// other heuristic.
    pub berkmin_scan_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            heuristic: HeuristicType::Berkmin,
            restart_policy: RestartPolicy::Luby,
            deletion_policy: DeletionPolicy::MinisatStyle,
            minimize_learned_clauses: true,
            seed: 0xA5F00D,
            predicate_minimization: PredicateMinimizationAlgorithm::None,
            atoms_to_minimize: Vec::new(),
            berkmin_scan_limit: 10,
        }
    }
}

impl Config {
    pub fn new(heuristic: HeuristicType, restart_policy: RestartPolicy, deletion_policy: DeletionPolicy) -> Self {
        Config {
            heuristic,
            restart_policy,
            deletion_policy,
            ..Default::default()
        }
    }
}
