//! MODULE F: the pluggable decision-heuristic interface (spec §4.F).

pub mod berkmin;
pub mod first_undefined;

use crate::cnf::{Clause, VarId};
use crate::solver::clause_database::ClauseDatabase;
use clap::ValueEnum;

/// A decision heuristic only ever picks *which variable* to branch on; the
/// solver façade decides the polarity via phase-saving (spec §4.F, §9).
pub trait Heuristic {
    /// Called once per conflict, with the clause that was in conflict,
    /// before clause learning and backjumping run. Used to bump activity.
    fn on_conflict(&mut self, conflict_clause: &Clause);

    /// Called once per variable that becomes unassigned again, whether by
    /// backjumping or a full restart.
    fn on_unassign(&mut self, var: VarId);

    /// Picks the next unassigned variable to branch on. `clause_database`
    /// gives Berkmin access to the learned-clause store to scan; other
    /// heuristics may ignore it. Panics if every variable is already
    /// assigned — the caller must have checked satisfiability first.
    fn next_decision_var(&mut self, vars: &[Option<bool>], clause_database: &ClauseDatabase) -> VarId;
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[clap(rename_all = "kebab_case")]
pub enum HeuristicType {
    /// Scans learned clauses newest to oldest for one with an unassigned
    /// literal, breaking ties (and falling back once the scan window is
    /// exhausted) by VSIDS-style activity.
    Berkmin,
    /// Deterministic lowest-numbered-undefined-variable heuristic, used to
    /// get reproducible traces when debugging the solver itself.
    FirstUndefined,
}

impl HeuristicType {
    /// `scan_limit` bounds how many of the most recent learned clauses
    /// `Berkmin` inspects per decision (spec §4.F `BERKMIN(limit>=1)`);
    /// ignored by `FirstUndefined`.
    pub fn build(&self, num_vars: usize, scan_limit: usize) -> Box<dyn Heuristic> {
        match self {
            HeuristicType::Berkmin => Box::new(berkmin::BerkminHeuristic::new(num_vars, scan_limit)),
            HeuristicType::FirstUndefined => Box::new(first_undefined::FirstUndefinedHeuristic),
        }
    }
}
