//! MODULE D support structure: the mutable search state (spec §3).

use crate::cnf::{Clause, ClauseId, Literal, SolutionAssignment, VarId, WatchOutcome};
use crate::solver::clause_database::ClauseDatabase;
use crate::solver::deletion::DeletionPolicy;
use crate::solver::literal_watching::LiteralWatcher;
use crate::solver::statistics::Statistics;
use crate::solver::unit_propagation::UnitPropagator;
use rand::Rng;

#[derive(Clone)]
pub struct State {
    pub vars: Vec<Option<bool>>,
    /// Last polarity a variable held before being unassigned, consulted by
    /// the solver façade for phase-saving (spec §4.F).
    pub var_phases: Vec<bool>,
    pub num_vars: usize,
    pub clause_database: ClauseDatabase,
    pub literal_watcher: LiteralWatcher,
    pub conflict_clause_id: Option<ClauseId>,
    pub stats: Statistics,
}

impl State {
    /// Removes tautological clauses, randomizes watch positions for every
    /// non-unit clause (spec §4.B "Randomized initial watch positions"),
    /// and attaches every remaining clause to its watch lists.
    pub fn init(clauses: Vec<Clause>, num_vars: usize, deletion_policy: DeletionPolicy, rng: &mut impl Rng) -> Self {
        let relevant: Vec<Clause> = clauses
            .into_iter()
            .filter(|clause| !clause.literals.iter().any(|lit| clause.literals.contains(&-*lit)))
            .collect();

        let attached: Vec<Clause> = relevant
            .into_iter()
            .map(|clause| {
                if clause.len() < 2 {
                    clause
                } else {
                    Clause::new(clause.literals, rng)
                }
            })
            .collect();

        let mut literal_watcher = LiteralWatcher::new(num_vars);
        let stats = Statistics::new(attached.len(), num_vars);
        let clause_database = ClauseDatabase::init(attached, &mut literal_watcher, deletion_policy);

        State {
            vars: vec![None; num_vars + 1],
            var_phases: vec![true; num_vars + 1],
            num_vars,
            clause_database,
            literal_watcher,
            conflict_clause_id: None,
            stats,
        }
    }

    pub fn is_true(&self, lit: Literal) -> bool {
        self.vars[lit.id()] == Some(lit.positive())
    }

    pub fn is_false(&self, lit: Literal) -> bool {
        self.vars[lit.id()] == Some(!lit.positive())
    }

    /// Assigns `literal` true, then walks every clause watching `-literal`
    /// and updates its watch per spec §4.D, queuing units and recording
    /// the first conflict found. Clauses discovered after a conflict are
    /// re-registered unchanged so the watch-list invariant survives the
    /// return to `Some(-literal)`'s watch list intact for the next call.
    pub fn assign(&mut self, literal: Literal, unit_propagator: &mut UnitPropagator) {
        debug_assert!(
            self.vars[literal.id()].is_none(),
            "variable {} is already assigned",
            literal.id()
        );
        self.vars[literal.id()] = Some(literal.positive());
        self.var_phases[literal.id()] = literal.positive();
        self.stats.num_assignments += 1;

        let falsified = -literal;
        let affected = std::mem::take(self.literal_watcher.watch_list_mut(falsified));
        for clause_id in affected {
            if self.conflict_clause_id.is_some() {
                self.literal_watcher.watch(falsified, clause_id);
                continue;
            }

            let vars = &self.vars;
            let outcome = self.clause_database[clause_id].on_literal_false(
                falsified,
                |lit| vars[lit.id()] == Some(lit.positive()),
                |lit| vars[lit.id()] == Some(!lit.positive()),
            );

            match outcome {
                WatchOutcome::FoundNewWatch => {
                    let new_watch = self.clause_database[clause_id].watched().1;
                    self.literal_watcher.watch(new_watch, clause_id);
                }
                WatchOutcome::AlreadySatisfied => {
                    self.literal_watcher.watch(falsified, clause_id);
                }
                WatchOutcome::Unit => {
                    self.literal_watcher.watch(falsified, clause_id);
                    let unit_literal = self.clause_database[clause_id].watched().0;
                    unit_propagator.enqueue(unit_literal, clause_id);
                }
                WatchOutcome::Conflict => {
                    self.literal_watcher.watch(falsified, clause_id);
                    self.conflict_clause_id = Some(clause_id);
                    self.stats.num_conflicts += 1;
                }
            }
        }
    }

    pub fn unassign(&mut self, var: VarId) {
        self.vars[var] = None;
    }

    pub fn is_fully_satisfied(&self) -> bool {
        self.clause_database
            .input_clause_ids()
            .all(|id| self.clause_database[id].is_satisfied(|lit| self.is_true(lit)))
    }

    pub fn assignment(&self) -> SolutionAssignment {
        self.vars
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(id, value)| value.map(|v| (id, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::Clause;
    use rand::SeedableRng;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(1)
    }

    #[test]
    fn assign_propagates_unit() {
        let clauses = vec![
            Clause::from(vec![Literal::from(1), Literal::from(2), Literal::from(3)]),
            Clause::from(vec![Literal::from(-1), Literal::from(-2), Literal::from(3)]),
        ];
        let mut state = State::init(clauses, 3, DeletionPolicy::Aggressive, &mut rng());
        let mut unit_propagator = UnitPropagator::default();
        state.assign(Literal::from(1), &mut unit_propagator);
        state.assign(Literal::from(2), &mut unit_propagator);
        assert!(state.conflict_clause_id.is_none());
    }

    #[test]
    fn assign_detects_conflict() {
        let clauses = vec![
            Clause::from(vec![Literal::from(1), Literal::from(2)]),
            Clause::from(vec![Literal::from(-1), Literal::from(-2)]),
        ];
        let mut state = State::init(clauses, 2, DeletionPolicy::Aggressive, &mut rng());
        let mut unit_propagator = UnitPropagator::default();
        state.assign(Literal::from(1), &mut unit_propagator);
        state.assign(Literal::from(2), &mut unit_propagator);
        assert!(state.conflict_clause_id.is_some());
    }
}
