//! MODULE H: the solver façade and its incremental API (spec §4.H, §6).

pub mod clause_database;
mod clause_learning;
pub mod config;
pub mod deletion;
pub mod heuristic;
pub mod literal_watching;
pub mod restarts;
pub mod state;
pub mod statistics;
pub mod trail;
mod unit_propagation;

use crate::cnf::{Clause, ClauseId, Literal, Solution, VarId};
use crate::error::{SolverError, SolverResult};
use crate::hcc::HccComponent;
use crate::program::Program;
use crate::solver::clause_learning::ConflictAnalyzer;
use crate::solver::config::Config;
use crate::solver::heuristic::Heuristic;
use crate::solver::state::State;
use crate::solver::statistics::Statistics;
use crate::solver::trail::Trail;
use crate::solver::unit_propagation::UnitPropagator;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

/// The CDCL search engine. Owns a single CNF/ASP-completion instance for
/// its lifetime; repeated calls to [`Solver::solve_under_assumptions`] reuse
/// all learned clauses across calls, which is what makes the predicate
/// minimization driver (MODULE J) and the HCC checker (MODULE I) cheap to
/// run incrementally instead of rebuilding a solver per query.
pub struct Solver {
    config: Config,
    state: State,
    trail: Trail,
    unit_propagator: UnitPropagator,
    heuristic: Box<dyn Heuristic>,
    conflict_analyzer: ConflictAnalyzer,
    restarter: restarts::Restarter,
    rng: StdRng,
}

impl Solver {
    pub fn new(clauses: Vec<Clause>, num_vars: usize, config: Config) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let state = State::init(clauses, num_vars, config.deletion_policy, &mut rng);
        let heuristic = config.heuristic.build(num_vars, config.berkmin_scan_limit);
        let restarter = restarts::Restarter::new(config.restart_policy);
        Solver {
            trail: Trail::new(state.num_vars),
            state,
            unit_propagator: UnitPropagator::default(),
            heuristic,
            conflict_analyzer: ConflictAnalyzer::default(),
            restarter,
            rng,
            config,
        }
    }

    /// Plain, non-incremental entry point: equivalent to
    /// `solve_under_assumptions(&[])`.
    pub fn solve(&mut self) -> Solution {
        self.solve_under_assumptions(&[])
    }

    /// Like [`Solver::solve_under_assumptions`], but every candidate model
    /// is additionally checked against `components` (MODULE I, spec §4.I)
    /// before being accepted: each head-cycle-free component's inner
    /// checker is asked whether a disjunctive unfounded set exists for the
    /// candidate. If one does, its loop formula is synthesized and attached
    /// exactly as a learned clause would be, and search resumes instead of
    /// returning. Mirrors the pseudocode in spec §4.H.
    pub fn solve_with_program(&mut self, program: &Program, components: &[HccComponent], assumptions: &[Literal]) -> Solution {
        self.state.stats.start_timing();

        if self.is_trivially_unsat() {
            self.state.stats.stop_timing();
            return None;
        }

        self.enqueue_input_units();
        self.unit_propagator.propagate(&mut self.state, &mut self.trail);
        if self.state.conflict_clause_id.is_some() {
            self.state.stats.stop_timing();
            return None;
        }

        if !self.assign_assumptions(assumptions) {
            self.state.stats.stop_timing();
            return None;
        }

        loop {
            self.unit_propagator.propagate(&mut self.state, &mut self.trail);

            if let Some(conflict_clause_id) = self.state.conflict_clause_id {
                if self.trail.decision_level == 0 {
                    break;
                }
                self.state.clause_database.on_conflict();
                if self
                    .state
                    .clause_database
                    .maybe_delete_learned(&mut self.state.literal_watcher, &self.trail)
                {
                    self.state.stats.num_deletions += 1;
                }

                let (learned_clause, assertion_level) = self.conflict_analyzer.analyze(
                    &self.trail,
                    &mut self.state.clause_database,
                    conflict_clause_id,
                    self.config.minimize_learned_clauses,
                );
                self.restarter
                    .on_conflict(learned_clause.lbd.unwrap(), self.trail.assignment_stack.len());
                self.heuristic.on_conflict(&self.state.clause_database[conflict_clause_id]);

                let uip = learned_clause.literals[0];
                let learned_clause_id = self
                    .state
                    .clause_database
                    .insert(learned_clause, &mut self.state.literal_watcher);

                self.backjump_to(assertion_level);
                self.state.conflict_clause_id = None;
                self.unit_propagator.enqueue(uip, learned_clause_id);
            } else if self.state.is_fully_satisfied() {
                match self.find_any_unfounded_set(program, components) {
                    Some((component, unfounded_set)) => {
                        let loop_formula = crate::hcc::compute_loop_formula(component, program, self, &unfounded_set);
                        info!("disjunctive unfounded set found in component {}, learning loop formula", component.id);
                        if !self.incorporate_loop_formula(loop_formula) {
                            self.state.stats.stop_timing();
                            info!("loop formula is unsatisfiable at decision level 0, program is incoherent");
                            return None;
                        }
                    }
                    None => {
                        self.state.stats.stop_timing();
                        info!("model found and approved by the HCC checker after {} decisions", self.state.stats.num_decisions);
                        return Some(self.state.assignment());
                    }
                }
            } else if self.restarter.due() {
                self.state.stats.num_restarts += 1;
                self.state.clause_database.on_restart();
                self.backjump_to(0);
                self.unit_propagator.drain_queue();
                if !self.assign_assumptions(assumptions) {
                    self.state.stats.stop_timing();
                    return None;
                }
            } else {
                let var = self.heuristic.next_decision_var(&self.state.vars, &self.state.clause_database);
                let literal = Literal::from_value(var, self.state.var_phases[var]);
                self.trail.decide(literal);
                self.state.assign(literal, &mut self.unit_propagator);
                self.state.stats.num_decisions += 1;
            }
        }

        self.state.stats.stop_timing();
        info!("program is incoherent under the given assumptions");
        None
    }

    /// Runs every component's checker against the current (fully assigned)
    /// candidate, returning the first one with a non-empty unfounded set.
    /// Spec §4.I does not mandate an order; components are tried in the
    /// order given.
    fn find_any_unfounded_set<'a>(&self, program: &Program, components: &'a [HccComponent]) -> Option<(&'a HccComponent, Vec<VarId>)> {
        components
            .iter()
            .find_map(|component| crate::hcc::find_unfounded_set(component, program, self).map(|set| (component, set)))
    }

    /// Attaches `literals` as a clause and asserts it exactly as the main
    /// loop does for a freshly learned clause (spec §4.I: "the outer solver
    /// attaches and propagates it, which will invalidate the candidate").
    /// Unlike [`Solver::add_clause_runtime`] this does not require decision
    /// level 0: a loop formula is discovered only once every variable is
    /// assigned, so its literals carry real decision levels that dictate
    /// the backjump target, just like first-UIP analysis.
    ///
    /// A loop formula is synthesized directly from the candidate model
    /// rather than produced by resolving a chain of BCP reasons, so nothing
    /// guarantees it has a single literal at its highest decision level the
    /// way a real conflict clause does. Feeding it through the same
    /// resolution-based search [`clause_learning::ConflictAnalyzer`] uses
    /// for ordinary conflicts — anchored at the formula's own highest level
    /// rather than the trail's current one — establishes that uniqueness
    /// before any backjump happens, instead of assuming it already holds.
    /// Returns `false` when the formula resolves all the way down to
    /// decision level 0, meaning the program is incoherent.
    pub fn incorporate_loop_formula(&mut self, literals: Vec<Literal>) -> bool {
        debug_assert!(!literals.is_empty(), "loop formula must not be empty");

        let Some((learned_clause, assertion_level)) = self.conflict_analyzer.analyze_literals(
            &self.trail,
            &mut self.state.clause_database,
            literals,
            self.config.minimize_learned_clauses,
        ) else {
            return false;
        };

        let asserted = learned_clause.literals[0];
        self.backjump_to(assertion_level);
        let clause_id = self
            .state
            .clause_database
            .insert(learned_clause, &mut self.state.literal_watcher);
        self.unit_propagator.enqueue(asserted, clause_id);
        true
    }

    /// Runs CDCL search with `assumptions` held fixed as the bottom of the
    /// trail (spec §6). On `None` (UNSAT, possibly only under these
    /// assumptions) or before reusing the solver with a different
    /// assumption set, callers should call [`Solver::unroll_to_zero`].
    pub fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> Solution {
        self.state.stats.start_timing();

        if self.is_trivially_unsat() {
            self.state.stats.stop_timing();
            return None;
        }

        self.enqueue_input_units();
        self.unit_propagator.propagate(&mut self.state, &mut self.trail);
        if self.state.conflict_clause_id.is_some() {
            self.state.stats.stop_timing();
            return None;
        }

        if !self.assign_assumptions(assumptions) {
            self.state.stats.stop_timing();
            return None;
        }

        loop {
            self.unit_propagator.propagate(&mut self.state, &mut self.trail);

            if let Some(conflict_clause_id) = self.state.conflict_clause_id {
                if self.trail.decision_level == 0 {
                    break;
                }
                self.state.clause_database.on_conflict();
                if self
                    .state
                    .clause_database
                    .maybe_delete_learned(&mut self.state.literal_watcher, &self.trail)
                {
                    self.state.stats.num_deletions += 1;
                }

                let (learned_clause, assertion_level) = self.conflict_analyzer.analyze(
                    &self.trail,
                    &mut self.state.clause_database,
                    conflict_clause_id,
                    self.config.minimize_learned_clauses,
                );
                debug!("learned clause with lbd {:?}: {}", learned_clause.lbd, learned_clause);

                self.restarter
                    .on_conflict(learned_clause.lbd.unwrap(), self.trail.assignment_stack.len());
                self.heuristic.on_conflict(&self.state.clause_database[conflict_clause_id]);

                let uip = learned_clause.literals[0];
                let learned_clause_id = self
                    .state
                    .clause_database
                    .insert(learned_clause, &mut self.state.literal_watcher);

                self.backjump_to(assertion_level);
                self.state.conflict_clause_id = None;
                self.unit_propagator.enqueue(uip, learned_clause_id);
            } else if self.state.is_fully_satisfied() {
                self.state.stats.stop_timing();
                info!("model found after {} decisions", self.state.stats.num_decisions);
                return Some(self.state.assignment());
            } else if self.restarter.due() {
                self.state.stats.num_restarts += 1;
                self.state.clause_database.on_restart();
                self.backjump_to(0);
                self.unit_propagator.drain_queue();
                if !self.assign_assumptions(assumptions) {
                    self.state.stats.stop_timing();
                    return None;
                }
            } else {
                let var = self.heuristic.next_decision_var(&self.state.vars, &self.state.clause_database);
                let literal = Literal::from_value(var, self.state.var_phases[var]);
                self.trail.decide(literal);
                self.state.assign(literal, &mut self.unit_propagator);
                self.state.stats.num_decisions += 1;
            }
        }

        self.state.stats.stop_timing();
        info!("program is incoherent under the given assumptions");
        None
    }

    /// Undoes every assignment, returning the solver to decision level 0
    /// with an empty propagation queue and no pending conflict. Required
    /// before reusing the solver with a different assumption set (spec §6
    /// incremental API contract).
    pub fn unroll_to_zero(&mut self) {
        self.backjump_to(0);
        self.unit_propagator.drain_queue();
        self.clear_conflict_status();
    }

    /// Clears a pending conflict without touching the trail. Exists for
    /// callers (the HCC checker, the predicate minimizer) that detect
    /// their own notion of "done" before the main loop would have noticed.
    pub fn clear_conflict_status(&mut self) {
        self.state.conflict_clause_id = None;
    }

    /// Disables learned-clause minimization for the remainder of this
    /// solver's lifetime. The predicate-minimization driver calls this
    /// before adding blocking clauses under assumptions it does not want
    /// touched by self-subsumption (spec §6, §9).
    pub fn turn_off_simplifications(&mut self) {
        self.config.minimize_learned_clauses = false;
    }

    /// Attaches a clause outside of initial construction (spec §6). Must
    /// be called at decision level 0: the HCC checker and predicate
    /// minimizer only ever add clauses between searches, never mid-conflict.
    /// Returns whether the clause had any effect (`false` if it was already
    /// satisfied and thus a no-op).
    pub fn add_clause_runtime(&mut self, literals: Vec<Literal>) -> SolverResult<bool> {
        if self.trail.decision_level != 0 {
            return Err(SolverError::IncrementalApiMisuse(
                "add_clause_runtime called at non-zero decision level".to_string(),
            ));
        }
        if literals.is_empty() {
            return Err(SolverError::EmptyClause);
        }

        let already_satisfied = literals.iter().any(|&lit| self.state.is_true(lit));
        let mut clause = if literals.len() >= 2 {
            Clause::new(literals, &mut self.rng)
        } else {
            Clause::from(literals)
        };
        // Clauses committed through the incremental API are never eligible
        // for the deletion sweep: the caller (HCC checker, predicate
        // minimizer) relies on them staying attached for the rest of the
        // solver's lifetime (spec §6).
        clause.can_be_deleted = false;
        let is_unit = clause.len() == 1;
        let unit_literal = clause.literals[0];

        let clause_id = self
            .state
            .clause_database
            .insert(clause, &mut self.state.literal_watcher);

        if is_unit && !already_satisfied {
            self.unit_propagator.enqueue(unit_literal, clause_id);
        }

        Ok(!already_satisfied)
    }

    pub fn stats(&self) -> &Statistics {
        &self.state.stats
    }

    pub fn clause_database(&self) -> &clause_database::ClauseDatabase {
        &self.state.clause_database
    }

    /// Whether `lit` is currently assigned true. Consulted by the HCC
    /// checker (spec §4.I) to read the candidate model without exposing
    /// `State` itself.
    pub fn is_true(&self, lit: Literal) -> bool {
        self.state.is_true(lit)
    }

    pub fn is_false(&self, lit: Literal) -> bool {
        self.state.is_false(lit)
    }

    pub fn is_undefined(&self, lit: Literal) -> bool {
        !self.state.is_true(lit) && !self.state.is_false(lit)
    }

    /// The decision level at which `var`'s current value was assigned, or
    /// `0` if it is unassigned (spec §4.I's loop-formula synthesis reads
    /// this to find the "most recently supported" literal per rule).
    pub fn decision_level_of(&self, var: VarId) -> usize {
        self.trail.decision_level_of(var)
    }

    pub fn num_vars(&self) -> usize {
        self.state.num_vars
    }

    /// Decides every assumption in turn, propagating after each one.
    /// Returns `false` if any assumption is already false or leads to an
    /// immediate conflict (assumptions are never themselves resolved over
    /// — an UNSAT-under-assumptions result carries no explanatory clause,
    /// matching spec §6's narrower incremental contract).
    fn assign_assumptions(&mut self, assumptions: &[Literal]) -> bool {
        for &literal in assumptions {
            if self.state.is_true(literal) {
                continue;
            }
            if self.state.is_false(literal) {
                return false;
            }
            self.trail.decide(literal);
            self.state.assign(literal, &mut self.unit_propagator);
            self.unit_propagator.propagate(&mut self.state, &mut self.trail);
            if self.state.conflict_clause_id.is_some() {
                return false;
            }
        }
        true
    }

    fn backjump_to(&mut self, target_level: usize) {
        for assignment in self.trail.undo_to(target_level) {
            self.state.unassign(assignment.literal.id());
            self.heuristic.on_unassign(assignment.literal.id());
        }
    }

    fn is_trivially_unsat(&self) -> bool {
        if self
            .state
            .clause_database
            .input_clause_ids()
            .any(|id| self.state.clause_database[id].is_empty())
        {
            return true;
        }

        let mut positive = HashSet::new();
        let mut negative = HashSet::new();
        for id in self.state.clause_database.input_clause_ids() {
            let clause = &self.state.clause_database[id];
            if clause.len() == 1 {
                let lit = clause.literals[0];
                if lit.positive() {
                    positive.insert(lit.id());
                } else {
                    negative.insert(lit.id());
                }
            }
        }
        positive.intersection(&negative).next().is_some()
    }

    fn enqueue_input_units(&mut self) {
        let unit_clause_ids: Vec<ClauseId> = self
            .state
            .clause_database
            .input_clause_ids()
            .filter(|&id| self.state.clause_database[id].len() == 1)
            .collect();
        for id in unit_clause_ids {
            let literal = self.state.clause_database[id].literals[0];
            self.unit_propagator.enqueue(literal, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::check_assignment;

    fn literals(values: &[i32]) -> Vec<Literal> {
        values.iter().map(|&v| Literal::from(v)).collect()
    }

    #[test]
    fn solves_satisfiable_instance() {
        let clauses = vec![
            Clause::from(literals(&[1, 2, 3])),
            Clause::from(literals(&[-1, -2])),
            Clause::from(literals(&[-2, -3])),
        ];
        let mut solver = Solver::new(clauses.clone(), 3, Config::default());
        let solution = solver.solve();
        let assignment = solution.expect("instance is satisfiable");
        assert!(check_assignment(&clauses, &assignment));
    }

    #[test]
    fn detects_unsatisfiable_instance() {
        let clauses = vec![
            Clause::from(literals(&[1])),
            Clause::from(literals(&[-1])),
        ];
        let mut solver = Solver::new(clauses, 1, Config::default());
        assert!(solver.solve().is_none());
    }

    #[test]
    fn incremental_assumptions_do_not_corrupt_later_calls() {
        let clauses = vec![Clause::from(literals(&[1, 2]))];
        let mut solver = Solver::new(clauses, 2, Config::default());
        assert!(solver.solve_under_assumptions(&[Literal::from(-1)]).is_some());
        solver.unroll_to_zero();
        assert!(solver.solve_under_assumptions(&[Literal::from(-2)]).is_some());
    }
}
