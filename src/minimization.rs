//! MODULE J: predicate-cardinality minimization drivers (spec §4.J).
//!
//! Each strategy is built entirely out of [`crate::solver::Solver`]'s
//! incremental API (`solve_under_assumptions`, `add_clause_runtime`,
//! `unroll_to_zero`): none of them reach into solver internals, matching
//! spec §6's promise that MODULE J is "just a client" of MODULE H.

use crate::cnf::{Literal, SolutionAssignment, VarId};
use crate::error::SolverResult;
use crate::solver::Solver;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab_case")]
pub enum PredicateMinimizationAlgorithm {
    /// Repeatedly blocks the current model and re-solves, keeping the
    /// smallest model seen (spec §4.J `enumerationBC`). Exhaustive but
    /// re-derives every candidate from scratch.
    Enumeration,
    /// Finds one model, then tries to shrink it by assuming each minimized
    /// atom false in turn and checking satisfiability (spec §4.J
    /// `guessAndCheck`).
    GuessAndCheck,
    /// Like `GuessAndCheck`, but iteratively tightens the bound instead of
    /// stopping at the first improvement (spec §4.J `guessAndCheckAndMinimize`).
    GuessAndCheckAndMinimize,
    /// Like `GuessAndCheckAndMinimize`, but commits to each assumption via a
    /// linear pop/backtrack scan instead of re-deriving candidates from a
    /// fresh blocking clause each round (spec §4.J `guessAndCheckAndSplit`).
    GuessAndCheckAndSplit,
    /// No minimization: a single plain `solve()` call.
    None,
}

/// Drives one of the four MODULE J strategies over `solver`, minimizing the
/// number of `atoms_to_minimize` assigned true across answer sets.
pub struct PredicateMinimizer<'a> {
    solver: &'a mut Solver,
    atoms_to_minimize: Vec<VarId>,
}

impl<'a> PredicateMinimizer<'a> {
    pub fn new(solver: &'a mut Solver, atoms_to_minimize: Vec<VarId>) -> Self {
        PredicateMinimizer { solver, atoms_to_minimize }
    }

    pub fn minimize(&mut self, algorithm: PredicateMinimizationAlgorithm) -> SolverResult<Option<SolutionAssignment>> {
        use PredicateMinimizationAlgorithm::*;

        self.solver.turn_off_simplifications();
        match algorithm {
            Enumeration => self.enumeration(),
            GuessAndCheck => self.guess_and_check(),
            GuessAndCheckAndMinimize => self.guess_and_check_and_minimize(),
            GuessAndCheckAndSplit => self.guess_and_check_and_split(),
            None => Ok(self.solver.solve()),
        }
    }

    fn count_true(&self, model: &SolutionAssignment) -> usize {
        self.atoms_to_minimize
            .iter()
            .filter(|&&v| model.get(&v).copied().unwrap_or(false))
            .count()
    }

    /// Branch-and-cut enumeration (spec §4.J `enumerationBC`): solve, block
    /// the model found, and keep re-solving until the search is exhausted or
    /// a model with zero minimized atoms true is found (can't do better).
    fn enumeration(&mut self) -> SolverResult<Option<SolutionAssignment>> {
        let mut best = match self.solver.solve() {
            Some(model) => model,
            None => return Ok(None),
        };
        let mut best_count = self.count_true(&best);

        loop {
            if best_count == 0 {
                break;
            }
            if !self.block_model(&best)? {
                break;
            }
            match self.solver.solve() {
                Some(model) => {
                    let count = self.count_true(&model);
                    if count < best_count {
                        best = model;
                        best_count = count;
                    }
                }
                None => break,
            }
        }

        Ok(Some(best))
    }

    /// Attaches a clause forbidding every minimized atom currently true in
    /// `model` from all being true simultaneously again. Must run at
    /// decision level 0, so the caller unrolls first.
    fn block_model(&mut self, model: &SolutionAssignment) -> SolverResult<bool> {
        let literals: Vec<Literal> = self
            .atoms_to_minimize
            .iter()
            .filter(|&&v| model.get(&v).copied().unwrap_or(false))
            .map(|&v| Literal::from_value(v, false))
            .collect();
        if literals.is_empty() {
            return Ok(false);
        }
        self.solver.unroll_to_zero();
        self.solver.add_clause_runtime(literals)
    }

    /// Finds one model, then verifies it is already minimal by assuming
    /// every minimized atom false and checking the result is UNSAT (spec
    /// §4.J `guessAndCheck`/`checkAnswerSet`). Re-solves under the blocking
    /// clause whenever the check fails, repeating until a verified-minimal
    /// model is found or the program becomes incoherent.
    fn guess_and_check(&mut self) -> SolverResult<Option<SolutionAssignment>> {
        let mut model = match self.solver.solve() {
            Some(model) => model,
            None => return Ok(None),
        };

        loop {
            // `check_answer_set` attaches its own blocking clause as part of
            // the check, so a verified-non-minimal model already can't recur
            // once we re-solve.
            if self.check_answer_set(&model)? {
                return Ok(Some(model));
            }
            match self.solver.solve() {
                Some(next) => model = next,
                None => return Ok(Some(model)),
            }
        }
    }

    /// Spec §4.J `checkAnswerSet`: asks whether any minimized atom currently
    /// false in `model` could flip true while every minimized atom currently
    /// true stays true — if not, `model` cannot be improved upon and is
    /// minimal. Atoms decided at level 0 are skipped: they are forced by the
    /// program itself and can never flip regardless of assumptions.
    fn check_answer_set(&mut self, model: &SolutionAssignment) -> SolverResult<bool> {
        let mut blocking_literals = Vec::new();
        let mut assumptions = Vec::new();
        for &v in &self.atoms_to_minimize {
            if self.solver.decision_level_of(v) == 0 {
                continue;
            }
            if model.get(&v).copied().unwrap_or(false) {
                blocking_literals.push(Literal::from_value(v, false));
            } else {
                // "no currently-false M-atom flips to true" is enforced by
                // holding it false as an assumption, not as a blocking
                // disjunct — the disjunction is only over true atoms
                // flipping false (spec §4.J `checkAnswerSet`).
                assumptions.push(Literal::from_value(v, false));
            }
        }

        self.solver.unroll_to_zero();
        if blocking_literals.is_empty() {
            return Ok(true);
        }
        if !self.solver.add_clause_runtime(blocking_literals)? {
            return Ok(true);
        }
        Ok(self.solver.solve_under_assumptions(&assumptions).is_none())
    }

    /// Spec §4.J `guessAndCheckAndMinimize`: finds one model, then tightens
    /// it step by step, each time forcing every previously-true minimized
    /// atom false and re-solving, stopping when no tighter model exists.
    fn guess_and_check_and_minimize(&mut self) -> SolverResult<Option<SolutionAssignment>> {
        let initial = match self.solver.solve() {
            Some(model) => model,
            None => return Ok(None),
        };
        self.minimize_answer_set(initial)
    }

    fn candidates_and_assumptions(&self, model: &SolutionAssignment) -> (Vec<VarId>, Vec<Literal>) {
        let mut candidates = Vec::new();
        let mut assumptions = Vec::new();
        for &v in &self.atoms_to_minimize {
            if self.solver.decision_level_of(v) == 0 {
                continue;
            }
            if model.get(&v).copied().unwrap_or(false) {
                candidates.push(v);
            } else {
                assumptions.push(Literal::from_value(v, false));
            }
        }
        (candidates, assumptions)
    }

    fn minimize_answer_set(&mut self, initial: SolutionAssignment) -> SolverResult<Option<SolutionAssignment>> {
        let (mut candidates, mut assumptions) = self.candidates_and_assumptions(&initial);
        let mut best = initial;

        loop {
            let blocking_literals: Vec<Literal> = candidates.iter().map(|&v| Literal::from_value(v, false)).collect();
            self.solver.unroll_to_zero();

            if blocking_literals.is_empty() {
                return Ok(Some(best));
            }
            if !self.solver.add_clause_runtime(blocking_literals)? {
                return Ok(Some(best));
            }

            match self.solver.solve_under_assumptions(&assumptions) {
                None => return Ok(Some(best)),
                Some(tightened) => {
                    let old_candidates = std::mem::take(&mut candidates);
                    for v in old_candidates {
                        if tightened.get(&v).copied().unwrap_or(false) {
                            candidates.push(v);
                        } else {
                            assumptions.push(Literal::from_value(v, false));
                        }
                    }
                    best = tightened;
                }
            }
        }
    }

    /// Spec §4.J `guessAndCheckAndSplit`: finds one model, then walks its
    /// minimized-true atoms one at a time, assuming each false in turn; a
    /// successful re-solve keeps tightening, a failed one restores that atom
    /// as a permanent assumption and moves to the next.
    fn guess_and_check_and_split(&mut self) -> SolverResult<Option<SolutionAssignment>> {
        let initial = match self.solver.solve() {
            Some(model) => model,
            None => return Ok(None),
        };
        let (mut candidates, mut assumptions) = self.candidates_and_assumptions(&initial);

        loop {
            let Some(last) = candidates.pop() else {
                self.solver.unroll_to_zero();
                return Ok(self.solver.solve_under_assumptions(&assumptions));
            };

            assumptions.push(Literal::from_value(last, false));
            self.solver.unroll_to_zero();

            match self.solver.solve_under_assumptions(&assumptions) {
                None => {
                    assumptions.pop();
                    assumptions.push(Literal::from_value(last, true));
                }
                Some(model) => {
                    let old_candidates = std::mem::take(&mut candidates);
                    for v in old_candidates {
                        if model.get(&v).copied().unwrap_or(false) {
                            candidates.push(v);
                        } else {
                            assumptions.push(Literal::from_value(v, false));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::Clause;
    use crate::solver::config::Config;

    fn lit(v: i32) -> Literal {
        Literal::from(v)
    }

    /// Exactly one of `x1, x2, x3` must be true; minimizing over all three
    /// should settle on a model with exactly one true no matter the strategy.
    fn at_least_one_clauses() -> Vec<crate::cnf::Clause> {
        vec![Clause::from(vec![lit(1), lit(2), lit(3)])]
    }

    #[test]
    fn guess_and_check_and_split_finds_single_true_model() {
        let mut solver = Solver::new(at_least_one_clauses(), 3, Config::default());
        let mut minimizer = PredicateMinimizer::new(&mut solver, vec![1, 2, 3]);
        let model = minimizer
            .minimize(PredicateMinimizationAlgorithm::GuessAndCheckAndSplit)
            .expect("minimization succeeds")
            .expect("instance is satisfiable");
        let true_count = [1, 2, 3].iter().filter(|&&v| model.get(&v).copied().unwrap_or(false)).count();
        assert_eq!(true_count, 1);
    }

    #[test]
    fn guess_and_check_and_minimize_finds_single_true_model() {
        let mut solver = Solver::new(at_least_one_clauses(), 3, Config::default());
        let mut minimizer = PredicateMinimizer::new(&mut solver, vec![1, 2, 3]);
        let model = minimizer
            .minimize(PredicateMinimizationAlgorithm::GuessAndCheckAndMinimize)
            .expect("minimization succeeds")
            .expect("instance is satisfiable");
        let true_count = [1, 2, 3].iter().filter(|&&v| model.get(&v).copied().unwrap_or(false)).count();
        assert_eq!(true_count, 1);
    }

    #[test]
    fn enumeration_finds_single_true_model() {
        let mut solver = Solver::new(at_least_one_clauses(), 3, Config::default());
        let mut minimizer = PredicateMinimizer::new(&mut solver, vec![1, 2, 3]);
        let model = minimizer
            .minimize(PredicateMinimizationAlgorithm::Enumeration)
            .expect("minimization succeeds")
            .expect("instance is satisfiable");
        let true_count = [1, 2, 3].iter().filter(|&&v| model.get(&v).copied().unwrap_or(false)).count();
        assert_eq!(true_count, 1);
    }

    #[test]
    fn no_minimization_just_solves() {
        let mut solver = Solver::new(at_least_one_clauses(), 3, Config::default());
        let mut minimizer = PredicateMinimizer::new(&mut solver, vec![1, 2, 3]);
        assert!(minimizer.minimize(PredicateMinimizationAlgorithm::None).unwrap().is_some());
    }
}
