//! MODULE E: first-UIP conflict analysis and clause learning (spec §4.E).

use crate::cnf::{Clause, ClauseId, Literal, VarId};
use crate::solver::clause_database::ClauseDatabase;
use crate::solver::trail::{AssignmentReason, Trail};
use fnv::FnvHasher;
use itertools::Itertools;
use std::collections::HashSet;
use std::hash::BuildHasherDefault;

type FastHasher = BuildHasherDefault<FnvHasher>;

#[derive(Debug, Default, Clone)]
pub struct ConflictAnalyzer;

impl ConflictAnalyzer {
    /// Resolves the conflict clause against reason clauses, walking the
    /// trail backwards, until only one literal from the current decision
    /// level remains (the first unique implication point). Returns the
    /// learned clause (UIP at position 0, asserting-level literal at
    /// position 1) and the assertion level to backjump to.
    pub fn analyze(
        &self,
        trail: &Trail,
        clause_database: &mut ClauseDatabase,
        conflict_clause_id: ClauseId,
        minimize: bool,
    ) -> (Clause, usize) {
        clause_database.bump_clause_activity(conflict_clause_id);
        let mut seed = Vec::new();
        clause_database[conflict_clause_id].for_each_literal(|lit| seed.push(lit));
        self.analyze_literals(trail, clause_database, seed, minimize)
            .expect("a BCP conflict clause always has a literal above level 0")
    }

    /// Generalizes the first-UIP walk to an arbitrary falsified clause: one
    /// that need not already live in `clause_database`, and whose highest
    /// literal level (`frontier`) need not coincide with `trail.decision_level`.
    /// A real BCP conflict always satisfies both of those, so `analyze`
    /// above is just this with `frontier == trail.decision_level` and a
    /// single-iteration head start. Spec §4.I's synthesized loop formulas
    /// satisfy neither: their antecedents can all sit below the trail's
    /// current top level, and nothing guarantees only one of them sits at
    /// their own maximum level. Resolving around `frontier` instead of the
    /// trail's top handles a tie there exactly as an ordinary conflict at
    /// that level would, instead of the caller picking one of the tied
    /// literals arbitrarily and asserting it without justification.
    ///
    /// Returns `None` if every literal of `seed_literals` is already
    /// globally falsified at level 0 — such a clause can never be satisfied
    /// again, and the caller should treat it as an unconditional conflict.
    pub fn analyze_literals(
        &self,
        trail: &Trail,
        clause_database: &mut ClauseDatabase,
        seed_literals: Vec<Literal>,
        minimize: bool,
    ) -> Option<(Clause, usize)> {
        let frontier = seed_literals
            .iter()
            .map(|lit| trail.decision_level_of(lit.id()))
            .max()
            .unwrap_or(0);

        let mut learned: Vec<Literal> = Vec::new();
        let mut count_at_frontier = 0usize;
        let mut seen: HashSet<VarId, FastHasher> = HashSet::with_hasher(FastHasher::default());

        for lit in seed_literals {
            if seen.contains(&lit.id()) || trail.decision_level_of(lit.id()) == 0 {
                continue;
            }
            seen.insert(lit.id());
            if trail.decision_level_of(lit.id()) == frontier {
                count_at_frontier += 1;
            } else {
                learned.push(lit);
            }
        }
        if count_at_frontier == 0 {
            return None;
        }

        let mut current_literal: Option<Literal> = None;
        let mut trail_position = trail.assignment_stack.len();

        while count_at_frontier > 0 {
            loop {
                trail_position -= 1;
                if seen.contains(&trail.assignment_stack[trail_position].literal.id()) {
                    break;
                }
            }
            current_literal = Some(trail.assignment_stack[trail_position].literal);
            seen.remove(&current_literal.unwrap().id());
            count_at_frontier -= 1;
            if count_at_frontier == 0 {
                break;
            }

            let reason_clause_id = match trail.assignment_stack[trail_position].reason {
                AssignmentReason::Propagated(id) => id,
                AssignmentReason::Decision => {
                    unreachable!("first-UIP search must terminate before reaching a decision")
                }
            };
            clause_database.bump_clause_activity(reason_clause_id);
            let current = current_literal.unwrap();
            clause_database[reason_clause_id].for_each_literal(|lit| {
                if lit.id() == current.id() {
                    return;
                }
                if seen.contains(&lit.id()) || trail.decision_level_of(lit.id()) == 0 {
                    return;
                }
                seen.insert(lit.id());
                if trail.decision_level_of(lit.id()) == frontier {
                    count_at_frontier += 1;
                } else {
                    learned.push(lit);
                }
            });
        }

        learned.push(-current_literal.unwrap());
        let uip_pos = learned.len() - 1;
        learned.swap(0, uip_pos);
        debug_assert_eq!(trail.decision_level_of(learned[0].id()), frontier);

        let assertion_level = learned
            .iter()
            .map(|lit| trail.decision_level_of(lit.id()))
            .sorted()
            .rev()
            .nth(1)
            .unwrap_or(0);
        debug_assert!(assertion_level < frontier);

        // The second watch must be the asserting literal, so the watches
        // stay valid the instant backjumping lands at assertion_level.
        if let Some(idx) = learned
            .iter()
            .position(|lit| trail.decision_level_of(lit.id()) == assertion_level)
        {
            learned.swap(1, idx);
        }

        if minimize {
            Self::minimize_against_reasons(&mut learned, clause_database, trail);
        }

        let lbd = learned
            .iter()
            .map(|lit| trail.decision_level_of(lit.id()))
            .collect::<HashSet<_>>()
            .len();
        Some((Clause::learned(learned, lbd), assertion_level))
    }

    /// Minisat-style self-subsumption minimization: drops a non-watched
    /// literal whose reason clause (minus its own negation) is already
    /// implied by the rest of the learned clause.
    fn minimize_against_reasons(clause: &mut Vec<Literal>, clause_database: &ClauseDatabase, trail: &Trail) {
        let clause_set: HashSet<Literal> = clause.iter().copied().collect();
        let mut redundant = Vec::new();
        for &lit in clause.iter().skip(2) {
            let reason = trail
                .assignment_stack
                .iter()
                .find(|a| a.literal == -lit)
                .map(|a| a.reason);
            if let Some(AssignmentReason::Propagated(reason_id)) = reason {
                let mut covered = true;
                clause_database[reason_id].for_each_literal(|l| {
                    if l != -lit && !clause_set.contains(&l) {
                        covered = false;
                    }
                });
                if covered {
                    redundant.push(lit);
                }
            }
        }
        clause.retain(|lit| !redundant.contains(lit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::clause_database::ClauseDatabase;
    use crate::solver::deletion::DeletionPolicy;
    use crate::solver::literal_watching::LiteralWatcher;

    /// `1` decided; `-1 | 2` and `-1 | 3` force `2` and `3`; `-2 | -3`
    /// conflicts. First-UIP analysis should resolve all the way back to the
    /// sole decision and learn its negation as a unit clause.
    #[test]
    fn analyze_learns_unit_clause_from_single_decision_conflict() {
        let clauses = vec![
            Clause::from(vec![Literal::from(-1), Literal::from(2)]),
            Clause::from(vec![Literal::from(-1), Literal::from(3)]),
            Clause::from(vec![Literal::from(-2), Literal::from(-3)]),
        ];
        let mut watcher = LiteralWatcher::new(3);
        let mut clause_database = ClauseDatabase::init(clauses, &mut watcher, DeletionPolicy::Aggressive);

        let mut trail = Trail::new(3);
        trail.decide(Literal::from(1));
        trail.propagate(Literal::from(2), 0);
        trail.propagate(Literal::from(3), 1);

        let analyzer = ConflictAnalyzer::default();
        let (learned, assertion_level) = analyzer.analyze(&trail, &mut clause_database, 2, false);
        assert_eq!(assertion_level, 0);
        assert_eq!(learned.literals, vec![Literal::from(-1)]);
    }

    /// `1` decided, forcing `3` true at the *same* level via `-1 | 3`. A
    /// loop formula `-1 | -3` then ties both its literals at that level —
    /// the case a synthesized clause can hit but a real BCP conflict never
    /// does. Resolving against `3`'s reason must still land on a single
    /// asserting literal instead of panicking or corrupting the trail.
    #[test]
    fn analyze_literals_resolves_a_tie_at_the_frontier_level() {
        let clauses = vec![Clause::from(vec![Literal::from(-1), Literal::from(3)])];
        let mut watcher = LiteralWatcher::new(3);
        let mut clause_database = ClauseDatabase::init(clauses, &mut watcher, DeletionPolicy::Aggressive);

        let mut trail = Trail::new(3);
        trail.decide(Literal::from(1));
        trail.propagate(Literal::from(3), 0);

        let analyzer = ConflictAnalyzer::default();
        let seed = vec![Literal::from(-1), Literal::from(-3)];
        let (learned, assertion_level) = analyzer
            .analyze_literals(&trail, &mut clause_database, seed, false)
            .expect("not every literal is at level 0");
        assert_eq!(assertion_level, 0);
        assert_eq!(learned.literals, vec![Literal::from(-1)]);
    }

    /// Every literal of the seed clause is a level-0 fact: the clause can
    /// never be satisfied again, so analysis reports it as such rather than
    /// scanning off the end of an empty trail.
    #[test]
    fn analyze_literals_reports_none_when_every_literal_is_at_level_zero() {
        let mut watcher = LiteralWatcher::new(2);
        let mut clause_database = ClauseDatabase::init(vec![], &mut watcher, DeletionPolicy::Aggressive);

        let mut trail = Trail::new(2);
        trail.propagate(Literal::from(1), usize::MAX);
        trail.propagate(Literal::from(2), usize::MAX);

        let analyzer = ConflictAnalyzer::default();
        let seed = vec![Literal::from(-1), Literal::from(-2)];
        assert!(analyzer
            .analyze_literals(&trail, &mut clause_database, seed, false)
            .is_none());
    }
}
