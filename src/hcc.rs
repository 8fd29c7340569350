//! MODULE I: the disjunctive head-cycle-free unfounded-set checker (spec §4.I).
//!
//! A component is checked by reducing "does an unfounded set exist for the
//! current candidate" to a small inner SAT instance: one checker variable
//! `u_v` per component atom, meaning "`v` belongs to the unfounded set being
//! searched for". A rule can no longer support `v` from outside the
//! candidate, so it is only consulted for the externally-provided literals it
//! still needs (spec §4.I "reduct"); any internal positive-body atom it still
//! needs must itself be unfounded, which is exactly the implication the
//! checker clause encodes.

use crate::cnf::{Clause, Literal, VarId};
use crate::program::{HccId, Program, Rule};
use crate::solver::config::Config;
use crate::solver::Solver;
use std::collections::HashSet;

pub struct HccComponent {
    pub id: HccId,
    pub variables: Vec<VarId>,
    member_set: HashSet<VarId>,
}

impl HccComponent {
    pub fn new(id: HccId, variables: Vec<VarId>) -> Self {
        let member_set = variables.iter().copied().collect();
        HccComponent { id, variables, member_set }
    }

    pub fn contains(&self, var: VarId) -> bool {
        self.member_set.contains(&var)
    }
}

/// Spec §4.I: does a non-empty unfounded set exist within `component` for
/// the candidate `solver` currently holds? Builds a throwaway inner checker
/// instance per call rather than keeping the original's persistent
/// incremental trail alive across outer backtracks (see `DESIGN.md`), since
/// the outer solver already re-derives the candidate from scratch on every
/// call anyway.
pub fn find_unfounded_set(component: &HccComponent, program: &Program, solver: &Solver) -> Option<Vec<VarId>> {
    let true_members: Vec<VarId> = component
        .variables
        .iter()
        .copied()
        .filter(|&v| solver.is_true(Literal::from_value(v, true)))
        .collect();
    if true_members.is_empty() {
        return None;
    }

    let mut checker_clauses: Vec<Clause> = Vec::new();

    for &v in &true_members {
        for &rule_id in program.defining_rules(v) {
            let rule = program.rule(rule_id);
            if !externals_ok(rule, v, solver) {
                continue;
            }
            let internal_pos: Vec<Literal> = rule
                .positive_body_literals()
                .filter(|lit| component.contains(lit.id()))
                .map(|lit| Literal::from_value(lit.id(), true))
                .collect();
            let not_u_v = Literal::from_value(v, false);
            if internal_pos.is_empty() {
                // Unconditional external support: `v` can never be unfounded.
                checker_clauses.push(Clause::from(vec![not_u_v]));
            } else {
                let mut literals = vec![not_u_v];
                literals.extend(internal_pos);
                checker_clauses.push(Clause::from(literals));
            }
        }
    }

    for &v in &component.variables {
        if !solver.is_true(Literal::from_value(v, true)) {
            checker_clauses.push(Clause::from(vec![Literal::from_value(v, false)]));
        }
    }

    let forcing: Vec<Literal> = true_members.iter().map(|&v| Literal::from_value(v, true)).collect();
    checker_clauses.push(Clause::from(forcing));

    let max_var = component.variables.iter().copied().max().unwrap_or(0);
    let mut checker = Solver::new(checker_clauses, max_var, Config::default());
    let solution = checker.solve()?;

    let unfounded: Vec<VarId> = component
        .variables
        .iter()
        .copied()
        .filter(|v| solution.get(v).copied().unwrap_or(false))
        .collect();
    if unfounded.is_empty() {
        None
    } else {
        Some(unfounded)
    }
}

/// Spec §4.I loop-formula synthesis: for every atom in the unfounded set,
/// assert its negation, plus — for every rule that could still have defined
/// it — one antecedent literal whose falsity would have been enough to deny
/// that rule's support. Mirrors the original's `computeReasonForUnfoundedAtom`
/// literally rather than the simplified priority-order prose in spec §4.I
/// (see `DESIGN.md`): a true literal at a lower decision level than any
/// undefined candidate unconditionally overwrites it, since the scan tracks
/// a running minimum initialized to "infinite".
pub fn compute_loop_formula(component: &HccComponent, program: &Program, solver: &Solver, unfounded_set: &[VarId]) -> Vec<Literal> {
    let unfounded: HashSet<VarId> = unfounded_set.iter().copied().collect();
    let mut antecedents: Vec<Literal> = Vec::new();

    for &v in unfounded_set {
        antecedents.push(Literal::from_value(v, false));

        for &rule_id in program.defining_rules(v) {
            let rule = program.rule(rule_id);
            if let Some(lit) = reason_for_rule(component, solver, rule, &unfounded) {
                antecedents.push(-lit);
            }
        }
    }

    antecedents.sort_unstable();
    antecedents.dedup();
    antecedents
}

/// Picks the single literal whose falsity would deny `rule` as a source of
/// support for the unfounded set, or `None` if the rule cannot contribute
/// one (either an internal positive-body atom is itself unfounded, making
/// the rule irrelevant, or every external literal is true at decision level
/// 0, meaning the rule can never be denied and the loop formula must omit
/// it rather than assert something always-true).
fn reason_for_rule(component: &HccComponent, solver: &Solver, rule: &Rule, unfounded: &HashSet<VarId>) -> Option<Literal> {
    let mut min_level = usize::MAX;
    let mut chosen: Option<Literal> = None;

    for (&lit, &role) in rule.clause.literals.iter().zip(&rule.roles) {
        use crate::cnf::LiteralRole::*;

        if unfounded.contains(&lit.id()) {
            match role {
                Head => continue,
                PositiveBody => return None,
                NegativeBody | DoubleNegativeBody => {}
            }
        }

        if solver.is_undefined(lit) && program.hcc_of(lit.id()) == Some(component.id) && matches!(role, NegativeBody | Head) {
            if chosen.is_none() {
                chosen = Some(lit);
            }
            continue;
        }

        if !solver.is_true(lit) {
            continue;
        }

        let level = solver.decision_level_of(lit.id());
        if level == 0 {
            return None;
        }
        if level < min_level {
            min_level = level;
            chosen = Some(lit);
        }
    }

    chosen
}

fn externals_ok(rule: &Rule, head_var: VarId, solver: &Solver) -> bool {
    // Negative-body literals are stored already negated (`program.rs`), so a
    // stored literal evaluating true is exactly the "not x" condition holding.
    if rule.negative_body_literals().any(|lit| !solver.is_true(lit)) {
        return false;
    }
    if rule.positive_body_literals().any(|lit| !solver.is_true(lit)) {
        return false;
    }
    if rule.head_literals().any(|lit| lit.id() != head_var && !solver.is_false(lit)) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::LiteralRole;
    use crate::program::Rule;

    fn lit(v: i32) -> Literal {
        Literal::from(v)
    }

    /// `a <- not b.` and `b <- not a.`, with both true in the candidate —
    /// impossible for a normal program, but enough to exercise a component
    /// with no internal positive support: no rule can ever be unfounded,
    /// so the checker should report no unfounded set for either.
    #[test]
    fn no_unfounded_set_when_every_atom_has_unconditional_reason() {
        let mut program = Program::new();
        program.add_rule(Rule::new(vec![lit(1), lit(-2)], vec![LiteralRole::Head, LiteralRole::NegativeBody]));
        program.set_hcc(1, 0);
        program.set_hcc(2, 0);

        let component = HccComponent::new(0, vec![1, 2]);
        let clauses = vec![Clause::from(vec![lit(1)]), Clause::from(vec![lit(-2)])];
        let mut solver = Solver::new(clauses, 2, Config::default());
        solver.solve();

        assert!(find_unfounded_set(&component, &program, &solver).is_none());
    }

    /// `a <- a.` with `a` true and no other support: the only rule defining
    /// `a` needs `a` itself internally, so `{a}` is unfounded.
    #[test]
    fn self_supporting_atom_is_unfounded() {
        let mut program = Program::new();
        program.add_rule(Rule::new(vec![lit(1), lit(1)], vec![LiteralRole::Head, LiteralRole::PositiveBody]));
        program.set_hcc(1, 0);

        let component = HccComponent::new(0, vec![1]);
        let clauses = vec![Clause::from(vec![lit(1)])];
        let mut solver = Solver::new(clauses, 1, Config::default());
        solver.solve();

        let unfounded = find_unfounded_set(&component, &program, &solver).expect("a is self-supporting");
        assert_eq!(unfounded, vec![1]);

        let formula = compute_loop_formula(&component, &program, &solver, &unfounded);
        assert!(formula.contains(&lit(-1)));
    }
}
