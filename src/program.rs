//! Front-end collaborator stub (spec §1, §6 "Program-structure metadata").
//!
//! The ground-program parser and simplifier are explicitly out of scope;
//! this module only gives callers (tests, the CLI, the HCC checker) the
//! narrow in-memory shape the core needs to exercise disjunctive programs:
//! rules recorded as clauses with a role tag per literal occurrence, plus
//! the SCC/HCC membership and defining-rules table spec §3 "Atom metadata"
//! describes. Full gringo-numeric-format parsing remains a Non-goal.

use crate::cnf::{Clause, Literal, LiteralRole, VarId};
use std::collections::HashMap;

pub type RuleId = usize;
pub type SccId = usize;
pub type HccId = usize;

/// One ground rule, recorded in completion-style clause form (head literals
/// positive, negative-body literals negated) plus the role each literal
/// occurrence plays. Roles live here rather than on the bare `Literal`
/// value, since one literal value can play different roles in different
/// rules (spec §4.A).
#[derive(Debug, Clone)]
pub struct Rule {
    pub clause: Clause,
    pub roles: Vec<LiteralRole>,
}

impl Rule {
    pub fn new(literals: Vec<Literal>, roles: Vec<LiteralRole>) -> Self {
        debug_assert_eq!(literals.len(), roles.len());
        Rule {
            clause: Clause::from(literals),
            roles,
        }
    }

    pub fn head_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals_with_role(LiteralRole::Head)
    }

    pub fn positive_body_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals_with_role(LiteralRole::PositiveBody)
    }

    pub fn negative_body_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.clause
            .literals
            .iter()
            .zip(&self.roles)
            .filter(|(_, role)| matches!(role, LiteralRole::NegativeBody | LiteralRole::DoubleNegativeBody))
            .map(|(&lit, _)| lit)
    }

    fn literals_with_role(&self, wanted: LiteralRole) -> impl Iterator<Item = Literal> + '_ {
        self.clause
            .literals
            .iter()
            .zip(&self.roles)
            .filter(move |(_, &role)| role == wanted)
            .map(|(&lit, _)| lit)
    }
}

/// Ground-program structure metadata (spec §6): SCC assignment, HCC
/// membership, and the per-atom defining-rules table the HCC checker
/// consults exclusively (spec §3 `definingRulesForNonHCFAtom`, kept under
/// that name for non-HCF atoms per spec §9 Open Question 2 even though this
/// core only ever reads it for HCC members).
#[derive(Debug, Default)]
pub struct Program {
    rules: Vec<Rule>,
    scc_of: HashMap<VarId, SccId>,
    hcc_of: HashMap<VarId, HccId>,
    defining_rules: HashMap<VarId, Vec<RuleId>>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a ground rule and indexes it under every atom in its head
    /// (spec §3 "Atom metadata"). Returns the rule's id.
    pub fn add_rule(&mut self, rule: Rule) -> RuleId {
        let id = self.rules.len();
        for head in rule.head_literals() {
            self.defining_rules.entry(head.id()).or_default().push(id);
        }
        self.rules.push(rule);
        id
    }

    pub fn set_scc(&mut self, var: VarId, scc: SccId) {
        self.scc_of.insert(var, scc);
    }

    pub fn set_hcc(&mut self, var: VarId, hcc: HccId) {
        self.hcc_of.insert(var, hcc);
    }

    pub fn scc_of(&self, var: VarId) -> Option<SccId> {
        self.scc_of.get(&var).copied()
    }

    pub fn hcc_of(&self, var: VarId) -> Option<HccId> {
        self.hcc_of.get(&var).copied()
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }

    pub fn defining_rules(&self, var: VarId) -> &[RuleId] {
        self.defining_rules.get(&var).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All atoms sharing the given HCC id, sorted for deterministic
    /// iteration order.
    pub fn hcc_members(&self, hcc: HccId) -> Vec<VarId> {
        let mut members: Vec<VarId> = self
            .hcc_of
            .iter()
            .filter(|&(_, &h)| h == hcc)
            .map(|(&v, _)| v)
            .collect();
        members.sort_unstable();
        members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: i32) -> Literal {
        Literal::from(v)
    }

    /// `a ∨ b ← ` with `a`, `b` mutually supporting: both heads are
    /// indexed as defining rules for their own atom.
    #[test]
    fn add_rule_indexes_every_head_atom() {
        let mut program = Program::new();
        let rule = Rule::new(vec![lit(1), lit(2)], vec![LiteralRole::Head, LiteralRole::Head]);
        let id = program.add_rule(rule);
        assert_eq!(program.defining_rules(1), &[id]);
        assert_eq!(program.defining_rules(2), &[id]);
    }

    #[test]
    fn hcc_members_collects_matching_atoms() {
        let mut program = Program::new();
        program.set_hcc(1, 0);
        program.set_hcc(2, 0);
        program.set_hcc(3, 1);
        assert_eq!(program.hcc_members(0), vec![1, 2]);
        assert_eq!(program.hcc_members(1), vec![3]);
    }
}
