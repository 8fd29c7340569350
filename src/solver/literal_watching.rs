//! MODULE D support structure: per-literal watch lists (spec §3, §4.D).

use crate::cnf::{Clause, ClauseId, Literal};

#[derive(Debug, Default, Clone)]
struct VarWatch {
    pos: Vec<ClauseId>,
    neg: Vec<ClauseId>,
}

/// Maps each literal to the clauses that currently watch it. A clause is
/// registered under exactly the two literals occupying `literals[0]` and
/// `literals[1]`; `State::assign` looks a clause up under the literal that
/// has just become false.
#[derive(Debug, Clone)]
pub struct LiteralWatcher {
    var_watches: Vec<VarWatch>,
}

impl LiteralWatcher {
    pub fn new(num_vars: usize) -> Self {
        LiteralWatcher {
            var_watches: vec![VarWatch::default(); num_vars + 1],
        }
    }

    pub fn watch(&mut self, lit: Literal, clause_id: ClauseId) {
        if lit.positive() {
            self.var_watches[lit.id()].pos.push(clause_id);
        } else {
            self.var_watches[lit.id()].neg.push(clause_id);
        }
    }

    pub fn watch_list_mut(&mut self, lit: Literal) -> &mut Vec<ClauseId> {
        if lit.positive() {
            &mut self.var_watches[lit.id()].pos
        } else {
            &mut self.var_watches[lit.id()].neg
        }
    }

    pub fn watch_list(&self, lit: Literal) -> &[ClauseId] {
        if lit.positive() {
            &self.var_watches[lit.id()].pos
        } else {
            &self.var_watches[lit.id()].neg
        }
    }

    pub fn attach_clause(&mut self, clause: &Clause, clause_id: ClauseId) {
        let (first, second) = clause.watched();
        self.watch(first, clause_id);
        self.watch(second, clause_id);
    }

    pub fn detach_clause(&mut self, clause: &Clause, clause_id: ClauseId) {
        let (first, second) = clause.watched();
        self.watch_list_mut(first).retain(|&id| id != clause_id);
        self.watch_list_mut(second).retain(|&id| id != clause_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_registers_under_both_watches() {
        let clause = Clause::with_watches(
            vec![Literal::from(1), Literal::from(2), Literal::from(3)],
            0,
            1,
        );
        let mut watcher = LiteralWatcher::new(3);
        watcher.attach_clause(&clause, 0);
        assert_eq!(watcher.watch_list(Literal::from(1)), &[0]);
        assert_eq!(watcher.watch_list(Literal::from(2)), &[0]);
        assert!(watcher.watch_list(Literal::from(3)).is_empty());
    }

    #[test]
    fn detach_removes_registration() {
        let clause = Clause::with_watches(vec![Literal::from(1), Literal::from(2)], 0, 1);
        let mut watcher = LiteralWatcher::new(2);
        watcher.attach_clause(&clause, 5);
        watcher.detach_clause(&clause, 5);
        assert!(watcher.watch_list(Literal::from(1)).is_empty());
        assert!(watcher.watch_list(Literal::from(2)).is_empty());
    }
}
