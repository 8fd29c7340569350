use crate::cnf::{Clause, VarId};
use crate::solver::clause_database::ClauseDatabase;
use crate::solver::heuristic::Heuristic;

/// Deterministic heuristic that always picks the lowest-numbered unassigned
/// variable. Carries no state, so solver traces are fully reproducible
/// independent of conflict history — useful when debugging the CORE itself
/// rather than tuning search performance.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstUndefinedHeuristic;

impl Heuristic for FirstUndefinedHeuristic {
    fn on_conflict(&mut self, _conflict_clause: &Clause) {}

    fn on_unassign(&mut self, _var: VarId) {}

    fn next_decision_var(&mut self, vars: &[Option<bool>], _clause_database: &ClauseDatabase) -> VarId {
        vars.iter()
            .enumerate()
            .skip(1)
            .find(|(_, value)| value.is_none())
            .map(|(var, _)| var)
            .expect("no unassigned variable left")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::deletion::DeletionPolicy;
    use crate::solver::literal_watching::LiteralWatcher;

    #[test]
    fn picks_lowest_unassigned() {
        let mut heuristic = FirstUndefinedHeuristic;
        let vars = vec![None, Some(true), None, None];
        let mut watcher = LiteralWatcher::new(3);
        let db = ClauseDatabase::init(vec![], &mut watcher, DeletionPolicy::Aggressive);
        assert_eq!(heuristic.next_decision_var(&vars, &db), 2);
    }
}
