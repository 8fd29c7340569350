use crate::cnf::{Clause, VarId};
use crate::solver::clause_database::ClauseDatabase;
use crate::solver::heuristic::Heuristic;
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;

/// Activity bump decays geometrically instead of rescaling every literal on
/// every conflict, a la Minisat's `var_inc`.
const ACTIVITY_DECAY: f64 = 0.95;
const RESCALE_THRESHOLD: f64 = 1e100;
const RESCALE_FACTOR: f64 = 1e-100;

/// Berkmin-style decision heuristic (spec §4.F): every conflict bumps the
/// activity of every literal occurring in the clause that was in conflict,
/// same as plain VSIDS, but picking the next decision first scans the
/// `scan_limit` most recently learned clauses newest-to-oldest for one with
/// an unassigned literal, and within that clause breaks ties by the highest-
/// activity candidate. Falls back to the global activity order only once
/// the scan window turns up nothing, exactly as Berkmin's stack-of-clauses
/// branching does but backed by a binary heap instead of the teacher's
/// linear order-list scan for the fallback path.
pub struct BerkminHeuristic {
    activity: Vec<f64>,
    queue: PriorityQueue<VarId, OrderedFloat<f64>>,
    bump: f64,
    scan_limit: usize,
}

impl BerkminHeuristic {
    pub fn new(num_vars: usize, scan_limit: usize) -> Self {
        let mut queue = PriorityQueue::with_capacity(num_vars);
        for var in 1..=num_vars {
            queue.push(var, OrderedFloat(1.0));
        }
        BerkminHeuristic {
            activity: vec![1.0; num_vars + 1],
            queue,
            bump: 1.0,
            scan_limit: scan_limit.max(1),
        }
    }

    fn bump_var(&mut self, var: VarId) {
        self.activity[var] += self.bump;
        if self.queue.get(&var).is_some() {
            self.queue.change_priority(&var, OrderedFloat(self.activity[var]));
        }
        if self.activity[var] > RESCALE_THRESHOLD {
            self.rescale();
        }
    }

    fn rescale(&mut self) {
        for var in 1..self.activity.len() {
            self.activity[var] *= RESCALE_FACTOR;
            if self.queue.get(&var).is_some() {
                self.queue.change_priority(&var, OrderedFloat(self.activity[var]));
            }
        }
        self.bump *= RESCALE_FACTOR;
    }

    /// The highest-activity unassigned variable occurring in `clause`, if
    /// any of its literals are still undefined.
    fn best_undefined_in(&self, clause: &Clause, vars: &[Option<bool>]) -> Option<VarId> {
        clause
            .literals
            .iter()
            .map(|lit| lit.id())
            .filter(|&var| vars[var].is_none())
            .max_by(|&a, &b| self.activity[a].partial_cmp(&self.activity[b]).unwrap())
    }
}

impl Heuristic for BerkminHeuristic {
    fn on_conflict(&mut self, conflict_clause: &Clause) {
        conflict_clause.for_each_literal(|lit| self.bump_var(lit.id()));
        self.bump /= ACTIVITY_DECAY;
    }

    fn on_unassign(&mut self, var: VarId) {
        self.queue.push(var, OrderedFloat(self.activity[var]));
    }

    fn next_decision_var(&mut self, vars: &[Option<bool>], clause_database: &ClauseDatabase) -> VarId {
        let recent: Vec<_> = clause_database.learned_clause_ids().rev().take(self.scan_limit).collect();
        for id in recent {
            if let Some(var) = self.best_undefined_in(&clause_database[id], vars) {
                return var;
            }
        }

        loop {
            let (var, _) = self.queue.pop().expect("no unassigned variable left");
            if vars[var].is_none() {
                return var;
            }
            // popped while still assigned (set by propagation, never
            // pushed back yet); simply drop it until it is unassigned.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::Literal;
    use crate::solver::deletion::DeletionPolicy;
    use crate::solver::literal_watching::LiteralWatcher;

    fn empty_database(num_vars: usize) -> ClauseDatabase {
        let mut watcher = LiteralWatcher::new(num_vars);
        ClauseDatabase::init(vec![], &mut watcher, DeletionPolicy::Aggressive)
    }

    #[test]
    fn bumped_variable_is_picked_first_once_scan_finds_nothing() {
        let mut heuristic = BerkminHeuristic::new(3, 5);
        let clause = Clause::from(vec![Literal::from(2)]);
        heuristic.on_conflict(&clause);
        heuristic.on_conflict(&clause);
        let vars = vec![None; 4];
        let db = empty_database(3);
        assert_eq!(heuristic.next_decision_var(&vars, &db), 2);
    }

    #[test]
    fn assigned_variables_are_skipped_by_the_fallback() {
        let mut heuristic = BerkminHeuristic::new(2, 5);
        let mut vars = vec![None; 3];
        vars[1] = Some(true);
        let db = empty_database(2);
        assert_eq!(heuristic.next_decision_var(&vars, &db), 2);
    }

    #[test]
    fn scan_prefers_the_newest_learned_clause_with_an_undefined_literal() {
        let mut heuristic = BerkminHeuristic::new(3, 5);
        let mut watcher = LiteralWatcher::new(3);
        let mut db = ClauseDatabase::init(vec![], &mut watcher, DeletionPolicy::Aggressive);
        db.insert(Clause::learned(vec![Literal::from(1), Literal::from(2)], 2), &mut watcher);
        db.insert(Clause::learned(vec![Literal::from(3)], 1), &mut watcher);
        let vars = vec![None; 4];
        // The newest clause (`3`) is scanned before the older one (`1 | 2`).
        assert_eq!(heuristic.next_decision_var(&vars, &db), 3);
    }

    #[test]
    fn scan_falls_back_once_the_limit_is_exhausted() {
        let mut heuristic = BerkminHeuristic::new(3, 1);
        heuristic.bump_var(2);
        let mut watcher = LiteralWatcher::new(3);
        let mut db = ClauseDatabase::init(vec![], &mut watcher, DeletionPolicy::Aggressive);
        // Only one learned clause fits the scan window and it is fully
        // assigned, so the decision must fall back to the activity queue.
        db.insert(Clause::learned(vec![Literal::from(1)], 1), &mut watcher);
        let mut vars = vec![None; 4];
        vars[1] = Some(true);
        assert_eq!(heuristic.next_decision_var(&vars, &db), 2);
    }
}
