//! MODULE B support structure: the clause arena (spec §3, §9 "Design Notes" —
//! clauses are owned by index, not by pointer).

use crate::cnf::{Clause, ClauseId};
use crate::solver::deletion::DeletionPolicy;
use crate::solver::literal_watching::LiteralWatcher;
use crate::solver::trail::{AssignmentReason, Trail};
use std::ops::{Index, IndexMut};

/// Activity bump decays geometrically instead of rescaling every learned
/// clause on every conflict (spec §4.G), the same incremental trick the
/// Berkmin heuristic uses for variable activity.
const CLAUSE_ACTIVITY_DECAY: f64 = 0.999;
const RESCALE_THRESHOLD: f64 = 1e100;
const RESCALE_FACTOR: f64 = 1e-100;

/// An arena of clauses addressed by `ClauseId`. Deleted slots are tracked in
/// `free_ids` and reused by later inserts rather than shrinking the backing
/// `Vec`, so no `ClauseId` issued while a clause is live is ever reused out
/// from under it.
#[derive(Clone)]
pub struct ClauseDatabase {
    clauses: Vec<Clause>,
    free_ids: Vec<ClauseId>,
    first_learned_id: ClauseId,
    deletion_policy: DeletionPolicy,
    /// Grows after every sweep for `Aggressive`/`MinisatStyle` (spec §4.G
    /// "growing limit" / "grow allowed count geometrically"); unused by
    /// `RestartBased`.
    deletion_limit: f64,
    restarts_since_deletion: usize,
    num_sweeps: usize,
    clause_bump: f64,
}

impl ClauseDatabase {
    /// Takes ownership of the input clauses, attaches watches for every
    /// non-unit clause, and becomes the sole owner of clause storage from
    /// this point on.
    pub fn init(clauses: Vec<Clause>, literal_watcher: &mut LiteralWatcher, deletion_policy: DeletionPolicy) -> Self {
        for (id, clause) in clauses.iter().enumerate() {
            if clause.len() >= 2 {
                literal_watcher.attach_clause(clause, id);
            }
        }
        ClauseDatabase {
            first_learned_id: clauses.len(),
            clauses,
            free_ids: Vec::new(),
            deletion_policy,
            deletion_limit: deletion_policy.initial_limit(),
            restarts_since_deletion: 0,
            num_sweeps: 0,
            clause_bump: 1.0,
        }
    }

    pub fn input_clause_ids(&self) -> impl Iterator<Item = ClauseId> + '_ {
        (0..self.first_learned_id).filter(move |id| !self.free_ids.contains(id))
    }

    pub fn learned_clause_ids(&self) -> impl Iterator<Item = ClauseId> + '_ {
        (self.first_learned_id..self.clauses.len()).filter(move |id| !self.free_ids.contains(id))
    }

    /// Inserts a clause, attaching watches unless it is a unit clause
    /// (units are never watched, per the two-watched-literal invariant).
    pub fn insert(&mut self, clause: Clause, literal_watcher: &mut LiteralWatcher) -> ClauseId {
        let id = if let Some(id) = self.free_ids.pop() {
            self.clauses[id] = clause;
            id
        } else {
            self.clauses.push(clause);
            self.clauses.len() - 1
        };
        if self.clauses[id].len() >= 2 {
            literal_watcher.attach_clause(&self.clauses[id], id);
        }
        id
    }

    pub fn on_conflict(&mut self) {
        self.clause_bump /= CLAUSE_ACTIVITY_DECAY;
        if self.clause_bump > RESCALE_THRESHOLD {
            self.rescale_activity();
        }
    }

    pub fn on_restart(&mut self) {
        self.restarts_since_deletion += 1;
    }

    /// Bumps a learned clause's activity by the current (decayed) bump
    /// amount (spec §4.B `onLearning`: conflict analysis calls back into
    /// the clause database for every clause it resolves against). A no-op
    /// for input clauses, which carry no meaningful activity.
    pub fn bump_clause_activity(&mut self, id: ClauseId) {
        if !self.clauses[id].is_learned() {
            return;
        }
        self.clauses[id].activity += self.clause_bump;
        if self.clauses[id].activity > RESCALE_THRESHOLD {
            self.rescale_activity();
        }
    }

    fn rescale_activity(&mut self) {
        for clause in &mut self.clauses {
            clause.activity *= RESCALE_FACTOR;
        }
        self.clause_bump *= RESCALE_FACTOR;
    }

    /// Runs a deletion sweep if the configured policy says it is due,
    /// dropping learned clauses by activity per spec §4.G: `Aggressive`
    /// drops the least-active half once the learned-clause count exceeds a
    /// growing limit; `RestartBased` drops everything below the activity
    /// quartile every few restarts; `MinisatStyle` drops a fixed reduction
    /// ratio once count exceeds a geometrically growing allowance.
    pub fn maybe_delete_learned(&mut self, literal_watcher: &mut LiteralWatcher, trail: &Trail) -> bool {
        let learned_count = self.learned_clause_ids().count();
        if !self
            .deletion_policy
            .due(learned_count, self.restarts_since_deletion, self.deletion_limit)
        {
            return false;
        }
        self.restarts_since_deletion = 0;
        self.num_sweeps += 1;
        self.deletion_limit = self.deletion_policy.grow_limit(self.deletion_limit);

        for id in self.select_deletion_candidates() {
            self.remove_if_unused(id, literal_watcher, trail);
        }
        true
    }

    /// Picks which learned clauses a sweep removes, least-active first.
    /// Glue clauses (LBD <= 2) are never selected regardless of policy,
    /// mirroring the teacher's own exemption for clauses that are unusually
    /// likely to stay useful.
    fn select_deletion_candidates(&self) -> Vec<ClauseId> {
        let mut eligible: Vec<ClauseId> = self
            .learned_clause_ids()
            .filter(|&id| self.clauses[id].can_be_deleted && self.clauses[id].lbd.map_or(true, |lbd| lbd > 2))
            .collect();
        if eligible.is_empty() {
            return Vec::new();
        }
        eligible.sort_by(|&a, &b| self.clauses[a].activity.partial_cmp(&self.clauses[b].activity).unwrap());

        match self.deletion_policy.reduction_ratio() {
            Some(ratio) => {
                let cut = ((eligible.len() as f64) * ratio).round() as usize;
                eligible.truncate(cut);
                eligible
            }
            None => {
                let quartile_idx = (eligible.len() / 4).min(eligible.len() - 1);
                let threshold = self.clauses[eligible[quartile_idx]].activity;
                eligible
                    .into_iter()
                    .filter(|&id| self.clauses[id].activity <= threshold)
                    .collect()
            }
        }
    }

    /// Removes a clause unless it is currently serving as a propagation
    /// reason or has been marked non-deletable (spec §3, §8 invariant 6).
    pub fn remove_if_unused(&mut self, clause_id: ClauseId, literal_watcher: &mut LiteralWatcher, trail: &Trail) -> bool {
        if self.free_ids.contains(&clause_id) {
            return false;
        }
        if self.clauses[clause_id].len() < 2 || !self.clauses[clause_id].can_be_deleted {
            return false;
        }
        let is_reason = trail
            .assignment_stack
            .iter()
            .any(|a| a.reason == AssignmentReason::Propagated(clause_id));
        if is_reason {
            return false;
        }
        literal_watcher.detach_clause(&self.clauses[clause_id], clause_id);
        self.free_ids.push(clause_id);
        true
    }
}

impl Index<ClauseId> for ClauseDatabase {
    type Output = Clause;

    fn index(&self, index: ClauseId) -> &Self::Output {
        &self.clauses[index]
    }
}

impl IndexMut<ClauseId> for ClauseDatabase {
    fn index_mut(&mut self, index: ClauseId) -> &mut Self::Output {
        &mut self.clauses[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::Literal;

    #[test]
    fn insert_reuses_freed_ids() {
        let mut watcher = LiteralWatcher::new(4);
        let mut db = ClauseDatabase::init(vec![], &mut watcher, DeletionPolicy::Aggressive);
        let a = db.insert(Clause::learned(vec![Literal::from(1), Literal::from(2)], 2), &mut watcher);
        assert!(db.remove_if_unused(a, &mut watcher, &Trail::new(4)));
        let b = db.insert(Clause::learned(vec![Literal::from(3), Literal::from(4)], 2), &mut watcher);
        assert_eq!(a, b);
    }

    #[test]
    fn reason_clauses_are_never_removed() {
        let mut watcher = LiteralWatcher::new(2);
        let mut db = ClauseDatabase::init(vec![], &mut watcher, DeletionPolicy::Aggressive);
        let id = db.insert(Clause::learned(vec![Literal::from(1), Literal::from(2)], 2), &mut watcher);
        let mut trail = Trail::new(2);
        trail.propagate(Literal::from(1), id);
        assert!(!db.remove_if_unused(id, &mut watcher, &trail));
    }

    #[test]
    fn bump_clause_activity_is_a_no_op_for_input_clauses() {
        let mut watcher = LiteralWatcher::new(2);
        let mut db = ClauseDatabase::init(
            vec![Clause::from(vec![Literal::from(1), Literal::from(2)])],
            &mut watcher,
            DeletionPolicy::Aggressive,
        );
        db.bump_clause_activity(0);
        assert_eq!(db.clauses[0].activity, 0.0);
    }

    #[test]
    fn bump_clause_activity_grows_across_conflicts() {
        let mut watcher = LiteralWatcher::new(2);
        let mut db = ClauseDatabase::init(vec![], &mut watcher, DeletionPolicy::Aggressive);
        let id = db.insert(Clause::learned(vec![Literal::from(1), Literal::from(2)], 2), &mut watcher);
        db.bump_clause_activity(id);
        let first = db.clauses[id].activity;
        db.on_conflict();
        db.bump_clause_activity(id);
        assert!(db.clauses[id].activity > first);
    }

    #[test]
    fn aggressive_sweep_drops_the_least_active_half() {
        let mut watcher = LiteralWatcher::new(2);
        let mut db = ClauseDatabase::init(vec![], &mut watcher, DeletionPolicy::Aggressive);
        db.deletion_limit = 1.0;
        let low = db.insert(Clause::learned(vec![Literal::from(1), Literal::from(2)], 3), &mut watcher);
        let high = db.insert(Clause::learned(vec![Literal::from(-1), Literal::from(-2)], 3), &mut watcher);
        db.clauses[high].activity = 10.0;
        assert!(db.maybe_delete_learned(&mut watcher, &Trail::new(2)));
        assert!(db.free_ids.contains(&low));
        assert!(!db.free_ids.contains(&high));
    }
}
