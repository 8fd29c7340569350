//! MODULE D: unit propagation (spec §4.D).

use crate::cnf::{ClauseId, Literal};
use crate::solver::state::State;
use crate::solver::trail::Trail;
use log::trace;
use std::collections::VecDeque;

/// FIFO queue of literals forced by unit clauses, drained by [`UnitPropagator::propagate`]
/// until fixpoint or the first conflict.
#[derive(Debug, Default)]
pub struct UnitPropagator {
    queue: VecDeque<(Literal, ClauseId)>,
    queued: Vec<Literal>,
}

impl UnitPropagator {
    pub fn enqueue(&mut self, literal: Literal, reason: ClauseId) {
        if self.queued.contains(&literal) {
            return;
        }
        self.queued.push(literal);
        self.queue.push_back((literal, reason));
    }

    pub fn drain_queue(&mut self) {
        self.queue.clear();
        self.queued.clear();
    }

    /// Assigns every queued literal in turn, recording each as a trail
    /// propagation, until the queue empties or a clause falls into
    /// conflict. A conflict discards the rest of the queue: the caller is
    /// about to analyze and backjump, at which point any still-queued
    /// literal is stale.
    pub fn propagate(&mut self, state: &mut State, trail: &mut Trail) {
        while let Some((literal, reason)) = self.queue.pop_front() {
            trace!("propagating {} (reason clause {})", literal, reason);
            trail.propagate(literal, reason);
            state.assign(literal, self);
            state.stats.num_propagations += 1;
            if state.conflict_clause_id.is_some() {
                self.drain_queue();
                return;
            }
        }
        self.queued.clear();
    }
}
