//! MODULE A/B data types: variables, literals and clauses (spec §3, §4.A, §4.B).

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Neg;
use std::str::FromStr;

pub type VarId = usize;
pub type ClauseId = usize;
pub type SolutionAssignment = HashMap<VarId, bool>;
pub type Solution = Option<SolutionAssignment>;

/// A (variable, polarity) pair. Dense `i32` encoding: positive value is the
/// positive literal, negative value the negative literal; `0` is never a
/// valid literal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    value: i32,
}

impl Literal {
    pub fn new(value: i32) -> Self {
        debug_assert_ne!(value, 0, "literal 0 does not name a variable");
        Literal { value }
    }

    pub fn from_value(id: VarId, positive: bool) -> Self {
        Literal {
            value: if positive { id as i32 } else { -(id as i32) },
        }
    }

    pub fn id(&self) -> VarId {
        self.value.unsigned_abs() as VarId
    }

    pub fn positive(&self) -> bool {
        self.value > 0
    }

    pub fn negative(&self) -> bool {
        self.value < 0
    }

    pub fn id_val(&self) -> (VarId, bool) {
        (self.id(), self.positive())
    }

    pub fn opposite(&self) -> Literal {
        -*self
    }
}

impl FromStr for Literal {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i32 = s.parse()?;
        Ok(Literal::new(value))
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::new(value)
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Literal { value: -self.value }
    }
}

impl Debug for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Role of a literal occurrence inside a ground rule, populated by the front
/// end and consulted only by the HCC checker (spec §3 "Atom metadata").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralRole {
    Head,
    PositiveBody,
    NegativeBody,
    DoubleNegativeBody,
}

/// Outcome of [`Clause::on_literal_false`], spec §4.B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// A different, non-false literal was swapped into the watched position.
    FoundNewWatch,
    /// The other watched literal is already true; nothing to do.
    AlreadySatisfied,
    /// Every other literal is false; `literals[0]` must be propagated true.
    Unit,
    /// Every literal, including `literals[0]`, is false.
    Conflict,
}

/// A disjunction of literals with the two-watched-literal invariant of
/// spec §3: `literals[0]` and `literals[1]` are always the watched
/// positions once the clause is attached.
#[derive(Clone)]
pub struct Clause {
    pub literals: Vec<Literal>,
    /// Rotating cursor into `literals`, spec §4.B: spreads the cost of
    /// repeated watch misses across the clause. Starts at 1 so the first
    /// scan begins at index 2.
    last_swap_index: usize,
    /// Literal-block distance of a learned clause; `None` for input clauses.
    pub lbd: Option<usize>,
    /// VSIDS-style activity, bumped by `ClauseDatabase::bump_clause_activity`
    /// during conflict-analysis resolution and decayed once per conflict;
    /// read back by the deletion sweeps to pick what to drop (spec §4.G).
    /// Irrelevant for non-learned clauses.
    pub activity: f64,
    /// `false` for clauses introduced via the incremental API as
    /// commitments (e.g. blocking clauses from predicate minimization);
    /// such clauses are never touched by a deletion strategy (spec §3, §8
    /// invariant 6).
    pub can_be_deleted: bool,
}

impl Clause {
    /// Builds a clause and picks two distinct watch positions at random
    /// (spec §4.B "Randomized initial watch positions"), using the supplied
    /// deterministic RNG so test runs are reproducible (spec §9).
    pub fn new(mut literals: Vec<Literal>, rng: &mut impl rand::Rng) -> Self {
        debug_assert!(
            literals.len() >= 2,
            "unit/empty clauses are handled before attach, never constructed here"
        );
        let first = rng.gen_range(0..literals.len());
        let mut second = rng.gen_range(0..literals.len() - 1);
        if second >= first {
            second += 1;
        }
        literals.swap(0, first);
        let second_after_swap = if second == 0 { first } else { second };
        literals.swap(1, second_after_swap);
        Clause {
            literals,
            last_swap_index: 1,
            lbd: None,
            activity: 0.0,
            can_be_deleted: true,
        }
    }

    /// Builds a clause with an explicit watch assignment: `first`/`second`
    /// are swapped into positions 0/1 exactly as spec §4.B's
    /// `attachClause(first, second)` describes, handling `second == 0`.
    pub fn with_watches(mut literals: Vec<Literal>, first: usize, second: usize) -> Self {
        debug_assert!(literals.len() >= 2);
        debug_assert_ne!(first, second);
        literals.swap(0, first);
        let second_after_swap = if second == 0 { first } else { second };
        literals.swap(1, second_after_swap);
        Clause {
            literals,
            last_swap_index: 1,
            lbd: None,
            activity: 0.0,
            can_be_deleted: true,
        }
    }

    /// A learned clause: the asserting literal is already at position 0 and
    /// the backjump-level literal at position 1 (see
    /// `ConflictAnalyzer::analyze`), so watches are simply `[0, 1]`.
    pub fn learned(literals: Vec<Literal>, lbd: usize) -> Self {
        debug_assert!(!literals.is_empty());
        Clause {
            literals,
            last_swap_index: 1,
            lbd: Some(lbd),
            activity: 0.0,
            can_be_deleted: true,
        }
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn is_learned(&self) -> bool {
        self.lbd.is_some()
    }

    pub fn watched(&self) -> (Literal, Literal) {
        (self.literals[0], self.literals[1])
    }

    pub fn is_satisfied(&self, is_true: impl Fn(Literal) -> bool) -> bool {
        self.literals.iter().any(|&lit| is_true(lit))
    }

    /// spec §4.B `onLiteralFalse`. `falsified` must currently watch this
    /// clause (be `literals[0]` or `literals[1]`).
    pub fn on_literal_false(
        &mut self,
        falsified: Literal,
        is_true: impl Fn(Literal) -> bool,
        is_false: impl Fn(Literal) -> bool,
    ) -> WatchOutcome {
        debug_assert!(is_false(falsified));
        if self.literals[0] == falsified {
            self.literals.swap(0, 1);
        }
        debug_assert_eq!(self.literals[1], falsified);

        if is_true(self.literals[0]) {
            return WatchOutcome::AlreadySatisfied;
        }

        if self.update_watch(&is_false) {
            WatchOutcome::FoundNewWatch
        } else if is_false(self.literals[0]) {
            WatchOutcome::Conflict
        } else {
            WatchOutcome::Unit
        }
    }

    /// spec §4.B `updateWatch`: scan `(lastSwapIndex+1..size)` then
    /// `(2..=lastSwapIndex)` for the first non-false literal, swap it into
    /// position 1. The open question in spec §9 is honored literally:
    /// only position 1 ever moves here; position 0 moves only via the swap
    /// inside `on_literal_false`.
    fn update_watch(&mut self, is_false: &impl Fn(Literal) -> bool) -> bool {
        let len = self.literals.len();
        for i in (self.last_swap_index + 1)..len {
            if !is_false(self.literals[i]) {
                self.last_swap_index = i;
                self.literals.swap(1, i);
                return true;
            }
        }
        let bound = self.last_swap_index.min(len.saturating_sub(1));
        for i in 2..=bound {
            if !is_false(self.literals[i]) {
                self.last_swap_index = i;
                self.literals.swap(1, i);
                return true;
            }
        }
        false
    }

    /// spec §4.B `checkUnsatisfiedAndOptimize`, used by the HCC checker.
    /// Returns true iff no literal is currently true; along the way
    /// collects undefined variables and opportunistically swaps a
    /// discovered true literal toward position 0.
    pub fn unsatisfied_and_collect_undefined(
        &mut self,
        is_true: impl Fn(Literal) -> bool,
        is_undefined: impl Fn(Literal) -> bool,
        collector: &mut Vec<VarId>,
    ) -> bool {
        let last = self.literals.len() - 1;
        if is_true(self.literals[last]) {
            return false;
        }
        if is_undefined(self.literals[last]) {
            collector.push(self.literals[last].id());
        }

        if is_true(self.literals[0]) {
            return false;
        }
        if is_undefined(self.literals[0]) {
            collector.push(self.literals[0].id());
        }

        for i in 1..last {
            if is_true(self.literals[i]) {
                if i == 1 {
                    self.literals.swap(0, 1);
                } else {
                    self.literals.swap(i, last);
                }
                return false;
            }
            if is_undefined(self.literals[i]) {
                collector.push(self.literals[i].id());
            }
        }
        true
    }

    /// spec §4.B `onLearning`: visit every literal for activity bumping
    /// during conflict analysis, without exposing internals to the caller.
    pub fn for_each_literal(&self, mut f: impl FnMut(Literal)) {
        for &lit in &self.literals {
            f(lit);
        }
    }
}

impl From<Vec<Literal>> for Clause {
    /// Used for already-attached learned/runtime clauses whose watch
    /// positions were chosen by the caller (0, 1 by convention).
    fn from(literals: Vec<Literal>) -> Self {
        Clause {
            literals,
            last_swap_index: 1,
            lbd: None,
            activity: 0.0,
            can_be_deleted: true,
        }
    }
}

impl From<&str> for Clause {
    fn from(s: &str) -> Self {
        let literals: Vec<Literal> = s
            .split_whitespace()
            .map(|lit| lit.parse().unwrap())
            .collect();
        Clause::from(literals)
    }
}

impl Debug for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.literals)
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .literals
            .iter()
            .map(|lit| lit.to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        write!(f, "{}", rendered)
    }
}

/// Verifies a full assignment against a CNF, used by the CLI and by tests.
pub fn check_assignment(clauses: &[Clause], assignment: &SolutionAssignment) -> bool {
    clauses.iter().all(|clause| {
        clause
            .literals
            .iter()
            .any(|lit| assignment.get(&lit.id()).copied() == Some(lit.positive()))
    })
}
