//! Explicit solver statistics (spec §9 Design Note: no global stats singleton).

use prettytable::{row, Table};

#[derive(Debug, Clone)]
pub struct Statistics {
    pub num_clauses: usize,
    pub num_vars: usize,
    pub num_decisions: usize,
    pub num_conflicts: usize,
    pub num_propagations: usize,
    pub num_assignments: usize,
    pub num_restarts: usize,
    pub num_deletions: usize,
    start_time: std::time::Instant,
    pub elapsed: std::time::Duration,
}

impl Statistics {
    pub fn new(num_clauses: usize, num_vars: usize) -> Self {
        Statistics {
            num_clauses,
            num_vars,
            num_decisions: 0,
            num_conflicts: 0,
            num_propagations: 0,
            num_assignments: 0,
            num_restarts: 0,
            num_deletions: 0,
            start_time: std::time::Instant::now(),
            elapsed: std::time::Duration::default(),
        }
    }

    pub fn start_timing(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    pub fn stop_timing(&mut self) {
        self.elapsed = self.start_time.elapsed();
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*prettytable::format::consts::FORMAT_NO_COLSEP);
        table.set_titles(row![b -> "Solver statistics", "value"]);
        table.add_row(row!["Size", format!("{} clauses, {} vars", self.num_clauses, self.num_vars)]);
        table.add_row(row!["Decisions", self.num_decisions]);
        table.add_row(row!["Conflicts", self.num_conflicts]);
        table.add_row(row!["Propagations", self.num_propagations]);
        table.add_row(row!["Restarts", self.num_restarts]);
        table.add_row(row!["Deletion sweeps", self.num_deletions]);
        table.add_row(row!["Time (approx.)", format!("{:.3}s", self.elapsed.as_secs_f32())]);
        table
    }
}
