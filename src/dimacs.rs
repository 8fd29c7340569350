use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::cnf::{Clause, Literal, VarId};
use crate::error::{SolverError, SolverResult};
use itertools::Itertools;

pub struct DimacsFile {
    pub num_vars: usize,
    pub clauses: Vec<Clause>,
}

/// Reads a (optionally gzip-compressed) DIMACS CNF file. Parse failures are
/// reported as [`SolverError::InvalidInput`] so the CLI can print them and
/// exit non-zero uniformly with every other solver error (spec §9 ambient
/// error handling).
pub fn clauses_from_dimacs_file(path: &str) -> SolverResult<DimacsFile> {
    if !Path::new(path).exists() {
        return Err(SolverError::InvalidInput(format!("file {} not found", path)));
    }

    clauses_from_dimacs(if path.ends_with(".gz") {
        let file = std::fs::File::open(path)?;
        let mut decoder = GzDecoder::new(file);
        let mut result_string = String::new();
        decoder.read_to_string(&mut result_string)?;
        result_string
    } else {
        std::fs::read_to_string(path)?
    })
}

pub fn clauses_from_dimacs(input: String) -> SolverResult<DimacsFile> {
    let mut file_content: Vec<String> = input
        .lines()
        .map(String::from)
        .filter(|line| !line.starts_with('c'))
        .filter(|line| !line.starts_with('%'))
        .filter(|line| !line.is_empty())
        .collect();

    if file_content.last() == Some(&"0".to_string()) {
        file_content.pop();
    }

    // parse header
    let header = file_content
        .first()
        .ok_or_else(|| SolverError::InvalidInput("file was empty".to_string()))?
        .split_whitespace()
        .collect::<Vec<&str>>();

    if header.len() != 4 || header[0] != "p" || header[1] != "cnf" {
        return Err(SolverError::InvalidInput("invalid DIMACS header".to_string()));
    }
    let num_vars = header[2]
        .parse::<usize>()
        .map_err(|err| SolverError::InvalidInput(err.to_string()))?;
    let num_clauses = header[3]
        .parse::<usize>()
        .map_err(|err| SolverError::InvalidInput(err.to_string()))?;

    let mut clauses: Vec<Vec<Literal>> = file_content
        .iter()
        .filter(|line| !line.starts_with('p')) // filter header
        .join(" ")
        .split_whitespace()
        .map(|lit| lit.parse::<Literal>())
        .collect::<Result<Vec<_>, _>>()
        .map(|lits| {
            lits.split(|lit| (*lit).id() == 0)
                .map(|clause| clause.to_vec())
                .collect_vec()
        })
        .unwrap_or(Vec::new());

    if !clauses.is_empty() && !clauses.last().unwrap().is_empty() {
        return Err(SolverError::InvalidInput("last clause must end with 0".to_string()));
    }
    clauses.pop();

    if clauses.len() != num_clauses {
        return Err(SolverError::InvalidInput(format!(
            "expected {} clauses, got {}",
            num_clauses,
            clauses.len()
        )));
    }

    // Normalize CNF: sort clauses and remove duplicate literals
    for clause in clauses.iter_mut() {
        clause.sort();
        clause.dedup();
    }

    let var_count_in_clauses = clauses
        .iter()
        .map(|clause| clause.iter().map(|lit| lit.id()).max().unwrap_or(0))
        .max()
        .unwrap_or(0);

    if var_count_in_clauses != num_vars {
        return Err(SolverError::InvalidInput(format!(
            "expected {} variables, got {}",
            num_vars, var_count_in_clauses
        )));
    }

    let clauses = clauses
        .iter()
        .map(|clause| Clause::from(clause.clone()))
        .collect_vec();

    Ok(DimacsFile { clauses, num_vars })
}

pub fn solution_to_dimacs(solution: Option<HashMap<VarId, bool>>) -> String {
    let mut dimacs = String::new();
    if solution.is_none() {
        return String::from("s UNSATISFIABLE");
    } else {
        dimacs.push_str("s SATISFIABLE\n")
    }
    let assignment = solution.unwrap();
    dimacs.push_str("v ");
    let sorted_vars = assignment
        .iter()
        .sorted_by_key(|(var_id, _)| *var_id)
        .map(|(id, value)| (id, *value))
        .collect_vec();
    for (var_id, value) in sorted_vars.iter() {
        dimacs.push_str(format!("{}{} ", if *value { "" } else { "-" }, var_id).as_str());
        dimacs.push(' ');
    }
    dimacs
}
