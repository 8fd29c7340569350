use asp_core::cnf::check_assignment;
use asp_core::dimacs::{clauses_from_dimacs_file, solution_to_dimacs};
use asp_core::error::SolverResult;
use asp_core::minimization::{PredicateMinimizationAlgorithm, PredicateMinimizer};
use asp_core::solver::config::Config;
use asp_core::solver::heuristic::HeuristicType;
use asp_core::solver::restarts::RestartPolicy;
use asp_core::solver::statistics::Statistics;
use asp_core::solver::Solver;
use clap::Parser;

/// DIMACS/pure-SAT front end (spec §1: the ground-program parser and
/// simplifier that would turn ASP rules into completion clauses and
/// SCC/HCC metadata are external collaborators). Can still exercise MODULE
/// J against a DIMACS instance via `--minimize`/`--atom`, since predicate
/// minimization only needs a variable list, not program structure; MODULE
/// I needs the `Program`/`HccComponent` metadata a DIMACS file can't carry
/// and so is not reachable from this binary.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(index = 1)]
    file: String,

    #[arg(long, default_value = "berkmin")]
    heuristic: HeuristicType,

    #[arg(short, long, default_value = "luby")]
    restart_policy: RestartPolicy,

    /// Which MODULE J driver to run, if any.
    #[arg(long, default_value = "none")]
    minimize: PredicateMinimizationAlgorithm,

    /// Atoms to count and minimize. Repeat the flag once per atom.
    #[arg(long = "atom")]
    atoms_to_minimize: Vec<usize>,

    /// How many of the most recently learned clauses the Berkmin heuristic
    /// scans per decision. Ignored by other heuristics.
    #[arg(long, default_value = "10")]
    berkmin_scan_limit: usize,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(&args) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> SolverResult<()> {
    let dimacs = clauses_from_dimacs_file(&args.file)?;

    let config = Config {
        heuristic: args.heuristic,
        restart_policy: args.restart_policy,
        predicate_minimization: args.minimize,
        atoms_to_minimize: args.atoms_to_minimize.clone(),
        berkmin_scan_limit: args.berkmin_scan_limit,
        ..Config::default()
    };

    let mut solver = Solver::new(dimacs.clauses.clone(), dimacs.num_vars, config);

    let solution = if args.minimize == PredicateMinimizationAlgorithm::None {
        solver.solve()
    } else {
        let mut minimizer = PredicateMinimizer::new(&mut solver, args.atoms_to_minimize.clone());
        minimizer.minimize(args.minimize)?
    };

    let output = render(args, &dimacs.clauses, &solution, solver.stats());
    println!("{}", output);
    Ok(())
}

fn render(args: &Args, cnf: &[asp_core::cnf::Clause], solution: &asp_core::cnf::Solution, stats: &Statistics) -> String {
    let mut output = format!("c {}", BANNER);
    output.push_str(format!("\nFile\n{}\n", args.file).as_str());
    output.push_str(format!("\n{}\n", stats.to_table()).as_str());

    if let Some(assignment) = solution.clone() {
        if check_assignment(cnf, &assignment) {
            output.push_str("Solution has been verified and is correct\n");
        } else {
            output.push_str("WRONG SOLUTION\n");
        }
    }

    output = output.replace('\n', "\nc ");
    output.push_str(format!("\n{}", solution_to_dimacs(solution.clone())).as_str());
    output
}

const BANNER: &str = r#"
          _
    _   _| |_ ___  _ __  _  __ _
   | | | | __/ _ \| '_ \| |/ _` |
   | |_| | || (_) | |_) | | (_| |
    \__,_|\__\___/| .__/|_|\__,_|
                  |_|
"#;
