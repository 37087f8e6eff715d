use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use powercap::debug::{format_f64, format_polar_vec};
use powercap::newton::{pfsoln, NewtonSolver};
use powercap::report::{format_log, summary};
use powercap::{
    CapacityStressTester, NetworkModel, Opt, PFOpt, StressOpt, StressOptBuilder, TopologyBuilder,
};

/// Capacity stress testing of a data center distribution branch.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the maximum load the branch carries before a limit trips
    Stress(StressArgs),

    /// Power Flow at a single load
    #[clap(name = "pf")]
    PowerFlow(PfArgs),
}

#[derive(Args)]
struct StressArgs {
    /// Load step (kW).
    #[arg(long)]
    step_kw: Option<f64>,

    /// Stop once the load exceeds this value (MW).
    #[arg(long)]
    ceiling_mw: Option<f64>,

    /// Transformer loading limit (%).
    #[arg(long)]
    loading_limit: Option<f64>,

    /// Load bus voltage limit (p.u.).
    #[arg(long)]
    voltage_limit: Option<f64>,

    /// Print every solved step.
    #[arg(long, default_value_t = false)]
    table: bool,

    #[command(flatten)]
    solver: SolverArgs,
}

#[derive(Args)]
struct PfArgs {
    /// Load active power (MW).
    #[arg(long, default_value_t = 0.0)]
    load_mw: f64,

    #[command(flatten)]
    solver: SolverArgs,
}

#[derive(Args)]
struct SolverArgs {
    /// Reactive to active power ratio of the load.
    #[arg(long)]
    q_ratio: Option<f64>,

    /// Termination tolerance on per unit P & Q mismatch.
    #[arg(long)]
    tol: Option<f64>,

    /// Maximum number of iterations.
    #[arg(long)]
    max_it: Option<usize>,
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_level(false)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(_) => {
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Stress(args) => stress(args),
        Commands::PowerFlow(args) => power_flow(args),
    }
}

fn network(args: &SolverArgs) -> Result<NetworkModel> {
    let mut topology = TopologyBuilder::default();
    if let Some(q_ratio) = args.q_ratio {
        topology.q_ratio(q_ratio);
    }
    Ok(NetworkModel::new(topology.build()?)?)
}

fn pf_opt(args: &SolverArgs) -> PFOpt {
    let mut opt = PFOpt::default();
    if let Some(tol) = args.tol {
        opt.tolerance = tol;
    }
    if let Some(max_it) = args.max_it {
        opt.max_it = max_it;
    }
    opt
}

fn stress_opt(args: &StressArgs) -> Result<StressOpt> {
    let mut stress_opt = StressOptBuilder::default();
    if let Some(step_kw) = args.step_kw {
        stress_opt.step_kw(step_kw);
    }
    if let Some(ceiling_mw) = args.ceiling_mw {
        stress_opt.ceiling_mw(ceiling_mw);
    }
    if let Some(limit) = args.loading_limit {
        stress_opt.loading_limit_pct(limit);
    }
    if let Some(limit) = args.voltage_limit {
        stress_opt.voltage_limit_pu(limit);
    }
    Ok(stress_opt.build()?)
}

fn stress(args: &StressArgs) -> Result<()> {
    let opt = Opt {
        stress: stress_opt(args)?,
        pf: pf_opt(&args.solver),
    };

    let mut net = network(&args.solver)?;
    let solver = NewtonSolver::new(opt.pf);

    let tester = CapacityStressTester::new(&mut net, &solver, opt.stress)?;
    let (log, state) = tester.run()?;

    if args.table {
        print!("{}", format_log(&log));
    }
    print!("{}", summary(&log, state));
    Ok(())
}

fn power_flow(args: &PfArgs) -> Result<()> {
    let mut net = network(&args.solver)?;
    net.set_load(args.load_mw)?;

    let solver = NewtonSolver::new(pf_opt(&args.solver));
    let solution = solver.newtonpf(&net)?;
    let state = pfsoln(&net, &solution);

    println!("Converged in {} iterations", solution.iterations);
    for (bus, v) in net.bus().iter().zip(&solution.v) {
        println!("{:<22} {}", bus.name, format_polar_vec(&[*v]));
    }
    println!(
        "{:<22} {}%",
        net.transformer().name,
        format_f64(state.transformer_loading_pct)
    );
    println!("{:<22} {}%", net.feeder().name, format_f64(state.feeder_loading_pct));
    println!("Losses                 {} kW", format_f64(state.losses_kw));
    Ok(())
}
