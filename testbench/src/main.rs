use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use simplelog as sl;
use simtools::{DEFAULT_SIMULATOR, Environment, SIMULATOR_VAR, TOPLEVEL_LANG_VAR, VERILOG};
use testbench::{BUILTIN_HARNESSES, Harness, run_harness};

#[derive(Parser)]
#[command(name = "uart-harness")]
#[command(about = "Build and drive the UART HDL test harnesses")]
#[command(version)]
struct Args {
    /// Built-in harness to run
    #[arg(value_name = "HARNESS", default_value = "testCom")]
    harness: String,

    /// Load the harness from a YAML file instead
    #[arg(long, conflicts_with = "harness")]
    harness_file: Option<Utf8PathBuf>,

    /// Directory the harness's source paths are relative to
    #[arg(long, default_value = ".")]
    project_dir: Utf8PathBuf,

    /// Where generated testbenches and simulator outputs go
    #[arg(long)]
    build_dir: Option<Utf8PathBuf>,

    /// Simulator backend
    #[arg(long, env = SIMULATOR_VAR, default_value = DEFAULT_SIMULATOR)]
    sim: String,

    /// Toplevel language; anything but "verilog" selects the VHDL placeholder
    #[arg(long, env = TOPLEVEL_LANG_VAR, default_value = VERILOG)]
    lang: String,

    /// Play the scenario in-process instead of invoking a simulator
    #[arg(long)]
    dry_run: bool,

    /// Stop a dry run at this simulated time
    #[arg(long, requires = "dry_run")]
    until: Option<u64>,

    /// Dump the dry-run trace as VCD
    #[arg(long, requires = "dry_run")]
    vcd: Option<Utf8PathBuf>,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<Utf8PathBuf>,

    /// More output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// List built-in harnesses and exit
    #[arg(long)]
    list: bool,
}

impl Args {
    fn level(&self) -> sl::LevelFilter {
        if self.quiet {
            return sl::LevelFilter::Warn;
        }
        match self.verbose {
            0 => sl::LevelFilter::Info,
            1 => sl::LevelFilter::Debug,
            _ => sl::LevelFilter::Trace,
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let level = args.level();
    let mut loggers: Vec<Box<dyn sl::SharedLogger>> = vec![sl::TermLogger::new(
        level,
        sl::Config::default(),
        sl::TerminalMode::Stderr,
        sl::ColorChoice::Auto,
    )];
    if let Some(path) = &args.log_file {
        let file = File::create(path).with_context(|| format!("Failed to create log file {path}"))?;
        loggers.push(sl::WriteLogger::new(level, sl::Config::default(), file));
    }
    sl::CombinedLogger::init(loggers).context("Failed to initialize logging")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    if args.list {
        println!("Available harnesses:");
        for name in BUILTIN_HARNESSES {
            if let Some(harness) = Harness::builtin(name) {
                println!("  - {} (toplevel {})", name, harness.toplevel);
            }
        }
        return Ok(());
    }

    let harness = match &args.harness_file {
        Some(path) => Harness::load(path)?,
        None => Harness::builtin(&args.harness).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown harness: {} (available: {})",
                args.harness,
                BUILTIN_HARNESSES.join(", ")
            )
        })?,
    };

    if args.dry_run {
        let (trace, summary) = harness.simulate(args.until)?;
        println!(
            "{}: {} at {}{} after {} wakeups",
            harness.test_module(),
            if summary.completed { "completed" } else { "stopped" },
            summary.end_time,
            harness.scenario.time_unit,
            summary.wakeups
        );
        if let Some(path) = &args.vcd {
            let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
            trace
                .write_vcd(
                    BufWriter::new(file),
                    harness.test_module(),
                    harness.scenario.time_unit,
                )
                .with_context(|| format!("Failed to write {path}"))?;
            println!("Trace written to {path}");
        }
        return Ok(());
    }

    let env = Environment::from_values(Some(args.lang.as_str()), Some(args.sim.as_str()));
    let build_dir = args
        .build_dir
        .clone()
        .unwrap_or_else(|| args.project_dir.join("sim_build"));

    let report = run_harness(
        &harness,
        &env,
        args.project_dir.as_std_path(),
        build_dir.as_std_path(),
    )?;
    println!("{} passed", report.test_module);
    Ok(())
}
