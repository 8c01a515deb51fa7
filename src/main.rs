//! Household simulator entry point: CLI wiring and scenario-driven runs.

use std::path::Path;
use std::process;

use household_sim::config::ScenarioConfig;
use household_sim::io::export::export_csv;
use household_sim::runner::{RunOutput, run_headless};
use household_sim::sim::engine::Engine;
use household_sim::telemetry::init_tracing;
use tracing::info;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    ticks_override: Option<u64>,
    seed_override: Option<u64>,
    telemetry_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("household-sim: household device, temperature, and load simulator");
    eprintln!();
    eprintln!("Usage: household-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --ticks <u64>            Override number of ticks in the headless run");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --telemetry-out <path>   Export tick results to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Keep simulating live behind the REST API");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the idle preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn next_value<'a>(args: &'a [String], i: usize, flag: &str, what: &str) -> &'a str {
    match args.get(i) {
        Some(v) => v,
        None => {
            eprintln!("error: {flag} requires {what}");
            process::exit(1);
        }
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, flag: &str, ty: &str) -> T {
    value.parse::<T>().unwrap_or_else(|_| {
        eprintln!("error: {flag} value \"{value}\" is not a valid {ty}");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        ticks_override: None,
        seed_override: None,
        telemetry_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                cli.scenario_path =
                    Some(next_value(&args, i, "--scenario", "a path argument").to_string());
            }
            "--preset" => {
                i += 1;
                cli.preset =
                    Some(next_value(&args, i, "--preset", "a name argument").to_string());
            }
            "--ticks" => {
                i += 1;
                let v = next_value(&args, i, "--ticks", "a u64 argument");
                cli.ticks_override = Some(parse_number(v, "--ticks", "u64"));
            }
            "--seed" => {
                i += 1;
                let v = next_value(&args, i, "--seed", "a u64 argument");
                cli.seed_override = Some(parse_number(v, "--seed", "u64"));
            }
            "--telemetry-out" => {
                i += 1;
                cli.telemetry_out =
                    Some(next_value(&args, i, "--telemetry-out", "a path argument").to_string());
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let v = next_value(&args, i, "--port", "a u16 argument");
                cli.port = parse_number(v, "--port", "u16");
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn main() {
    let cli = parse_args();
    init_tracing();

    // --scenario takes priority, then --preset, then the idle default
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::idle()
    };

    if let Some(ticks) = cli.ticks_override {
        scenario.simulation.ticks = ticks;
    }
    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });

    let mut engine = Engine::new(scenario.sim_config());
    info!(
        ticks = scenario.simulation.ticks,
        script = scenario.script.len(),
        "starting headless run"
    );
    let RunOutput { results, report } =
        run_headless(&mut engine, &scenario, scenario.signal_sources(), &rt);

    for r in &results {
        println!("{r}");
    }
    println!("\n{report}");

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&results, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        info!(path = %path, "telemetry written");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        serve_live(&rt, engine, &scenario, cli.port);
    }
}

/// Hands the engine to the live service and serves the API until Ctrl+C.
#[cfg(feature = "api")]
fn serve_live(
    rt: &tokio::runtime::Runtime,
    engine: Engine,
    scenario: &ScenarioConfig,
    port: u16,
) {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use household_sim::api::{AppState, serve};
    use household_sim::service::Service;
    use household_sim::telemetry::shutdown_signal;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    rt.block_on(async {
        let service = Service::spawn(engine, scenario.signal_sources());
        let state = Arc::new(AppState {
            service: service.handle(),
        });
        let outcome = serve(state, addr, shutdown_signal()).await;
        service.shutdown().await;
        if let Err(e) = outcome {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    });
}
