//! meterwatch entry point: CLI wiring and config-driven store construction.

use std::fs::File;
use std::path::Path;
use std::process;

use meterwatch::config::DemoConfig;
use meterwatch::forecast::DEFAULT_HORIZON_DAYS;
use meterwatch::ingest::import_csv;
use meterwatch::io::export::export_csv;
use meterwatch::model::MeterId;
use meterwatch::observability::init_tracing;
use meterwatch::queries;
use meterwatch::seed::seed_store;
use meterwatch::store::ReadingFilter;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    import_path: Option<String>,
    export_path: Option<String>,
    forecast_meter: Option<MeterId>,
    horizon: u32,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("meterwatch - facility utility-meter monitoring core");
    eprintln!();
    eprintln!("Usage: meterwatch [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>       Load demo config from TOML file");
    eprintln!("  --preset <name>       Use a built-in preset (demo, compact)");
    eprintln!("  --seed <u64>          Override random seed");
    eprintln!("  --import <path>       Bulk-import readings from CSV");
    eprintln!("  --export <path>       Export derived consumption series to CSV");
    eprintln!("  --forecast <meter>    Print a forecast for the given meter id");
    eprintln!("  --horizon <days>      Forecast horizon in days (default: 30)");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve               Start REST API server");
        eprintln!("  --port <u16>          API server port (default: 3000)");
    }
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the demo preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        seed_override: None,
        import_path: None,
        export_path: None,
        forecast_meter: None,
        horizon: DEFAULT_HORIZON_DAYS,
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
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --config requires a path argument");
                    process::exit(1);
                }
                cli.config_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--import" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --import requires a path argument");
                    process::exit(1);
                }
                cli.import_path = Some(args[i].clone());
            }
            "--export" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --export requires a path argument");
                    process::exit(1);
                }
                cli.export_path = Some(args[i].clone());
            }
            "--forecast" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --forecast requires a meter id argument");
                    process::exit(1);
                }
                if let Ok(m) = args[i].parse::<MeterId>() {
                    cli.forecast_meter = Some(m);
                } else {
                    eprintln!(
                        "error: --forecast value \"{}\" is not a valid meter id",
                        args[i]
                    );
                    process::exit(1);
                }
            }
            "--horizon" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --horizon requires a day-count argument");
                    process::exit(1);
                }
                if let Ok(h) = args[i].parse::<u32>() {
                    cli.horizon = h;
                } else {
                    eprintln!("error: --horizon value \"{}\" is not a valid u32", args[i]);
                    process::exit(1);
                }
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
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
    init_tracing();
    let cli = parse_args();

    // Load config: --config takes priority, then --preset, then the demo default
    let mut config = if let Some(ref path) = cli.config_path {
        match DemoConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match DemoConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        DemoConfig::demo()
    };

    // Apply seed override
    if let Some(seed) = cli.seed_override {
        config.seeding.seed = seed;
    }

    // Validate
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // Build the store and apply any bulk import
    let mut store = seed_store(&config);
    if let Some(ref path) = cli.import_path {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error: cannot open \"{path}\": {e}");
                process::exit(1);
            }
        };
        match import_csv(&mut store, file) {
            Ok(count) => eprintln!("Imported {count} readings from {path}"),
            Err(e) => {
                eprintln!("error: import failed: {e}");
                process::exit(1);
            }
        }
    }

    // Print overall statistics and the anomaly gauge
    let filter = ReadingFilter::default();
    let stats = queries::summary_stats_for(&store, &filter);
    let anomaly = queries::anomaly_indicator_for(&store, &filter);
    println!("{stats}");
    println!("Anomaly gauge:     {anomaly}");

    // Print a forecast if requested
    if let Some(meter_id) = cli.forecast_meter {
        match queries::forecast_for(&store, meter_id, cli.horizon) {
            Ok(Some(forecast)) => {
                println!("\nMeter {meter_id}:");
                println!("{forecast}");
            }
            Ok(None) => {
                println!("\nMeter {meter_id}: not enough data to forecast");
            }
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    }

    // Export CSV if requested
    if let Some(ref path) = cli.export_path {
        let points = queries::consumption_series(&store, &filter);
        if let Err(e) = export_csv(&points, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Consumption series written to {path}");
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(meterwatch::api::AppState { store });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        rt.block_on(meterwatch::api::serve(state, addr));
    }
}
