// src/main.rs
//! nmea-tools - capture, convert and merge chartplotter waypoints

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nmea_tools::{
    capture::load_capture,
    config::check_output,
    display::{terminal::TerminalProgress, NullObserver},
    gpx::read_gpx,
    nmea::{source::list_serial_ports, ByteSource},
    *,
};
use std::{
    collections::BTreeSet,
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

#[derive(Parser)]
#[command(
    name = "nmea-tools",
    version,
    about = "Capture, convert and merge chartplotter waypoints and routes"
)]
struct Cli {
    /// Debug logging (RUST_LOG still applies)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture non-background sentences until end of input or Ctrl+C
    Capture {
        /// Serial device or recorded NMEA file; defaults to the configured port
        input: Option<String>,

        /// Capture JSON destination, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        baud: Option<u32>,

        /// Serial read timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Comma separated background sentence types, e.g. RMC,GPGGA
        #[arg(long)]
        background: Option<String>,

        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,

        /// No progress marks on stderr
        #[arg(short, long)]
        quiet: bool,
    },

    /// Convert capture files to waypoint documents next to each input
    Convert {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Document description
        #[arg(short, long)]
        desc: Option<String>,

        #[arg(long)]
        force: bool,

        /// gpx, geojson, kml or csv
        #[arg(short, long, default_value = "gpx")]
        format: WaypointFormat,
    },

    /// Merge UPDATE waypoints into MASTER, dropping near-duplicates
    Merge {
        /// GPX document, or capture JSON by .json extension
        master: PathBuf,

        update: PathBuf,

        /// Merged GPX destination, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Match distance in nautical miles
        #[arg(long)]
        threshold: Option<f64>,

        /// Write suppressed near-duplicates as JSON
        #[arg(long)]
        audit: Option<PathBuf>,

        #[arg(long)]
        force: bool,

        #[arg(short, long)]
        desc: Option<String>,
    },

    /// List available serial ports
    Ports,

    /// Print the effective configuration
    Config {
        /// Persist it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = ToolConfig::load().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {}", e);
        ToolConfig::default()
    });

    match cli.command {
        Commands::Capture {
            input,
            output,
            baud,
            timeout,
            background,
            force,
            quiet,
        } => {
            let mut config = config;
            if let Some(list) = background {
                config.update_background(&list);
            }
            config.baud_rate = baud.unwrap_or(config.baud_rate);
            config.timeout_secs = timeout.unwrap_or(config.timeout_secs);
            let input = input
                .or_else(|| config.serial_port.clone())
                .context("no input given and no serial_port configured")?;
            cmd_capture(config, input, output, force, quiet).await
        }
        Commands::Convert {
            inputs,
            desc,
            force,
            format,
        } => cmd_convert(&inputs, &desc.unwrap_or(config.description), force, format),
        Commands::Merge {
            master,
            update,
            output,
            threshold,
            audit,
            force,
            desc,
        } => {
            let threshold = threshold.unwrap_or(config.threshold_nm);
            let desc = desc.unwrap_or(config.description);
            cmd_merge(&master, &update, output.as_deref(), threshold, audit.as_deref(), force, &desc)
        }
        Commands::Ports => cmd_ports(),
        Commands::Config { save } => cmd_config(&config, save),
    }
}

async fn cmd_capture(
    config: ToolConfig,
    input: String,
    output: Option<PathBuf>,
    force: bool,
    quiet: bool,
) -> Result<()> {
    config.validate()?;
    if let Some(path) = &output {
        check_output(path, force)?;
    }

    let source = ByteSource::detect(&input, config.baud_rate, Duration::from_secs(config.timeout_secs));
    let running = Arc::new(AtomicBool::new(true));
    let reader = source.open(Arc::clone(&running))?;
    log::info!("Capturing from {}, Ctrl+C to finish", source.describe());

    // Set up Ctrl+C handler
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, writing capture");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    let filter = FilterConfig::new(&config.background);
    tokio::task::spawn_blocking(move || -> nmea_tools::Result<CaptureStats> {
        let out: Box<dyn Write> = match &output {
            Some(path) => Box::new(File::create(path)?),
            None => Box::new(io::stdout()),
        };
        if quiet {
            run_capture(reader, filter, running, NullObserver, out)
        } else {
            run_capture(reader, filter, running, TerminalProgress::new(), out)
        }
    })
    .await??;

    Ok(())
}

fn cmd_convert(inputs: &[PathBuf], description: &str, force: bool, format: WaypointFormat) -> Result<()> {
    let mut failures = 0;
    for input in inputs {
        if let Err(e) = convert_one(input, description, force, format) {
            log::error!("{}: {:#}", input.display(), e);
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{} of {} files failed", failures, inputs.len());
    }
    Ok(())
}

fn convert_one(input: &Path, description: &str, force: bool, format: WaypointFormat) -> Result<()> {
    let output = input.with_extension(format.extension());
    check_output(&output, force)?;

    let sentences = load_capture(input)?;
    let name = file_name(input);
    let assembly = Assembler::assemble(name.clone(), &sentences);
    if assembly.is_empty() {
        let types: BTreeSet<String> = sentences.iter().map(Sentence::header).collect();
        bail!("couldn't process file of {:?} sentences", types);
    }

    let mut exporter = WaypointExporter::new(name, description);
    exporter.add_waypoints(&assembly.waypoints);
    for route in assembly.routes {
        exporter.add_route(route);
    }

    log::info!("Writing {} as {}", output.display(), format.display_name());
    exporter.export_to_file(&output, format)?;
    Ok(())
}

fn cmd_merge(
    master_path: &Path,
    update_path: &Path,
    output: Option<&Path>,
    threshold: f64,
    audit_path: Option<&Path>,
    force: bool,
    description: &str,
) -> Result<()> {
    let reconciler = Reconciler::new(threshold)?;
    if let Some(path) = output {
        check_output(path, force)?;
    }
    if let Some(path) = audit_path {
        check_output(path, force)?;
    }

    log::info!("MASTER from {}", master_path.display());
    let (master, routes) = load_waypoints(master_path, "MASTER")?;

    log::info!("UPDATE from {}", update_path.display());
    let (update, _) = load_waypoints(update_path, "UPDATE")?;
    let outcome = reconciler.merge(&master, &update);

    let mut exporter = WaypointExporter::new("merged_waypoints.gpx", description);
    exporter.add_waypoints(&outcome.merged);
    for route in routes {
        exporter.add_route(route);
    }
    match output {
        Some(path) => exporter.export_to_file(path, WaypointFormat::GPX)?,
        None => exporter.write_to(io::stdout().lock(), WaypointFormat::GPX)?,
    }

    if let Some(path) = audit_path {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &outcome.report())?;
        log::info!(
            "Audit of {} near-duplicates and {} MASTER duplicate pairs written to {}",
            outcome.audit.len(),
            outcome.master_duplicates.len(),
            path.display()
        );
    }
    Ok(())
}

/// Waypoints and routes from a GPX document or a capture JSON.
fn load_waypoints(path: &Path, name: &str) -> Result<(WaypointSet, Vec<Route>)> {
    let is_capture = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_capture {
        let sentences = load_capture(path)?;
        let assembly = Assembler::assemble(name, &sentences);
        Ok((assembly.waypoints, assembly.routes))
    } else {
        let document = read_gpx(path)?;
        let routes = document.routes.clone();
        Ok((document.into_set(name), routes))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn cmd_ports() -> Result<()> {
    let ports = list_serial_ports().context("Failed to list serial ports")?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}

fn cmd_config(config: &ToolConfig, save: bool) -> Result<()> {
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(config)?);
    if save {
        let path = config.save()?;
        log::info!("Configuration saved to {}", path.display());
    }
    Ok(())
}
