use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use colored::*;
use log::debug;
use std::path::PathBuf;
use std::process;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use portsweep::{
    config::ScanConfig,
    output::{OutputConfig, OutputFormat, OutputManager, ProgressDisplay, ServiceTable},
    port_lists::all_port_lists,
    ScanEngine, ScanError, ScanProgress,
};

const EXIT_FAILURE: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

fn build_cli() -> Command {
    Command::new("portsweep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve a URL or hostname and check which TCP ports accept connections")
        .after_help(
            "Examples:\n  portsweep scanme.nmap.org\n  portsweep https://example.com\n  \
             portsweep 192.168.1.1 -p 22,80,443,8080\n  portsweep example.com -p 1-1024 -w 100\n  \
             portsweep example.com -p important --json",
        )
        .arg(
            Arg::new("target")
                .value_name("TARGET")
                .help("Target URL or hostname (e.g. example.com or https://example.com)")
                .required_unless_present("list-ports")
                .index(1),
        )
        .arg(
            Arg::new("ports")
                .short('p')
                .long("ports")
                .value_name("SPEC")
                .help("Ports to scan: \"22,80,443\", \"1-1024\", or a list name (default, important)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Connection timeout in seconds (default: 1.0)")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .value_name("COUNT")
                .help("Maximum number of concurrent probes (default: 20)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("sequential")
                .short('s')
                .long("sequential")
                .help("Probe one port at a time")
                .action(ArgAction::SetTrue)
                .conflicts_with("workers"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print every port as it is checked")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the report to FILE instead of stdout")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("hide-closed")
                .long("hide-closed")
                .help("Only list open ports in the text report")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Load settings from a TOML file instead of ~/.portsweep.toml")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("ulimit")
                .short('u')
                .long("ulimit")
                .value_name("LIMIT")
                .help("Raise the open file limit before scanning")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .help("Show the built-in port lists and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_module("portsweep", log::LevelFilter::Debug);
    }
    builder.init();
}

// Ulimit adjustment for Unix systems
#[cfg(unix)]
fn adjust_ulimit_size(ulimit: Option<u64>) {
    use rlimit::Resource;

    if let Some(limit) = ulimit {
        match Resource::NOFILE.set(limit, limit) {
            Ok(()) => debug!("Open file limit raised to {}", limit),
            Err(e) => eprintln!("{} {}", "[!] Failed to set ulimit:".bright_yellow(), e),
        }
    }

    if let Ok((soft, _)) = Resource::NOFILE.get() {
        debug!("Open file limit is {}", soft);
    }
}

#[cfg(not(unix))]
fn adjust_ulimit_size(_ulimit: Option<u64>) {}

fn load_config(matches: &ArgMatches) -> anyhow::Result<ScanConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ScanConfig::from_toml_file(path)?,
        None => ScanConfig::load_default_config(),
    };

    if let Some(ports) = matches.get_one::<String>("ports") {
        config = config.with_ports(ports.clone());
    }
    if let Some(&timeout) = matches.get_one::<f64>("timeout") {
        config = config.with_timeout(timeout);
    }
    if let Some(&workers) = matches.get_one::<usize>("workers") {
        config = config.with_max_workers(workers);
    }
    if matches.get_flag("sequential") {
        config = config.with_max_workers(1);
    }
    if matches.get_flag("verbose") {
        config = config.with_verbose(true);
    }
    if matches.get_flag("json") {
        config.output_format = OutputFormat::Json;
    }
    if matches.get_flag("hide-closed") {
        config.show_closed = false;
    }
    if matches.get_flag("no-color") {
        config.colored = false;
    }

    config.validate()?;
    Ok(config)
}

fn print_port_lists() {
    println!("Available port lists:");
    for list in all_port_lists() {
        let ports: Vec<String> = list.ports.iter().map(|p| p.to_string()).collect();
        println!("  {} {}", format!("{:<10}", list.name).bright_cyan(), list.description);
        println!("  {:<10} {}", "", ports.join(","));
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    if matches.get_flag("list-ports") {
        print_port_lists();
        return Ok(());
    }

    let target = matches
        .get_one::<String>("target")
        .ok_or_else(|| anyhow::anyhow!("No target given"))?;
    let config = load_config(matches)?;

    let request = config.scan_request(target);
    let (ports, timeout) = request.validate()?;
    let text_mode = config.output_format == OutputFormat::Text;

    adjust_ulimit_size(matches.get_one::<u64>("ulimit").copied());

    if text_mode {
        eprintln!(
            "{} {} ports on {} ({} workers, {:.1}s timeout)",
            "[*] Scanning".bright_blue(),
            ports.len(),
            target.bright_cyan(),
            request.max_workers,
            timeout.as_secs_f64()
        );
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", "[!] Scan interrupted by user".bright_red());
            interrupt.cancel();
        }
    });

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ScanProgress>();
    let display = text_mode.then(|| ProgressDisplay::new(ports.len(), config.verbose));
    let display_task = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            if let Some(display) = &display {
                display.update(&progress);
            }
        }
        if let Some(display) = &display {
            display.finish();
        }
    });

    let engine = ScanEngine::new(timeout, request.max_workers)
        .with_progress(progress_tx)
        .with_cancellation(cancel);
    let result = engine.scan(&request.target, &ports).await;
    drop(engine);
    let _ = display_task.await;
    let report = result?;

    let output = OutputManager::new(
        OutputConfig {
            format: config.output_format,
            file: matches.get_one::<PathBuf>("output").cloned(),
            colored: config.colored,
            show_closed: config.show_closed,
        },
        ServiceTable::well_known(),
    );
    output.write_report(&report)?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("debug"));

    if let Err(e) = run(&matches).await {
        eprintln!("\n{} {:#}", "[!] Error:".bright_red(), e);
        let code = match e.downcast_ref::<ScanError>() {
            Some(ScanError::Interrupted { .. }) => EXIT_INTERRUPTED,
            _ => EXIT_FAILURE,
        };
        process::exit(code);
    }
}
