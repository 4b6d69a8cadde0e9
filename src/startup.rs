//! Startup banner and worker status display.

use crate::config::{Config, VERSION};

mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

pub struct WorkerStatus {
    pub name: &'static str,
    pub enabled: bool,
    pub description: String,
}

/// Prints the startup banner and which workers the supervisor is about to
/// start, run before the supervisor takes over.
pub fn print_startup(config: &Config) {
    use colors::*;

    println!();
    println!("  {BOLD}{CYAN}fleetwatch{RESET} {DIM}v{VERSION}{RESET}");
    println!("  {DIM}Container fleet monitoring and reporting{RESET}");
    println!();

    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("  {DIM}Config:{RESET} {GREEN}\u{2713}{RESET} {}", path.display());
        } else {
            println!("  {DIM}Config:{RESET} {DIM}(using defaults){RESET}");
        }
    }
    println!();

    println!("  {DIM}Starting workers...{RESET}");
    for worker in worker_status(config) {
        print_worker_status(&worker);
    }
    println!();

    println!("  {DIM}Index:{RESET} {}", config.index.url);
    if config.demo {
        println!("  {YELLOW}\u{25b8}{RESET} {YELLOW}Demo mode active{RESET} {DIM}(in-memory adapters){RESET}");
    }
    println!();
}

/// By the time this runs, `main` has already enforced spec §7's Fatal
/// startup check: the report worker always runs from here on, either with
/// a configured mailer or (only in `--demo`) the in-memory one. There is no
/// "disabled" state left to report once this code is reached.
fn worker_status(config: &Config) -> Vec<WorkerStatus> {
    vec![
        WorkerStatus {
            name: "health",
            enabled: true,
            description: format!("sampling every {}s", config.health_interval.as_secs()),
        },
        WorkerStatus {
            name: "report",
            enabled: true,
            description: if config.report_enabled {
                format!("every {}s", config.report_interval.as_secs())
            } else {
                format!("every {}s (demo mailer, no SMTP configured)", config.report_interval.as_secs())
            },
        },
    ]
}

fn print_worker_status(worker: &WorkerStatus) {
    use colors::*;

    let (icon, style) = if worker.enabled {
        (format!("{GREEN}\u{2713}{RESET}"), "")
    } else {
        (format!("{DIM}\u{25cb}{RESET}"), DIM)
    };

    println!(
        "    {icon} {style}{:<10}{RESET} {DIM}{}{RESET}",
        worker.name, worker.description
    );
}

/// Mirrors `print_startup` to the tracing log stream, for headless/daemon
/// runs where the banner matters in the log file too.
pub fn log_startup(config: &Config) {
    tracing::info!("fleetwatch v{} starting", VERSION);
    for worker in worker_status(config) {
        tracing::info!(
            worker = worker.name,
            enabled = worker.enabled,
            "{}",
            worker.description
        );
    }
    if config.demo {
        tracing::info!("demo mode active (in-memory adapters)");
    }
}
