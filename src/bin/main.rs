//! portos CLI - WSL port proxying and service auto-start

use clap::{Parser, Subcommand};
use portos::models::{Distribution, Service};
use portos::reconcile::ReconcileReport;
use portos::{Portos, PortosConfig, Result, Settings};
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};

#[derive(Parser)]
#[command(name = "portos")]
#[command(about = "Proxy WSL distribution ports to the Windows host and keep their services running")]
#[command(version)]
struct Cli {
    /// Path to the settings file
    #[arg(long, global = true, default_value = "portos.json")]
    settings: PathBuf,

    /// Seconds to wait for each wsl.exe / netsh.exe call
    #[arg(long, global = true, default_value = "30")]
    timeout: u64,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List distributions with their details
    List,
    /// Start a distribution
    Start {
        /// Distribution name
        name: String,
    },
    /// Terminate a distribution
    Terminate {
        /// Distribution name
        name: String,
    },
    /// Make host proxy rules match the configured ports
    Map,
    /// Start configured services that are not running
    Autostart,
    /// Start or stop a service inside a distribution
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Show host proxy rules
    Proxies,
    /// Map ports, start services and update the settings file
    Refresh,
}

#[derive(Subcommand)]
enum ServiceAction {
    /// Start a service
    Start {
        /// Distribution name
        distro: String,
        /// Service name
        service: String,
    },
    /// Stop a service
    Stop {
        /// Distribution name
        distro: String,
        /// Service name
        service: String,
    },
}

#[derive(Tabled)]
struct DistroRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "WSL")]
    version: u8,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Kernel")]
    kernel: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "Services")]
    services: String,
}

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct ProxyRow {
    #[tabled(rename = "Listen")]
    listen: String,
    #[tabled(rename = "Connect")]
    connect: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "portos=debug" } else { "portos=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.parse().expect("static filter directive")),
        )
        .init();

    let config = PortosConfig::builder()
        .command_timeout(Duration::from_secs(cli.timeout))
        .build();
    let portos = Portos::new(config)?;

    match cli.command {
        Commands::List => {
            let settings = Settings::load(&cli.settings)?;
            let distros = portos.list_distributions().await?;
            print_distributions(&settings.visible(&distros));
        }
        Commands::Start { name } => {
            portos.start_distribution(&name).await?;
            println!("Distribution started: {}", name);
        }
        Commands::Terminate { name } => {
            portos.terminate_distribution(&name).await?;
            println!("Distribution terminated: {}", name);
        }
        Commands::Map => {
            let settings = Settings::load(&cli.settings)?;
            let report = portos.map_ports(&settings.distros).await?;
            print_report("Proxy rules", &report);
        }
        Commands::Autostart => {
            let settings = Settings::load(&cli.settings)?;
            let report = portos.auto_start_services(&settings.distros).await?;
            print_report("Services", &report);
        }
        Commands::Service { action } => {
            let (distro, service, running) = match action {
                ServiceAction::Start { distro, service } => (distro, service, true),
                ServiceAction::Stop { distro, service } => (distro, service, false),
            };
            let services = portos.set_service_state(&distro, &service, running).await?;
            print_services(&services);
        }
        Commands::Proxies => {
            let table = portos.proxies().await?;
            if table.is_empty() {
                println!("No proxy rules.");
                return Ok(());
            }

            let rows: Vec<ProxyRow> = table
                .rules()
                .map(|(ip, port, source)| ProxyRow {
                    listen: format!("{}:{}", source.ip, source.port),
                    connect: format!("{}:{}", ip, port),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        Commands::Refresh => {
            let mut settings = Settings::load(&cli.settings)?;
            let refresh = portos.refresh(&mut settings).await?;

            match &refresh.ports {
                Ok(report) => print_report("Proxy rules", report),
                Err(e) => println!("Port mapping failed: {}", e),
            }
            match &refresh.services {
                Ok(report) => print_report("Services", report),
                Err(e) => println!("Service auto-start failed: {}", e),
            }
            if refresh.settings_changed {
                settings.save(&cli.settings)?;
                println!("Settings updated: {}", cli.settings.display());
            }
            print_distributions(&settings.visible(&refresh.distributions));
        }
    }

    Ok(())
}

fn print_distributions(distros: &[&Distribution]) {
    if distros.is_empty() {
        println!("No distributions installed.");
        return;
    }

    let rows: Vec<DistroRow> = distros
        .iter()
        .map(|d| DistroRow {
            name: d.name.clone(),
            state: d.state.to_string(),
            version: d.wsl_version,
            os: d.distribution.to_string(),
            kernel: d.kernel_version.clone().unwrap_or_else(|| "-".to_string()),
            ip: d.ip.map(|ip| ip.to_string()).unwrap_or_else(|| "-".to_string()),
            ports: d
                .ports
                .as_ref()
                .map(|ports| {
                    ports
                        .iter()
                        .map(|p| format!("{}/{}", p.port, p.transport))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_else(|| "-".to_string()),
            services: d
                .services
                .as_ref()
                .map(|services| services.iter().filter(|s| s.is_running()).count().to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("{}", Table::new(rows));

    for distro in distros {
        for failure in &distro.failures {
            println!("  {}: {:?} failed: {}", distro.name, failure.query, failure.error);
        }
    }
}

fn print_services(services: &[Service]) {
    let rows: Vec<ServiceRow> = services
        .iter()
        .map(|s| ServiceRow {
            name: s.name.clone(),
            status: s.status.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

fn print_report<A: Display>(label: &str, report: &ReconcileReport<A>) {
    if report.applied.is_empty() && report.failed.is_empty() && report.skipped.is_empty() {
        println!("{}: nothing to do", label);
        return;
    }

    println!("{}: {} applied, {} failed", label, report.applied.len(), report.failed.len());
    for action in &report.applied {
        println!("  ok      {}", action);
    }
    for failed in &report.failed {
        println!("  failed  {}: {}", failed.action, failed.error);
    }
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.distro, skipped.reason);
    }
}
