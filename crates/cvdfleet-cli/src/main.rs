//! cvdfleet CLI
//!
//! Command-line control surface for a cloud virtual-device provisioning
//! service: register runtimes, create hosts and CVD environments, watch
//! operations settle.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use cvdfleet_api::events::FleetEvent;
use cvdfleet_core::{
    Action, Controller, Environment, Runtime, RuntimeStatus,
};

mod config;
mod factory;

use factory::HttpBackendFactory;

#[derive(Parser)]
#[command(name = "cvdfleet")]
#[command(about = "Control surface for cloud virtual device fleets", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the control-plane URL
    #[arg(long, global = true)]
    service_url: Option<String>,

    /// Override the zone
    #[arg(long, global = true)]
    zone: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage control-plane runtimes
    Runtime {
        #[command(subcommand)]
        command: RuntimeCommands,
    },
    /// Manage host instances
    Host {
        #[command(subcommand)]
        command: HostCommands,
    },
    /// Manage CVD environments
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
    /// List virtual devices on a host
    Devices {
        /// Host name
        host: String,
    },
    /// Fetch operation status by wait URL
    Operation {
        /// Wait URL as returned by a create request
        wait_url: String,
    },
    /// Dispatch a raw action as JSON and print the resulting state
    Dispatch {
        /// Action JSON, e.g. '{"type":"runtime-refresh-start"}'
        json: String,
    },
}

#[derive(Subcommand)]
enum RuntimeCommands {
    /// Register a runtime endpoint
    Register { alias: String, url: String },
    /// Unregister a runtime
    Unregister { alias: String },
    /// List known runtimes
    List,
    /// Refresh all known runtimes
    Refresh,
}

#[derive(Subcommand)]
enum HostCommands {
    /// Create a host instance
    Create {
        /// Disk size in GB
        #[arg(long)]
        disk_size_gb: Option<u32>,
        /// Machine type
        #[arg(long)]
        machine_type: Option<String>,
        /// Minimum CPU platform
        #[arg(long)]
        min_cpu_platform: Option<String>,
        /// Print the wait URL and return instead of waiting for readiness
        #[arg(long)]
        no_wait: bool,
    },
    /// List host instances
    List,
}

#[derive(Subcommand)]
enum EnvCommands {
    /// Create a CVD environment on a host
    Create {
        name: String,
        /// Host the devices run on
        #[arg(long)]
        host: String,
        /// Number of device instances
        #[arg(long)]
        instances: Option<u32>,
    },
    /// Delete a CVD environment
    Delete {
        name: String,
        /// Host the environment runs on
        #[arg(long)]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_ref())?;
    if let Some(url) = cli.service_url {
        config.service_url = url;
    }
    if let Some(zone) = cli.zone {
        config.zone = zone;
    }

    let controller = Controller::spawn(config, Arc::new(HttpBackendFactory::new())).await?;
    seed_runtimes(&controller).await?;

    let outcome = run(&controller, cli.command).await;
    controller.shutdown().await.ok();
    outcome
}

/// Load preconfigured runtime endpoints into the store, unverified until
/// the next refresh
async fn seed_runtimes(controller: &Controller) -> Result<()> {
    for endpoint in controller.config().runtime.clone() {
        controller
            .dispatch(Action::RuntimeLoad {
                runtime: Runtime {
                    alias: endpoint.alias,
                    url: endpoint.url,
                    status: RuntimeStatus::Pending,
                    initialized: false,
                    refreshed_at: None,
                },
            })
            .await?;
    }
    Ok(())
}

async fn run(controller: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::Runtime { command } => runtime_command(controller, command).await,
        Commands::Host { command } => host_command(controller, command).await,
        Commands::Env { command } => env_command(controller, command).await,
        Commands::Devices { host } => {
            let devices = controller.list_devices(&host).await?;
            if devices.is_empty() {
                println!("no devices on {host}");
            }
            for device in devices {
                match device.group_id {
                    Some(group) => println!("{}\t{group}", device.device_id),
                    None => println!("{}", device.device_id),
                }
            }
            Ok(())
        }
        Commands::Operation { wait_url } => {
            let op = controller.get_operation(&wait_url).await?;
            println!("{}", serde_json::to_string_pretty(&op)?);
            Ok(())
        }
        Commands::Dispatch { json } => {
            let value: serde_json::Value = serde_json::from_str(&json)?;
            let state = controller.dispatch_json(&value).await?;
            println!("{}", serde_json::to_string_pretty(&*state)?);
            Ok(())
        }
    }
}

async fn runtime_command(controller: &Controller, command: RuntimeCommands) -> Result<()> {
    match command {
        RuntimeCommands::Register { alias, url } => {
            let mut events = controller.subscribe_events().await?;
            controller.register_runtime(&alias, &url).await?;
            loop {
                match events.recv().await? {
                    FleetEvent::RuntimeInitialized { alias: ready } if ready == alias => {
                        println!("runtime {alias} registered");
                        return Ok(());
                    }
                    FleetEvent::RuntimeRegisterFailed => {
                        eyre::bail!("registration of {alias} failed");
                    }
                    _ => {}
                }
            }
        }
        RuntimeCommands::Unregister { alias } => {
            controller.unregister_runtime(&alias).await?;
            println!("runtime {alias} unregistered");
            Ok(())
        }
        RuntimeCommands::List => {
            print_runtimes(controller).await
        }
        RuntimeCommands::Refresh => {
            let mut events = controller.subscribe_events().await?;
            controller.refresh_runtimes().await?;
            loop {
                if let FleetEvent::RuntimeRefreshCompleted = events.recv().await? {
                    break;
                }
            }
            print_runtimes(controller).await
        }
    }
}

async fn print_runtimes(controller: &Controller) -> Result<()> {
    let snapshot = controller.snapshot().await?;
    if snapshot.runtimes.is_empty() {
        println!("no runtimes");
        return Ok(());
    }
    for runtime in snapshot.runtimes.values() {
        let status = match runtime.status {
            RuntimeStatus::Pending => "pending",
            RuntimeStatus::Registered => "registered",
            RuntimeStatus::Error => "error",
        };
        let active = if snapshot.active_runtime.as_deref() == Some(runtime.alias.as_str()) {
            " *"
        } else {
            ""
        };
        println!("{}\t{status}\t{}{active}", runtime.alias, runtime.url);
    }
    Ok(())
}

async fn host_command(controller: &Controller, command: HostCommands) -> Result<()> {
    match command {
        HostCommands::Create {
            disk_size_gb,
            machine_type,
            min_cpu_platform,
            no_wait,
        } => {
            let mut defaults = controller.config().host.clone();
            if let Some(disk) = disk_size_gb {
                defaults.disk_size_gb = disk;
            }
            if let Some(machine) = machine_type {
                defaults.machine_type = machine;
            }
            if let Some(platform) = min_cpu_platform {
                defaults.min_cpu_platform = platform;
            }

            let mut events = controller.subscribe_events().await?;
            let wait_url = controller.create_host(Some(defaults.to_request())).await?;
            println!("host requested, wait: {wait_url}");
            if no_wait {
                return Ok(());
            }

            loop {
                match events.recv().await? {
                    FleetEvent::HostReady { wait_url: ready, name } if ready == wait_url => {
                        println!("host {name} ready");
                        return Ok(());
                    }
                    FleetEvent::HostFailed { wait_url: failed }
                        if failed.is_none()
                            || failed.as_deref() == Some(wait_url.as_str()) =>
                    {
                        eyre::bail!("host creation failed, wait: {wait_url}");
                    }
                    _ => {}
                }
            }
        }
        HostCommands::List => {
            let response = controller.list_hosts().await?;
            if response.hosts.is_empty() {
                println!("no hosts");
            }
            for host in response.hosts {
                let machine = host
                    .gcp
                    .map(|gcp| gcp.machine_type)
                    .unwrap_or_default();
                println!("{}\t{machine}", host.name);
            }
            Ok(())
        }
    }
}

async fn env_command(controller: &Controller, command: EnvCommands) -> Result<()> {
    match command {
        EnvCommands::Create {
            name,
            host,
            instances,
        } => {
            let env = build_env(controller, name.clone(), host, instances).await?;
            controller.create_environment(env).await?;
            println!("environment {name} requested, settles via refresh");
            Ok(())
        }
        EnvCommands::Delete { name, host } => {
            let target = build_env(controller, name.clone(), host, None).await?;
            controller.delete_environment(target).await?;
            println!("environment {name} delete requested");
            Ok(())
        }
    }
}

async fn build_env(
    controller: &Controller,
    name: String,
    host: String,
    instances: Option<u32>,
) -> Result<Environment> {
    let snapshot = controller.snapshot().await?;
    let runtime_alias = snapshot
        .active_runtime
        .clone()
        .unwrap_or_else(|| "default".to_string());
    let devices = instances
        .map(|count| (1..=count).map(|i| format!("{name}-{i}")).collect())
        .unwrap_or_default();
    Ok(Environment {
        name,
        runtime_alias,
        host,
        devices,
    })
}
