mod cli;

use livecam::config::{self, LoadedConfig};
use livecam::driver;
use livecam::service::{CameraService, Registries};
use livecam::sink::{MemorySink, ObjectSink};
use livecam_av::{ffmpeg::DEFAULT_BINARY, tools};
use livecam_core::{ConfigNode, DriverState, Error};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn build_service(loaded: &LoadedConfig, sink: Arc<dyn ObjectSink>) -> Result<CameraService> {
    CameraService::from_config(&loaded.root, sink, &Registries::builtin())
        .with_context(|| format!("Invalid camera config in {:?}", loaded.path))
}

async fn run_camera(config_path: Option<&Path>) -> Result<()> {
    let loaded = config::load_config_or_search(config_path)?;
    let sink = config::build_sink(&loaded.host.sink)?;
    let service = build_service(&loaded, sink)?;

    let mut states = service.subscribe();
    service.start()?;
    tracing::info!("Streaming camera {}; press Ctrl-C to stop", service.camera());

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Shutting down...");
            match service.stop() {
                // The encoder may have exited while the signal was delivered.
                Ok(()) | Err(Error::NotStoppable) => {}
                Err(e) => return Err(e.into()),
            }
        }
        _ = states.wait_for(|state| *state == DriverState::Off) => {
            tracing::warn!("Encoder exited; camera {} is off", service.camera());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "livecam=trace,livecam_av=trace,livecam_core=debug".to_string()
        } else {
            "livecam=info,livecam_av=info,livecam_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_camera(cli.config.as_deref()))
        }
        Commands::Render { json } => render(cli.config.as_deref(), json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Version => {
            println!("livecam {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn render(config_path: Option<&Path>, json: bool) -> Result<()> {
    let loaded = config::load_config_or_search(config_path)?;
    let service = build_service(&loaded, Arc::new(MemorySink::new()))?;
    let plan = service.render()?;

    if json {
        let value = serde_json::json!({
            "camera": service.camera(),
            "program": plan.command.program(),
            "args": plan.command.get_args(),
            "endpoint": plan.endpoint,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Command: {}", plan.command);
        println!("Endpoint: {}", plan.endpoint);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let loaded = config::load_config_or_search(path)?;
    println!("Validating config: {:?}", loaded.path);

    let service = build_service(&loaded, Arc::new(MemorySink::new()))?;
    let plan = service
        .render()
        .with_context(|| format!("Invalid camera config in {:?}", loaded.path))?;

    println!("✓ Configuration is valid");
    println!("  Camera: {}", service.camera());
    println!("  Driver: {}", loaded.root.get_str("driver.name"));
    println!("  Encoder: {}", plan.command.program());
    match loaded.host.sink.dir {
        Some(ref dir) => println!("  Sink: {}", dir.display()),
        None => println!("  Sink: memory"),
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let binary = match config::load_config_or_search(config_path) {
        Ok(loaded) => {
            let driver_node = loaded.root.sub("driver").unwrap_or_else(ConfigNode::empty);
            driver::encoder_binary(&driver_node)
        }
        Err(e) => {
            tracing::debug!("No usable config ({e:#}); checking {DEFAULT_BINARY}");
            DEFAULT_BINARY.to_string()
        }
    };

    let tool = tools::inspect(&binary);
    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);
    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }
    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }
    println!();

    println!();
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("The encoder is missing. Install it or point the config at it.");
    }

    Ok(())
}
