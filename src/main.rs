// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

use clap::Parser;
use rabbitmq_provisioner::{channel::AmqpBroker, configs::Configs, provision::provision};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "rabbitmq-provisioner";

/// Declares the RabbitMQ queues listed in a configuration file
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version)]
struct Cli {
    /// Path of the JSON configuration file
    #[arg(short = 'c', long = "config", value_name = "PATH", env = "CONFIG_PATH")]
    #[arg(default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let cfg = match Configs::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(kind = "config", error = err.to_string(), "error loading config");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = async {
        // without a signal handler the run simply cannot be interrupted
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    match provision(AmqpBroker::new(APP_NAME), &cfg, shutdown).await {
        Ok(()) => {
            info!("rabbitmq queues successfully created");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(kind = err.kind(), error = err.to_string(), "failed to create queues");
            ExitCode::FAILURE
        }
    }
}
