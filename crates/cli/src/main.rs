// SPDX-License-Identifier: MIT

//! `flowctl`: a small operator binary exercising the engine's library
//! crates directly — it stands in for the
//! out-of-scope HTTP/REST surface so the core is runnable
//! end to end without one.

mod approval;
mod commands;
mod config;
mod registries;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::EngineArgs;
use flowctl_core::ExecId;
use flowctl_storage::migrations;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flowctl", version, about = "Workflow execution engine operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trigger a flow manually from a YAML definition.
    Trigger {
        /// Path to the flow's YAML definition.
        flow: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
        /// Declared input, as `name=value` (repeatable). Values are parsed
        /// as JSON when possible, else kept as a plain string.
        #[arg(long = "input", value_parser = parse_kv)]
        inputs: Vec<(String, String)>,
        /// Namespace/flow secret, as `name=value` (repeatable), exposed to
        /// interpolation expressions as `secrets.<name>`.
        #[arg(long = "secret", value_parser = parse_kv)]
        secrets: Vec<(String, String)>,
    },
    /// Print an execution's status and event stream.
    Status {
        #[arg(value_parser = parse_exec_id)]
        exec_id: ExecId,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Cancel a queued or running execution.
    Cancel {
        #[arg(value_parser = parse_exec_id)]
        exec_id: ExecId,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Approve a suspended action and resume its execution.
    Approve {
        #[arg(value_parser = parse_exec_id)]
        exec_id: ExecId,
        action_id: String,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Run the worker pool (and, optionally, the cron provider) until ctrl-c.
    Worker {
        #[command(flatten)]
        engine: EngineArgs,
        /// Directory of flow YAML files carrying a `schedule` to register
        /// with the cron provider.
        #[arg(long)]
        flows_dir: Option<PathBuf>,
    },
    /// Print (or list) an executor's `with`-block JSON Schema.
    Schema { executor: Option<String> },
}

fn parse_kv(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_exec_id(raw: &str) -> Result<ExecId, String> {
    raw.parse::<uuid::Uuid>().map(ExecId).map_err(|e| e.to_string())
}

async fn connect(engine: &EngineArgs) -> Result<sqlx::PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&engine.database_url)
        .await
        .context("connecting to Postgres")?;
    migrations::run(&pool).await.context("running schema migrations")?;
    Ok(pool)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Trigger { flow, engine, inputs, secrets } => {
            let pool = connect(&engine).await?;
            let max_retries = engine.to_engine_config().max_retries;
            let exec_id = commands::trigger::run(&pool, &flow, &inputs, &secrets, max_retries).await?;
            println!("{exec_id}");
        }
        Command::Status { exec_id, engine } => {
            let pool = connect(&engine).await?;
            commands::status::run(&pool, exec_id).await?;
        }
        Command::Cancel { exec_id, engine } => {
            let pool = connect(&engine).await?;
            commands::cancel::run(&pool, exec_id).await?;
        }
        Command::Approve { exec_id, action_id, engine } => {
            let pool = connect(&engine).await?;
            let max_retries = engine.to_engine_config().max_retries;
            commands::approve::run(&pool, exec_id, &action_id, max_retries).await?;
        }
        Command::Worker { engine, flows_dir } => {
            let pool = connect(&engine).await?;
            let config = engine.to_engine_config();
            commands::worker::run(&pool, config, flows_dir.as_deref()).await?;
        }
        Command::Schema { executor } => {
            commands::schema::run(executor.as_deref())?;
        }
    }
    Ok(())
}
