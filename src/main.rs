//! Backend Oracle - CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use backend_oracle::{
    cli::{self, Args, Commands},
    config::Config,
    doctor::Doctor,
    logging, server,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    match args.command() {
        Commands::Serve { host, port } => run_server(load_config(&args)?, host, port).await?,
        Commands::Ask { question } => run_ask(&load_config(&args)?, &question).await?,
        // doctor reports bad configuration instead of refusing to start
        Commands::Doctor => run_doctor(Config::load_unvalidated(args.config.clone())).await,
        Commands::Config => show_config(&load_config(&args)?)?,
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    Config::load(args.config.clone()).context("Failed to load configuration")
}

async fn run_server(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    server::serve(config).await.context("Server failed")?;
    Ok(())
}

async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let response = cli::ask(config, question).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run_doctor(loaded: backend_oracle::Result<Config>) {
    let doctor = Doctor::from_load(loaded);
    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    if Doctor::overall_status(&checks) {
        println!("{}", "All checks passed".green());
        std::process::exit(0);
    }
    println!("{}", "Some checks failed".red());
    std::process::exit(1);
}

fn show_config(config: &Config) -> Result<()> {
    if let Some(path) = Config::default_path() {
        println!("# default location: {}", path.display());
    }
    print!("{}", cli::render_config(config)?);
    Ok(())
}
