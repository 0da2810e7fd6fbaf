use std::path::PathBuf;

use anyhow::{Context, Result};
use broker_runner::{build_target, run_binary, summary, BrokerEndpoint, Manifest};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "broker-runner", about = "Two-phase build-then-execute harness for test binaries")]
struct Cli {
    /// Path to the manifest of test targets.
    #[arg(short, long, default_value = "runner.toml")]
    manifest: PathBuf,

    /// Address of a running broker to pass to each test binary via BROKER_ADDR.
    #[arg(long)]
    broker_addr: Option<String>,

    /// Secret to pass alongside --broker-addr via BROKER_SECRET.
    #[arg(long)]
    broker_secret: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".parse().unwrap()))
        .init();

    let cli = Cli::parse();
    let manifest = Manifest::from_file(&cli.manifest).context("loading runner manifest")?;

    let endpoint = match (cli.broker_addr, cli.broker_secret) {
        (Some(addr), Some(secret)) => Some(BrokerEndpoint { addr, secret }),
        _ => None,
    };

    let mut rows = Vec::new();
    for target in &manifest.targets {
        info!(target = %target.crate_name, "building");
        let build = build_target(target);
        if !build.success {
            rows.push(summary::Row {
                target: build.target.clone(),
                binary: "(build failed)".to_string(),
                build_ok: false,
                run_ok: None,
                duration: build.duration,
            });
            continue;
        }

        for binary in &build.binaries {
            info!(target = %target.crate_name, binary = %binary.display(), "running");
            let run = run_binary(binary, endpoint.as_ref());
            if !run.passed {
                eprintln!("--- {} stdout ---\n{}", run.binary, run.stdout);
                eprintln!("--- {} stderr ---\n{}", run.binary, run.stderr);
            }
            rows.push(summary::Row {
                target: build.target.clone(),
                binary: run.binary,
                build_ok: true,
                run_ok: Some(run.passed),
                duration: build.duration + run.duration,
            });
        }
    }

    println!("{}", summary::render(&rows));

    let any_failed = rows.iter().any(|r| !r.build_ok || r.run_ok == Some(false));
    if any_failed {
        std::process::exit(1);
    }
    Ok(())
}
