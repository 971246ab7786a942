//! # Workflow Host Daemon
//!
//! Main entry point for the workflow demo host.

use std::env;
use std::process;
use tracing_subscriber::EnvFilter;
use workflow::protocol::ChannelPaths;
use workflow::WorkflowConfig;
use workflowd::{CallOutcome, HostRuntime, HostRuntimeConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("workflowd");

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(program);
        process::exit(1);
    });

    let runtime = HostRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to create runtime: {}", e);
        process::exit(1);
    });

    let executor = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Failed to start async runtime: {}", e);
            process::exit(1);
        });

    match executor.block_on(runtime.run()) {
        Ok(report) => {
            for (index, outcome) in report.outcomes.iter().enumerate() {
                match outcome {
                    CallOutcome::Completed(result) => {
                        println!("call {}: {} (processed {})", index, result.message, result.processed)
                    }
                    CallOutcome::Cancelled => println!("call {}: cancelled", index),
                    CallOutcome::Failed(message) => println!("call {}: failed: {}", index, message),
                }
            }
            println!(
                "{} completed, {} cancelled; host saw {} calls",
                report.completed(),
                report.cancelled(),
                report.status.calls
            );
        }
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Result<HostRuntimeConfig, String> {
    let workflow = WorkflowConfig::from_env().map_err(|e| e.to_string())?;
    let mut config = HostRuntimeConfig {
        workflow,
        ..HostRuntimeConfig::default()
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--calls" | "-n" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --calls".to_string());
                }
                config.calls = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid calls value: {}", args[i]))?;
            }
            "--delay-ms" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --delay-ms".to_string());
                }
                config.delay_ms = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid delay-ms value: {}", args[i]))?;
            }
            "--cancel-after-ms" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --cancel-after-ms".to_string());
                }
                config.cancel_after_ms = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("Invalid cancel-after-ms value: {}", args[i]))?,
                );
            }
            "--resolve-on-cancel" => {
                config.workflow.resolve_on_cancel = true;
            }
            "--prefix" | "-p" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --prefix".to_string());
                }
                config.workflow.paths = ChannelPaths::with_prefix(&args[i]);
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -n, --calls <N>            Concurrent /greet calls (default 3)");
    eprintln!("  --delay-ms <MS>            Base handler delay; call i waits MS * (i + 1)");
    eprintln!("  --cancel-after-ms <MS>     Cancel every call after MS milliseconds");
    eprintln!("  --resolve-on-cancel        Return as soon as a call is cancelled");
    eprintln!("  -p, --prefix <PATH>        Channel path prefix (default /workflow)");
    eprintln!("  -h, --help                 Show this help message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  WORKFLOW_PATH_PREFIX, WORKFLOW_RESOLVE_ON_CANCEL, WORKFLOW_MAX_PENDING");
    eprintln!("  RUST_LOG                   Log filter (default info)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --calls 5 --delay-ms 50", program);
    eprintln!("  {} --cancel-after-ms 120 --resolve-on-cancel", program);
}
