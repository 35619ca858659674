use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

use health_sentinel::config::load_config;
use health_sentinel::health::{HealthAggregator, HealthReport};
use health_sentinel::observability::logging;

/// Exit code for configuration problems, distinct from every severity.
const EXIT_CONFIG: u8 = 3;

#[derive(Parser)]
#[command(name = "health-cli")]
#[command(about = "One-shot checks and status queries for Health Sentinel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every configured service once and exit with the severity
    Check {
        #[arg(short, long, default_value = "sentinel.toml")]
        config: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Query a running sentinel's status API
    Status {
        #[arg(short, long, default_value = "http://127.0.0.1:8090")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config, json } => check(config, json).await,
        Commands::Status { url } => match status(&url).await {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn check(path: PathBuf, json: bool) -> ExitCode {
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // Logs go to stderr so stdout stays machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(logging::env_filter(&config.observability))
        .with_writer(std::io::stderr)
        .try_init();

    let report = match HealthAggregator::from_config(&config) {
        Ok(aggregator) => aggregator.run_cycle().await,
        Err(e) => Err(e),
    };

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&report);
    }

    ExitCode::from(report.summary.severity.exit_code() as u8)
}

fn print_report(report: &HealthReport) {
    for health in &report.results {
        let latency = health
            .latency_ms
            .map(|ms| format!("{:.0}ms", ms))
            .unwrap_or_else(|| "-".to_string());
        let note = health.error.as_deref().or(health.detail.as_deref()).unwrap_or("");
        println!(
            "{:<20} {:<9} {:>8}  circuit={:<9} {}",
            health.service_id,
            health.status.to_string(),
            latency,
            health.circuit.to_string(),
            note
        );
    }

    let s = &report.summary;
    println!();
    println!(
        "{} of {} healthy, {} degraded, {} down",
        s.healthy_count, s.total, s.degraded_count, s.down_count
    );
    if let Some(avg) = s.avg_latency_ms {
        println!("average latency: {:.1}ms", avg);
    }
    if !s.critical_down.is_empty() {
        println!("critical down: {}", s.critical_down.join(", "));
    }
    println!("severity: {}", s.severity);
}

/// Print the daemon's summary. Returns whether the status API answered 2xx.
async fn status(url: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder().no_proxy().build()?;
    let res = client
        .get(format!("{}/status/summary", url.trim_end_matches('/')))
        .send()
        .await?;

    let status = res.status();
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Status API returned {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(status.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        url
    }

    #[tokio::test]
    async fn test_status_reports_pending_api_as_failure() {
        let url = one_shot_server("503 Service Unavailable", r#"{"state":"pending","results":[]}"#).await;
        assert!(!status(&url).await.unwrap());
    }

    #[tokio::test]
    async fn test_status_reports_summary_as_success() {
        let url = one_shot_server("200 OK", r#"{"severity":"healthy"}"#).await;
        assert!(status(&url).await.unwrap());
    }
}
