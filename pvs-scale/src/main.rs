use clap::{Parser, Subcommand};
use serde::Serialize;
use shared::envelope::Outcome;
use shared::errors::FunctionError;
use shared::metrics_defs::MetricDef;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod config;
mod logging;

#[derive(Parser)]
#[command(version, about = "Keeps PowerVS instance sizing in a Code Engine config map")]
struct Cli {
    /// YAML file with logging, metrics and HTTP settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Invocation parameters as a JSON object. Accepted and logged only.
    #[arg(long, global = true)]
    params: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Publish the current CPU/RAM of every PVM instance to the config map
    CurrentState,
    /// Apply the desired CPU/RAM from the config map to every PVM instance
    Scale,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match config::Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => config::Config::default(),
    };

    let _sentry = logging::init(&config.logging);

    if let Some(metrics) = &config.metrics {
        let installed = shared::metrics::init_statsd(
            &metrics.statsd_host,
            metrics.statsd_port,
            &metrics.prefix,
        );
        match installed {
            Ok(()) => {
                for defs in all_metrics() {
                    shared::metrics::describe(defs);
                }
            }
            Err(e) => tracing::warn!("Metrics disabled: {e}"),
        }
    }

    if let Some(params) = &cli.params {
        match serde_json::from_str::<serde_json::Value>(params) {
            Ok(params) => tracing::debug!(%params, "Ignoring invocation parameters"),
            Err(e) => tracing::warn!("Invocation parameters are not valid JSON: {e}"),
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let outcome: Outcome<()> =
                Err(FunctionError::Internal(format!("could not start runtime: {e}"))).into();
            return emit(outcome);
        }
    };

    let timeout = config.http.timeout();
    match cli.command {
        CliCommand::CurrentState => {
            tracing::info!("Starting current-state");
            emit(runtime.block_on(publish_current_state(timeout)).into())
        }
        CliCommand::Scale => {
            tracing::info!("Starting scale");
            emit(runtime.block_on(apply_desired_state(timeout)).into())
        }
    }
}

async fn publish_current_state(
    timeout: Duration,
) -> Result<Vec<shared::desired_state::ResourceRecord>, FunctionError> {
    let config = current_state::config::Config::from_env(timeout)?;
    current_state::run(&config).await
}

async fn apply_desired_state(
    timeout: Duration,
) -> Result<scaler::apply::ApplyReport, FunctionError> {
    let config = scaler::config::Config::from_env(timeout)?;
    scaler::run(&config).await
}

fn all_metrics() -> [&'static [MetricDef]; 3] {
    [
        shared::metrics_defs::ALL_METRICS,
        current_state::metrics_defs::ALL_METRICS,
        scaler::metrics_defs::ALL_METRICS,
    ]
}

/// Prints the envelope to stdout. The exit status mirrors the outcome.
fn emit<T: Serialize>(outcome: Outcome<T>) -> ExitCode {
    let exit = if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    };

    match serde_json::to_string(&outcome.into_envelope()) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("could not serialize response: {e}");
            return ExitCode::FAILURE;
        }
    }

    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique() {
        let defs: Vec<_> = all_metrics().into_iter().flatten().collect();
        let names: HashSet<_> = defs.iter().map(|def| def.name).collect();
        assert_eq!(names.len(), defs.len());
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pvs-scale",
            "scale",
            "--config",
            "/etc/pvs-scale.yaml",
            "--params",
            "{}",
        ])
        .unwrap();

        assert!(matches!(cli.command, CliCommand::Scale));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/pvs-scale.yaml")));
        assert_eq!(cli.params.as_deref(), Some("{}"));
    }
}
