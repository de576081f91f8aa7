use redisio::cli::Cli;
use redisio::config::Config;
use redisio::error::AppError;
use redisio::telemetry::{init_telemetry_with_config, TelemetryConfig};
use redisio::{bulk, Client, Error};
use std::io;
use std::process::ExitCode;
use tracing::{debug, error, Level};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.examples {
        Cli::print_examples();
        return ExitCode::SUCCESS;
    }

    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("redisio: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let config = Config::from_sources(&cli)?;
    let telemetry = init_telemetry_with_config(TelemetryConfig {
        enable_metrics: cli.metrics,
    })?;

    let mut client = Client::new(config);
    debug!("Using {}", client);

    let code = if cli.reads_stdin() {
        let summary = bulk::mass_insert(&mut client, io::stdin().lock(), cli.batch_size)?;
        println!("{}", summary);
        if summary.errors > 0 || summary.invalid_lines > 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    } else {
        let (name, args) = cli
            .command
            .split_first()
            .ok_or_else(|| Error::InvalidCommand("no command given".to_string()))?;
        match client.call(name, args) {
            Ok(reply) => {
                println!("{}", reply);
                ExitCode::SUCCESS
            }
            Err(Error::Server(message)) => {
                println!("(error) {}", message);
                ExitCode::FAILURE
            }
            Err(e) => return Err(e.into()),
        }
    };

    client.close();
    telemetry.shutdown()?;
    Ok(code)
}
