//! agenda CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;

use agenda_cli::cli::Cli;
use agenda_cli::config::{self, ClientConfig};
use agenda_cli::controller::SessionController;
use agenda_cli::error::{ClientError, ClientResult};
use agenda_cli::view;
use agenda_core::{TracingConfig, WindowStrategy, init_tracing};
use agenda_google::{
    CALENDAR_READONLY_SCOPE, CalendarClient, ConsentFlow, HttpResourceFetcher, ResourceLoader,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().unwrap_or_default()
    };

    let credentials =
        config::resolve_credentials(cli.client_id.clone(), cli.client_secret.clone(), &config)
            .map_err(ClientError::Config)?;
    credentials
        .validate()
        .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;

    let window: WindowStrategy = cli.window.map(Into::into).unwrap_or(config.display.window);
    let timeout = Duration::from_secs(config.google.timeout);

    let identity = Arc::new(ConsentFlow::new(
        credentials,
        vec![CALENDAR_READONLY_SCOPE.to_string()],
        timeout,
    )?);
    let events = Arc::new(CalendarClient::new(timeout)?);
    let loader = Arc::new(ResourceLoader::new(Arc::new(HttpResourceFetcher::new(
        timeout,
    )?)));

    let controller = SessionController::new(identity, events, loader, window);

    controller.initialize().await;

    println!("A browser window will open for you to authorize access.");
    println!("If the browser doesn't open, check the terminal for a URL to copy.");
    println!();
    controller.sign_in().await;

    print!(
        "{}",
        view::render(&controller.snapshot(), Utc::now(), &config.display.no_events_text)
    );

    if cli.interactive {
        interactive_loop(&controller, &config).await?;
    }

    Ok(())
}

/// Reads single-letter commands from stdin, re-rendering after each one.
async fn interactive_loop(
    controller: &SessionController,
    config: &ClientConfig,
) -> ClientResult<()> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    println!("commands: r = refresh, s = sign out, i = sign in, q = quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "r" => controller.refresh().await,
            "s" => controller.sign_out().await,
            "i" => {
                controller.sign_in().await;
            }
            "q" => break,
            "" => continue,
            other => {
                println!("unknown command: {}", other);
                continue;
            }
        }
        print!(
            "{}",
            view::render(&controller.snapshot(), Utc::now(), &config.display.no_events_text)
        );
        println!("commands: r = refresh, s = sign out, i = sign in, q = quit");
    }

    Ok(())
}
