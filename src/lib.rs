pub mod backend;
pub mod presence;
pub mod session;
pub mod settings;
mod utils;

use std::{future::Future, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use log::{error, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use backend::HttpBackend;
use presence::{ChannelPresenceSource, PresenceExit, PresenceListener};
use session::{
    commands::{dispatch, render, Command, CommandOutcome, HELP},
    CoordinatorConfig, SessionPointsCoordinator,
};
use settings::SettingsStore;

/// Overrides taken from the command line; they win over env and file values.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub backend_url: Option<String>,
    pub name: Option<String>,
}

/// Runs the terminal client until `quit`, EOF or Ctrl-C.
///
/// Every input line counts as user activity before it is handled as a command.
pub async fn run(options: RunOptions) -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    info!("Focus Peer starting up...");

    let mut store = SettingsStore::from_env(options.config)?;
    {
        let settings = store.client_mut();
        if let Some(url) = options.backend_url {
            settings.backend_url = url;
        }
        if let Some(name) = options.name {
            settings.default_user_name = name;
        }
    }
    let settings = store.client();
    info!("Using backend at {}", settings.backend_url);

    let backend = Arc::new(HttpBackend::new(settings.backend_url.clone()));
    let coordinator = SessionPointsCoordinator::new(backend, CoordinatorConfig::from(&settings));

    let points_view = tokio::spawn({
        let mut updates = coordinator.subscribe();
        async move {
            let mut last_points = updates.borrow().state.points;
            while updates.changed().await.is_ok() {
                let points = updates.borrow_and_update().state.points;
                if points != last_points {
                    println!("Current Points: {points}");
                    last_points = points;
                }
            }
        }
    });

    if let Err(err) = coordinator.initialize(&settings.default_user_name).await {
        error!("Starting without a user: {err}");
    }
    println!("Welcome to Focus Peer");
    println!("{}", render(&coordinator.get_snapshot().await));
    println!("{HELP}");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let result = drive_page(
        &coordinator,
        BufReader::new(tokio::io::stdin()),
        shutdown,
        settings.teardown_flush_timeout(),
    )
    .await;

    points_view.abort();
    info!("Focus Peer shut down");
    result
}

/// Feeds `input` lines to the coordinator until `quit`, EOF, a read error or
/// `shutdown`, then tears down through the presence source and waits up to
/// `flush_timeout` for the final flush. A read error is returned only after
/// the flush.
pub async fn drive_page<R, S>(
    coordinator: &SessionPointsCoordinator,
    input: R,
    shutdown: S,
    flush_timeout: Duration,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut source = ChannelPresenceSource::new();
    let presence = source.handle();
    let mut listener = PresenceListener::new();
    listener.register(&mut source, coordinator.clone())?;

    tokio::pin!(shutdown);
    let mut lines = input.lines();
    let mut read_error = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        warn!("Failed to read input: {err}; tearing down");
                        read_error = Some(err);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                presence.pointer_moved();

                match line.parse::<Command>() {
                    Ok(command) => match dispatch(coordinator, command).await {
                        CommandOutcome::Render(text) => println!("{text}"),
                        CommandOutcome::Quit => break,
                    },
                    Err(err) => println!("{err}"),
                }
            }
            _ = &mut shutdown => break,
        }
    }

    presence.teardown();
    match listener.join().await? {
        Some(PresenceExit::Teardown(Some(flush))) => {
            match tokio::time::timeout(flush_timeout, flush).await {
                Ok(Ok(Ok(points))) => println!("Current Points: {points}"),
                Ok(Ok(Err(err))) => warn!("Final flush failed: {err}"),
                Ok(Err(err)) => warn!("Final flush task failed: {err}"),
                Err(_) => warn!(
                    "Final flush still pending after {}ms; exiting",
                    flush_timeout.as_millis()
                ),
            }
        }
        Some(exit) => info!("Presence listener ended: {exit:?}"),
        None => {}
    }

    match read_error {
        Some(err) => Err(anyhow::Error::new(err).context("failed to read input")),
        None => Ok(()),
    }
}
