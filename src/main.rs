mod app;
mod client;
mod components;
mod config;
mod controller;
mod error;
mod event;
mod fs;
mod handler;
mod poller;
mod preview_content;
mod server;
mod tail;
mod theme;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::client::{Backend, HttpBackend, LocalBackend};
use crate::config::{AppConfig, ClientConfig, ServerConfig};
use crate::controller::Controller;
use crate::event::{Event, EventHandler};
use crate::fs::listing::DirectoryService;
use crate::poller::{dispatch, Poller};
use crate::preview_content::Highlighter;
use crate::tui::{install_panic_hook, Tui};

/// Serve a directory over HTTP and follow its most recently modified file.
#[derive(Parser, Debug)]
#[command(name = "lfv", version, about)]
struct Cli {
    /// Config file path (overrides default config locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve directory listings and file contents over HTTP
    Serve(ServeArgs),
    /// Browse and follow the newest file in a terminal UI
    View {
        #[command(flatten)]
        source: SourceArgs,

        /// Start with auto-follow disabled
        #[arg(long)]
        no_follow: bool,
    },
    /// Print every newly auto-selected file to stdout
    Tail {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Directory served when a request names no path
    root: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// Only list files with this extension (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Base URL of a running `lfv serve`
    #[arg(long, conflicts_with = "local")]
    server: Option<String>,

    /// Read this directory directly instead of going through a server
    #[arg(long)]
    local: Option<PathBuf>,

    /// Directory to browse first
    #[arg(long)]
    path: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
}

impl SourceArgs {
    fn overrides(&self, auto_follow: Option<bool>) -> AppConfig {
        AppConfig {
            client: ClientConfig {
                server_url: self.server.clone(),
                poll_interval_ms: self.interval_ms,
                auto_follow,
                start_path: self.path.as_ref().map(|p| p.display().to_string()),
            },
            ..AppConfig::default()
        }
    }
}

fn init_logging(log_file: Option<&Path>, to_stderr: bool) -> error::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder
            .with_ansi(false)
            .with_writer(Arc::new(file))
            .try_init()
    } else if to_stderr {
        builder.with_writer(io::stderr).try_init()
    } else {
        // The terminal UI owns the screen.
        builder.with_writer(io::sink).try_init()
    };
    installed.map_err(|e| error::AppError::Config(format!("cannot install log subscriber: {e}")))
}

/// Directory service configured from the `[server]` section.
fn directory_service(root: &Path, config: &AppConfig) -> error::Result<DirectoryService> {
    Ok(DirectoryService::new(root)?
        .with_filter(config.entry_filter())
        .with_stat_policy(config.stat_policy())
        .with_max_read_bytes(config.max_read_bytes()))
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    let log_to_stderr = !matches!(cli.command, Command::View { .. });
    init_logging(cli.log_file.as_deref(), log_to_stderr)?;

    match cli.command {
        Command::Serve(args) => {
            let overrides = AppConfig {
                server: ServerConfig {
                    bind: args.bind,
                    root: args.root.map(|p| p.display().to_string()),
                    extensions: (!args.extensions.is_empty()).then_some(args.extensions),
                    ..ServerConfig::default()
                },
                ..AppConfig::default()
            };
            let config = AppConfig::load(cli.config.as_deref(), Some(&overrides));
            serve(&config).await
        }
        Command::View { source, no_follow } => {
            let overrides = source.overrides(no_follow.then_some(false));
            let config = AppConfig::load(cli.config.as_deref(), Some(&overrides));
            match &source.local {
                Some(dir) => {
                    let backend = LocalBackend::new(directory_service(dir, &config)?);
                    view(Arc::new(backend), &config).await
                }
                None => view(Arc::new(HttpBackend::new(config.server_url())?), &config).await,
            }
        }
        Command::Tail { source } => {
            let overrides = source.overrides(Some(true));
            let config = AppConfig::load(cli.config.as_deref(), Some(&overrides));
            match &source.local {
                Some(dir) => {
                    let backend = LocalBackend::new(directory_service(dir, &config)?);
                    tail(Arc::new(backend), &config).await
                }
                None => tail(Arc::new(HttpBackend::new(config.server_url())?), &config).await,
            }
        }
    }
}

async fn serve(config: &AppConfig) -> error::Result<()> {
    let service = directory_service(&config.root(), config)?;
    let listener = TcpListener::bind(config.bind()).await?;
    server::serve(listener, service, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn tail<B: Backend>(backend: Arc<B>, config: &AppConfig) -> error::Result<()> {
    let controller = Controller::new(config.start_path(), true);
    let mut stdout = io::stdout().lock();
    tail::run(
        backend,
        controller,
        config.poll_interval(),
        &mut stdout,
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
    )
    .await
}

async fn view<B: Backend>(backend: Arc<B>, config: &AppConfig) -> error::Result<()> {
    info!(
        source = %backend.describe(),
        theme = config.theme_scheme(),
        auto_follow = config.auto_follow(),
        "starting viewer"
    );

    install_panic_hook();

    let mut tui = Tui::new()?;
    let mut app = App::new(
        Controller::new(config.start_path(), config.auto_follow()),
        Highlighter::new(config.syntax_theme_name(), config.line_numbers()),
        theme::resolve_theme(&config.theme),
        backend.describe(),
    );
    let mut events = EventHandler::new(Duration::from_millis(250));
    let event_tx = events.sender();
    let _poller = Poller::start(config.poll_interval(), event_tx.clone());

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        let request = match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Poll => Some(app.controller.poll()),
            Event::Response(response) => app.handle_response(response),
            Event::Tick | Event::Resize(_, _) => None,
        };
        if let Some(request) = request {
            dispatch(&backend, request, &event_tx);
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    info!("viewer closed");
    Ok(())
}
