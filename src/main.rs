use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use eyre::{Result, WrapErr};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    fs,
    io::{Stdout, stdout},
    time::Duration,
};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use url::Url;

use gateway_dashboard::config::{Args, Config};
use gateway_dashboard::data::StatusClient;
use gateway_dashboard::poll::{Poller, PollerHandle};
use gateway_dashboard::ui::Dashboard;

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

const UI_TICK: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_args(Args::parse())?;
    let _log_guard = init_logging(&config)?;

    let client = StatusClient::from_config(&config)?;
    println!("Starting Gateway Dashboard...");
    println!("Node status: {}", client.status_url());
    println!("Logs: {}", config.log_file.display());
    info!(status_url = %client.status_url(), "dashboard starting");

    let cancel = CancellationToken::new();
    let poller = Poller::spawn(client, config.poll_interval, cancel.child_token());

    let mut terminal = setup_terminal()?;
    let outcome = run(&mut terminal, &config, &poller).await;
    cleanup_terminal(&mut terminal)?;

    cancel.cancel();
    poller.shutdown().await;
    info!("dashboard stopped");

    outcome?;
    println!("Goodbye!");
    Ok(())
}

async fn run(terminal: &mut CrosstermTerminal, config: &Config, poller: &PollerHandle) -> Result<()> {
    let mut dashboard = Dashboard::new();

    loop {
        let state = poller.state();
        terminal.draw(|frame| dashboard.render(frame, config, &state))?;

        if event::poll(UI_TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => dashboard.quit(),
                        KeyCode::Char('r') => poller.refresh(),
                        KeyCode::Char('o') => open_in_browser(&config.node_url),
                        KeyCode::Char('d') => open_in_browser(&config.docs_url),
                        _ => {}
                    }
                }
            }
        }

        if dashboard.should_quit {
            break;
        }

        time::sleep(Duration::from_millis(10)).await;
    }

    Ok(())
}

fn open_in_browser(url: &Url) {
    match open::that(url.as_str()) {
        Ok(()) => info!(%url, "opened in browser"),
        Err(e) => warn!(%url, error = %e, "could not open browser"),
    }
}

fn init_logging(config: &Config) -> Result<WorkerGuard> {
    let path = &config.log_file;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| ".".into());
    let file_name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("log file {} has no file name", path.display()))?;
    fs::create_dir_all(&dir).wrap_err_with(|| format!("creating log dir {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn setup_terminal() -> Result<CrosstermTerminal> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn cleanup_terminal(terminal: &mut CrosstermTerminal) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
