//! WhatsApp Dashboard TUI (Terminal User Interface)
//!
//! A terminal operator console for the WhatsApp chatbot.

use anyhow::Context;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use whatsapp_dashboard::{
    api::ApiClient,
    dashboard::Dashboard,
    storage::{PreferencesManager, Settings},
    transport::{DualTransport, RoomTransport},
    tui::{ui::ui, App},
};

/// Directory holding settings, preferences and the log file
fn config_dir() -> PathBuf {
    std::env::var_os("DASHBOARD_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./dashboard-data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating {}", dir.display()))?;

    let log_file = std::fs::File::create(dir.join("dashboard.log")).context("creating log file")?;
    whatsapp_dashboard::init_with_writer(log_file);

    let mut settings = Settings::load(dir.join("settings.json")).context("loading settings")?;
    settings.apply_env();

    let preferences = PreferencesManager::new(dir.join("preferences.json"))
        .await
        .context("loading preferences")?;
    let theme = preferences.theme().await;

    let api = ApiClient::from_settings(&settings).context("building REST client")?;
    let (transport, events) = DualTransport::from_settings(&settings);
    let mut dashboard = Dashboard::new(api, transport, events, settings);
    dashboard.start();

    let mut app = App::new(dashboard, theme, Some(preferences));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    app.dashboard.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B, T>(terminal: &mut Terminal<B>, app: &mut App<T>) -> anyhow::Result<()>
where
    B: ratatui::backend::Backend,
    T: RoomTransport,
{
    loop {
        app.dashboard.pump();
        app.sync();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key).await;
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
