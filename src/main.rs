mod app;
mod cli;
mod config;
mod error;
mod input;
mod k8s;
mod model;
mod projector;
mod scheduler;
mod status;
mod ui;

use anyhow::{Context, Result};
use app::{AppCommand, RefreshOutcome, ViewOptions, ViewState};
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::queue;
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode, supports_keyboard_enhancement,
};
use futures::StreamExt;
use k8s::{ClusterGateway, KubeGateway};
use model::Selection;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use scheduler::{RefreshScheduler, bounded};
use std::fs::OpenOptions;
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let settings = Settings::load(&args)?;
    init_tracing(&settings.log_filter, settings.log_file.as_deref())?;
    if let Some(source) = &settings.source {
        info!("loaded config from {}", source.display());
    }

    let gateway =
        Arc::new(KubeGateway::connect(settings.kubeconfig.as_deref(), settings.output_limits()).await?);
    let options = ViewOptions {
        kind: settings.kind,
        scope: settings.namespace.clone(),
        diagnostic_command: settings.diagnostic_command.clone(),
        cluster: gateway.cluster().to_string(),
        context: gateway.context().to_string(),
    };

    let mut state = match bounded(
        settings.request_timeout,
        "connectivity check",
        gateway.check_connection(),
    )
    .await
    {
        Ok(()) => ViewState::new(options),
        Err(error) => {
            warn!("starting disconnected: {error}");
            ViewState::disconnected(options, error.to_string())
        }
    };

    run(&mut state, gateway, &settings).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = subscriber
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = subscriber.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}

async fn run(state: &mut ViewState, gateway: Arc<KubeGateway>, settings: &Settings) -> Result<()> {
    let mut session = TerminalSession::enter()?;
    let outcome = run_loop(&mut session.terminal, state, gateway, settings).await;
    let restored = session.leave();

    match outcome {
        Ok(()) => restored,
        Err(error) => {
            if let Err(restore_error) = restored {
                warn!("terminal restore failed: {restore_error:#}");
            }
            Err(error)
        }
    }
}

/// Raw-mode alternate screen held for the lifetime of the dashboard.
struct TerminalSession {
    terminal: TuiTerminal,
    keyboard_enhanced: bool,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
        let mut stdout = io::stdout();
        if let Err(error) = enter_screen(&mut stdout, keyboard_enhanced) {
            let _ = disable_raw_mode();
            return Err(error).context("failed to enter alternate screen");
        }
        install_panic_hook(keyboard_enhanced);

        let mut terminal =
            Terminal::new(CrosstermBackend::new(stdout)).context("failed to create terminal backend")?;
        terminal.clear().context("failed to clear terminal")?;
        Ok(Self {
            terminal,
            keyboard_enhanced,
        })
    }

    fn leave(&mut self) -> Result<()> {
        leave_screen(self.terminal.backend_mut(), self.keyboard_enhanced)
            .context("failed to leave alternate screen")?;
        disable_raw_mode().context("failed to disable raw mode")?;
        self.terminal.show_cursor().context("failed to show cursor")?;
        Ok(())
    }
}

fn enter_screen(out: &mut impl Write, keyboard_enhanced: bool) -> io::Result<()> {
    queue!(out, EnterAlternateScreen)?;
    if keyboard_enhanced {
        // Esc must arrive alone so it can leave popups and the output pane.
        queue!(
            out,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    out.flush()
}

/// Undoes `enter_screen` in reverse order.
fn leave_screen(out: &mut impl Write, keyboard_enhanced: bool) -> io::Result<()> {
    if keyboard_enhanced {
        queue!(out, PopKeyboardEnhancementFlags)?;
    }
    queue!(out, Clear(ClearType::All), LeaveAlternateScreen)?;
    out.flush()
}

/// A panic leaves the shell usable: enhancement flags popped, alternate
/// screen left and raw mode off before the message prints.
fn install_panic_hook(keyboard_enhanced: bool) {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = leave_screen(&mut io::stdout(), keyboard_enhanced);
        let _ = disable_raw_mode();
        original_hook(panic_info);
    }));
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    state: &mut ViewState,
    gateway: Arc<KubeGateway>,
    settings: &Settings,
) -> Result<()> {
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<RefreshOutcome>();
    let (selection_tx, selection_rx) = watch::channel(state.selection());
    let scheduler = state.disconnected_reason().is_none().then(|| {
        RefreshScheduler::spawn(
            Arc::clone(&gateway),
            selection_rx,
            outcome_tx.clone(),
            settings.refresh_interval,
            settings.request_timeout,
        )
    });
    let mut reader = EventStream::new();

    loop {
        let projection = projector::project(state, settings.max_output_lines);
        terminal
            .draw(|frame| ui::render(frame, &projection))
            .context("failed to render terminal frame")?;

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(state.mode(), key) {
                            debug!("action={action:?}");
                            let command = state.handle_input(action);
                            if matches!(command, AppCommand::Quit) {
                                break;
                            }
                            dispatch(
                                command,
                                &gateway,
                                &selection_tx,
                                &outcome_tx,
                                settings.request_timeout,
                            );
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        warn!("terminal event error: {error}");
                    }
                    None => break,
                }
            }
            Some(outcome) = outcome_rx.recv() => {
                state.apply_refresh(outcome);
            }
        }
    }

    if let Some(scheduler) = scheduler {
        scheduler.shutdown();
    }
    Ok(())
}

/// Hands a state-machine command to the scheduler or to a one-shot task.
/// Results always come back through the outcome channel.
fn dispatch<G: ClusterGateway>(
    command: AppCommand,
    gateway: &Arc<G>,
    selection_tx: &watch::Sender<Selection>,
    outcomes: &mpsc::UnboundedSender<RefreshOutcome>,
    request_timeout: Duration,
) {
    match command {
        AppCommand::None | AppCommand::Quit => {}
        AppCommand::Refresh(selection) => {
            selection_tx.send_replace(selection);
        }
        AppCommand::LoadNamespaces => {
            let gateway = Arc::clone(gateway);
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                let result = bounded(request_timeout, "namespace list", gateway.namespaces()).await;
                let _ = outcomes.send(RefreshOutcome::Namespaces { result });
            });
        }
        AppCommand::CaptureOutput {
            request,
            namespace,
            pod,
            output,
        } => {
            let gateway = Arc::clone(gateway);
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                let result = bounded(
                    request_timeout,
                    output.describe(),
                    gateway.exec(&namespace, &pod, &output),
                )
                .await;
                if let Err(error) = &result {
                    warn!("{} in {namespace}/{pod} failed: {error}", output.describe());
                }
                let _ = outcomes.send(RefreshOutcome::Output { request, result });
            });
        }
    }
}
