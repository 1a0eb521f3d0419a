use std::io::{self, Stderr};
use std::time::Duration;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use glowchat_core::ExchangeError;
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
    /// The in-flight chat request settled
    Reply(Result<String, ExchangeError>),
}

/// Single queue feeding the main loop: terminal input, animation ticks, and
/// replies from request tasks all arrive here, so app state is only ever
/// touched from the loop.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    /// Reads the terminal and ticks the typing indicator every 300ms.
    pub fn new() -> Self {
        let handler = Self::detached();
        tokio::spawn(read_terminal(handler.sender()));
        tokio::spawn(tick(handler.sender(), Duration::from_millis(300)));
        handler
    }

    /// A queue with no terminal reader or ticker attached.
    fn detached() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    /// Handle for tasks that need to post back into the loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

async fn read_terminal(tx: mpsc::UnboundedSender<AppEvent>) {
    let mut reader = event::EventStream::new();
    while let Some(evt) = reader.next().await {
        let app_event = match evt {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
            Ok(Event::Mouse(mouse)) => AppEvent::Mouse(mouse),
            Ok(Event::Resize(w, h)) => AppEvent::Resize(w, h),
            Ok(_) => continue,
            Err(err) => {
                // The stream doesn't recover from read errors
                tracing::error!(error = %err, "terminal event stream failed");
                break;
            }
        };

        if tx.send(app_event).is_err() {
            break;
        }
    }
}

async fn tick(tx: mpsc::UnboundedSender<AppEvent>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if tx.send(AppEvent::Tick).is_err() {
            break;
        }
    }
}

/// Raw mode, alternate screen and mouse capture (for wheel scrolling), drawn on stderr.
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;
    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Put the terminal back before the panic message prints.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        previous(info);
    }));
}
