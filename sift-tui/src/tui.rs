use crate::{
    console::{Action, Console, KeyOutcome},
    view,
};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::{
    cursor::Show,
    event::{Event as CtEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use sift_actors::{
    Output, ResearchActor, ResearchMsg, Surface,
    actor::{Actor, Addr, Context},
    system::ShutdownHandle,
};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

pub enum TuiMsg {
    InputEvent(CtEvent),
    Tick,
    Submit(String),
    Output(Output),
    InputError(String),
    Shutdown,
}

/// Owns the terminal. Talks to the research session with `try_send` only,
/// so it never waits on an actor that may be waiting on it.
pub struct TuiActor<B: Backend = CrosstermBackend<Stdout>> {
    research: Addr<ResearchActor>,
    console: Console,

    term: Terminal<B>,
    tick_rate: Duration,
    last_tick: Instant,
    raw_mode: bool,

    shutdown: ShutdownHandle,
}

impl TuiActor {
    /// Take over stdout: raw mode plus the alternate screen.
    pub fn new(research: Addr<ResearchActor>, sources: usize, shutdown: ShutdownHandle) -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;
        term.clear()?;

        let mut tui = Self::with_terminal(research, sources, shutdown, term);
        tui.raw_mode = true;
        Ok(tui)
    }
}

impl<B: Backend> TuiActor<B> {
    /// Console over an already prepared terminal; nothing is restored on exit.
    pub fn with_terminal(
        research: Addr<ResearchActor>,
        sources: usize,
        shutdown: ShutdownHandle,
        term: Terminal<B>,
    ) -> Self {
        Self {
            research,
            console: Console::new(sources),
            term,
            tick_rate: Duration::from_millis(250),
            last_tick: Instant::now(),
            raw_mode: false,
            shutdown,
        }
    }

    fn draw(&mut self) -> Result<()> {
        view::draw(&mut self.term, &self.console.snap())
    }

    fn restore_terminal(&mut self) {
        if !self.raw_mode {
            return;
        }
        self.raw_mode = false;
        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    }
}

impl<B: Backend + Send + 'static> TuiActor<B> {
    /// Handled in place: a streamed reply can keep the mailbox full.
    fn quit(&mut self, ctx: &mut Context<Self>) {
        info!(target: "tui", "shutdown requested");
        self.restore_terminal();
        self.shutdown.signal();
        ctx.stop();
    }

    fn submit(&mut self, line: &str, ctx: &mut Context<Self>) {
        let Some(action) = self.console.submit(line) else {
            return;
        };
        match action {
            Action::Research(msg) => {
                let kind = match &msg {
                    ResearchMsg::Search { .. } => "search",
                    ResearchMsg::FollowUp { .. } => "follow-up",
                    _ => "request",
                };
                if self.research.try_send(msg).is_err() {
                    warn!(target: "tui", kind, "research session unavailable");
                    self.console
                        .push_error(format!("× Could not start the {kind}: research session unavailable."));
                }
            }
            Action::Quit => self.quit(ctx),
        }
    }
}

impl<B: Backend> Drop for TuiActor<B> {
    fn drop(&mut self) {
        self.restore_terminal();
    }
}

#[async_trait]
impl<B: Backend + Send + 'static> Actor for TuiActor<B> {
    type Msg = TuiMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            TuiMsg::InputEvent(CtEvent::Key(k)) => {
                if k.kind != KeyEventKind::Press {
                    return Ok(());
                }
                match self.console.handle_key(k) {
                    Some(KeyOutcome::Submit(line)) => self.submit(&line, ctx),
                    Some(KeyOutcome::Quit) => self.quit(ctx),
                    None => {}
                }
            }
            TuiMsg::InputEvent(CtEvent::Resize(..)) => self.console.mark_dirty(),
            TuiMsg::InputEvent(_) => {}
            TuiMsg::Submit(line) => self.submit(&line, ctx),
            TuiMsg::Output(out) => self.console.apply_output(out),
            TuiMsg::InputError(e) => self.console.push_error(format!("× Input error: {e}")),
            TuiMsg::Tick => {
                self.console.step_spinner();
                if self.console.take_dirty() || self.last_tick.elapsed() >= self.tick_rate {
                    self.draw()?;
                    self.last_tick = Instant::now();
                }
            }
            TuiMsg::Shutdown => self.quit(ctx),
        }

        Ok(())
    }

    async fn stopped(&mut self) {
        self.restore_terminal();
        debug!(target: "tui", "console closed");
    }
}

/// Presentation surface backed by the console's mailbox.
#[derive(Clone)]
pub struct TuiSurface(Addr<TuiActor>);

impl TuiSurface {
    pub fn new(tui: Addr<TuiActor>) -> Self {
        Self(tui)
    }
}

#[async_trait]
impl Surface for TuiSurface {
    async fn emit(&self, out: Output) {
        if self.0.send(TuiMsg::Output(out)).await.is_err() {
            debug!(target: "tui", "console closed; output dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use sift_actors::{actor::spawn_actor_reserved, system::ActorSystem};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> TuiMsg {
        TuiMsg::InputEvent(CtEvent::Key(KeyEvent::new(code, modifiers)))
    }

    fn chunk() -> TuiMsg {
        TuiMsg::Output(Output::Chunk("more ".into()))
    }

    /// Queue `first` in a one-slot mailbox with a streamed reply waiting
    /// behind it, then run the console until it stops.
    async fn run_behind_stream(first: TuiMsg) -> bool {
        let system = ActorSystem::new();
        let shutdown = system.shutdown_handle();
        let mut signalled = shutdown.subscribe();

        let research = spawn_actor_reserved::<ResearchActor>("research", 1);
        let tui = spawn_actor_reserved::<TuiActor<TestBackend>>("tui", 1);
        let addr = tui.addr();
        assert!(addr.try_send(first).is_ok());
        assert!(addr.try_send(chunk()).is_err());

        let stream = addr.clone();
        let streamer = tokio::spawn(async move {
            while stream.send(chunk()).await.is_ok() {}
        });
        tokio::task::yield_now().await;

        let term = Terminal::new(TestBackend::new(60, 16)).unwrap();
        let console = TuiActor::with_terminal(research.addr(), 5, shutdown, term);
        let handle = tui.start(console);

        tokio::time::timeout(Duration::from_secs(5), handle.task)
            .await
            .expect("console did not stop")
            .unwrap()
            .unwrap();
        streamer.abort();
        signalled.try_recv().is_ok()
    }

    #[tokio::test]
    async fn ctrl_c_stops_while_a_reply_fills_the_mailbox() {
        assert!(run_behind_stream(key(KeyCode::Char('c'), KeyModifiers::CONTROL)).await);
    }

    #[tokio::test]
    async fn quit_command_stops_while_a_reply_fills_the_mailbox() {
        assert!(run_behind_stream(TuiMsg::Submit("/quit".into())).await);
    }
}
