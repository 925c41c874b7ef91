use anyhow::{Context, Result};
use sift_actors::{
    Pipeline, ResearchActor, ResearchMsg,
    actor::Addr,
    builder::Builder,
};
use sift_chat::WsChatClient;
use sift_config::SiftConfig;
use sift_drivers::sift_browser::driver::SiftDriver;
use sift_tui::{TuiActor, TuiSurface, spawn_tui_feeders};
use sift_web::{DriverPageSource, ResultCollector};
use std::sync::Arc;

const DEFAULT_MAILBOX: usize = 1024;
const TUI_MAILBOX: usize = 256;

pub struct Tether {
    builder: Builder,
}

impl Tether {
    pub fn new() -> Self {
        Self {
            builder: Builder::new(),
        }
    }
    pub fn builder_mut(&mut self) -> &mut Builder {
        &mut self.builder
    }
    pub async fn run(self) -> Result<()> {
        self.builder.run_until_ctrl_c().await
    }
}

pub fn build_from_config(t: &mut Tether, cfg: &SiftConfig, driver: SiftDriver) -> Result<()> {
    let b = t.builder_mut();
    let shutdown = b.shutdown_handle();

    // -------- PHASE 1: RESERVE --------
    // The session and the console each need the other's address.
    let r_research = b.reserve::<ResearchActor>("research:main", DEFAULT_MAILBOX);
    let r_tui = b.reserve::<TuiActor>("tui:main", TUI_MAILBOX);
    let tui_addr: Addr<TuiActor> = r_tui.addr();

    // -------- PHASE 2: START THE SESSION --------
    let source = Arc::new(DriverPageSource::new(driver));
    let collector = ResultCollector::from_config(source, cfg)?;
    let chat = WsChatClient::from_config(&cfg.chat);
    let pipeline = Pipeline {
        collector: Arc::new(collector),
        app_id: chat.app_id().to_string(),
        chat: Arc::new(chat),
        surface: Arc::new(TuiSurface::new(tui_addr.clone())),
        followup_cap: cfg.fetch.followup_cap,
    };
    let research = ResearchActor::new(pipeline);
    tracing::info!(conversation = %research.conversation_id(), "research session created");
    b.start_reserved(r_research, research);

    // -------- PHASE 3: START TUI LAST --------
    let research_addr: Addr<ResearchActor> = b
        .addr("research:main")
        .context("research session was not reserved")?;
    let tui = TuiActor::new(research_addr.clone(), cfg.search.max_sources, shutdown.clone())?;
    b.start_reserved(r_tui, tui);
    spawn_tui_feeders(tui_addr, shutdown);

    // Paint the initial status bar.
    let _ = research_addr.try_send(ResearchMsg::Refresh);

    Ok(())
}
