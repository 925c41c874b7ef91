use crate::tui::{TuiActor, TuiMsg};
use sift_actors::actor::Addr;
use sift_actors::system::ShutdownHandle;
use crossterm::event::{self, Event};
use std::io;
use std::time::Duration;
use tokio::time;

const TICK: Duration = Duration::from_millis(80);
// Bounds how long a pending read can outlive shutdown.
const INPUT_POLL: Duration = Duration::from_millis(100);

fn next_event() -> io::Result<Option<Event>> {
    if event::poll(INPUT_POLL)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

/// Forward terminal events and a redraw tick to the console until shutdown.
pub fn spawn_tui_feeders(tui: Addr<TuiActor>, shutdown: ShutdownHandle) {
    let tui_in = tui.clone();
    let mut shutdown_input = shutdown.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_input.recv() => break,
                ev = tokio::task::spawn_blocking(next_event) => {
                    match ev {
                        Ok(Ok(None)) => {}
                        Ok(Ok(Some(e))) => {
                            if tui_in.send(TuiMsg::InputEvent(e)).await.is_err() {
                                break;
                            }
                        }
                        Ok(Err(e)) => {
                            // Terminal input does not recover once it fails.
                            let _ = tui_in.send(TuiMsg::InputError(e.to_string())).await;
                            break;
                        }
                        Err(_) => break,
                    }
                }
            }
        }
        tracing::debug!(target: "tui", "input feeder stopped");
    });

    let mut shutdown_tick = shutdown.subscribe();
    tokio::spawn(async move {
        let mut interval = time::interval(TICK);
        loop {
            tokio::select! {
                _ = shutdown_tick.recv() => break,
                _ = interval.tick() => {
                    if tui.is_closed() {
                        break;
                    }
                    let _ = tui.try_send(TuiMsg::Tick);
                }
            }
        }
    });
}
