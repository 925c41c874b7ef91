use crate::actor::{spawn_actor_reserved, Actor, Addr, Reserved};
use crate::system::{ActorSystem, ShutdownHandle};
use anyhow::Result;
use std::any::Any;
use std::collections::HashMap;

/// Two-phase wiring: reserve every mailbox, then start actors with the
/// addresses they depend on.
pub struct Builder {
    sys: ActorSystem,
    // Concrete addresses by name for easy wiring.
    addrs: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            sys: ActorSystem::new(),
            addrs: HashMap::new(),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.sys.shutdown_handle()
    }

    /// Reserve an actor and publish its `Addr` under `name`.
    pub fn reserve<A>(&mut self, name: &str, mailbox: usize) -> Reserved<A>
    where
        A: Actor,
        Addr<A>: Send + Sync,
    {
        let r = spawn_actor_reserved::<A>(name, mailbox);
        self.addrs.insert(name.to_string(), Box::new(r.addr()));
        r
    }

    /// Start a previously reserved actor and track its task.
    pub fn start_reserved<A: Actor>(&mut self, r: Reserved<A>, actor: A) -> &mut Self {
        let shutdown_rx = self.sys.shutdown_notifier();
        let h = r.start_with_shutdown(actor, Some(shutdown_rx));
        self.sys.track(async move {
            h.task.await??;
            Ok(())
        });
        self
    }

    /// Get a typed address by name.
    pub fn addr<A: Actor>(&self, name: &str) -> Option<Addr<A>> {
        self.addrs
            .get(name)
            .and_then(|b| b.downcast_ref::<Addr<A>>().cloned())
    }

    /// Block until Ctrl-C or a shutdown signal, then stop every actor.
    pub async fn run_until_ctrl_c(mut self) -> Result<()> {
        let mut shutdown_rx = self.sys.shutdown_notifier();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received");
            }
            _ = shutdown_rx.recv() => {}
        }
        // Drop published addresses so mailboxes can close.
        self.addrs.clear();
        self.sys.graceful_shutdown().await
    }
}
