//! Runs several orchestrators side by side and tallies what they report.

use std::sync::Arc;

use coordination::{Aggregate, EventBus, SessionEvent, WorkerId};
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::accounts::JsonAccountStore;
use crate::config::BotConfig;
use crate::orchestrator::{Collaborators, Orchestrator};

/// Builds the collaborators for one worker from that worker's config.
pub type CollaboratorFactory =
    Box<dyn Fn(WorkerId, &BotConfig) -> anyhow::Result<Collaborators> + Send + Sync>;

pub struct Supervisor {
    configs: Vec<BotConfig>,
    factory: CollaboratorFactory,
}

impl Supervisor {
    /// One worker per entry of `configs`, numbered in order.
    pub fn new(configs: Vec<BotConfig>, factory: CollaboratorFactory) -> Self {
        Self { configs, factory }
    }

    /// `workers` workers on their own installs, sharing one leased account
    /// file. Fails when the config does not give every worker an install.
    pub fn from_config(workers: usize, config: &BotConfig) -> anyhow::Result<Self> {
        let configs = config.worker_configs(workers.max(1))?;
        let store = Arc::new(JsonAccountStore::new(config.accounts_path()));
        Ok(Self::new(
            configs,
            Box::new(move |worker: WorkerId, config: &BotConfig| {
                Collaborators::from_config(config, Arc::new(store.lease_for(worker)))
            }),
        ))
    }

    pub fn workers(&self) -> usize {
        self.configs.len()
    }

    /// Run every worker to completion. Workers stop on their own; the
    /// returned aggregate covers everything they reported.
    pub async fn run(self) -> anyhow::Result<Aggregate> {
        let bus = EventBus::new();
        let mut tasks = JoinSet::new();
        let workers = self.configs.len();

        for (worker, config) in self.configs.into_iter().enumerate() {
            let collaborators = (self.factory)(worker, &config)?;
            info!(worker, league_dir = %config.league_dir.display(), "Worker install");
            let mut orchestrator = Orchestrator::new(worker, config, collaborators, bus.sink());
            tasks.spawn(
                async move {
                    let _ = orchestrator.run().await;
                }
                .instrument(info_span!("worker", worker)),
            );
        }
        info!(workers, "Workers started");

        // The receiver ends once every orchestrator, and with it its sink,
        // has been dropped.
        let mut receiver = bus.close_producers();
        let mut aggregate = Aggregate::new();
        while let Some(event) = receiver.recv().await {
            aggregate.apply(&event);
            report(&event, &aggregate);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Worker task panicked");
            }
        }

        info!(
            games = aggregate.games_completed,
            errors = aggregate.total_errors(),
            leveled = aggregate.leveled_accounts.len(),
            "All workers finished"
        );
        Ok(aggregate)
    }
}

fn report(event: &SessionEvent, aggregate: &Aggregate) {
    match event {
        SessionEvent::GameCompleted { worker, .. } => {
            info!(worker, games = aggregate.games_completed, "Games played")
        }
        SessionEvent::ErrorCount { worker, session_restarts, .. } => {
            debug!(worker, session_restarts, total = aggregate.total_errors(), "Errors")
        }
        SessionEvent::Restarting { worker, code, attempt, .. } => {
            warn!(worker, %code, attempt, "Worker restarting client")
        }
        SessionEvent::AccountLeveled { worker, username, level, .. } => {
            info!(worker, %username, level, "Account leveled")
        }
        SessionEvent::Terminated { worker, reason, .. } => {
            warn!(worker, %reason, "Worker terminated")
        }
    }
}
