use std::sync::Arc;

use crate::{
    core::{config::OrchestratorConfig, orchestrator::Orchestrator, supervise::Shared},
    events::Bus,
    runnables::RunnableFactory,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Orchestrator`] with optional features.
pub struct OrchestratorBuilder<P, R = ()>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    factory: Arc<dyn RunnableFactory<P, R>>,
    params: P,
    cfg: OrchestratorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<P, R> OrchestratorBuilder<P, R>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Creates a builder with the default configuration and no subscribers.
    pub fn new<F>(factory: F, params: P) -> Self
    where
        F: RunnableFactory<P, R>,
    {
        Self {
            factory: Arc::new(factory),
            params,
            cfg: OrchestratorConfig::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: OrchestratorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive pool events (scaling, runner failures, backoff, termination)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the orchestrator in the `Running` state with no runners.
    ///
    /// Must be called inside a tokio runtime when subscribers are set.
    pub fn build(self) -> Arc<Orchestrator<P, R>> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let shared = Arc::new(Shared::new(self.params, bus, self.cfg.backoff));

        Arc::new(Orchestrator::new_internal(
            self.factory,
            shared,
            self.cfg.parallelism(),
            subs,
        ))
    }
}
