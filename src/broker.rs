//! Top-level broker process.
//!
//! `Broker` owns every component as an `Arc` and wires them into one
//! [`Dispatcher`]; components talk to each other only through the
//! `Dispatcher`'s references, never by holding a back-pointer to `Broker`
//! itself, so none of them need to know the process is a singleton.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::backend::{Backend, DirectBackend};
use crate::batch::{BatchAggregator, BatchAggregatorConfig};
use crate::config::BrokerConfig;
use crate::dispatcher::Dispatcher;
use crate::group::ConsumerGroupCoordinator;
use crate::produce_waiter::ProduceWaiter;
use crate::producer_id::ProducerIdManager;
use crate::txn::TransactionCoordinator;

/// Chooses how produce/fetch traffic reaches storage: straight to the
/// local log, or through a consensus layer. Fixed for the broker's
/// lifetime.
pub enum BackendChoice {
    Direct,
    Consensus(Arc<dyn Backend>),
}

pub struct Broker {
    pub config: BrokerConfig,
    pub dispatcher: Arc<Dispatcher>,
}

impl Broker {
    pub fn new(config: BrokerConfig, backend_choice: BackendChoice) -> Self {
        let backend: Arc<dyn Backend> = match backend_choice {
            BackendChoice::Direct => Arc::new(DirectBackend::new()),
            BackendChoice::Consensus(backend) => backend,
        };
        let (host, port) = config.own_host_port();

        let dispatcher = Arc::new(Dispatcher {
            backend,
            producer_ids: Arc::new(ProducerIdManager::new()),
            txn_coordinator: Arc::new(TransactionCoordinator::new()),
            produce_waiter: ProduceWaiter::new(),
            groups: Arc::new(ConsumerGroupCoordinator::new()),
            batches: Arc::new(BatchAggregator::new(BatchAggregatorConfig {
                max_size: config.batch_max_size,
                max_bytes: config.batch_max_bytes,
                linger: Duration::from_millis(config.batch_linger_ms),
                adaptive_max_size: config.batch_adaptive_max_size,
            })),
            default_ack_timeout_ms: 30_000,
            broker_id: config.broker_id,
            host,
            port,
            replica_lag_max_messages: config.replica_lag_max_messages,
            min_insync_replicas: config.min_insync_replicas,
        });

        info!(broker_id = config.broker_id, "broker initialized");
        Self { config, dispatcher }
    }

    /// Periodically sweeps expired consumer group sessions. Meant to be
    /// spawned once at startup and left running for the broker's
    /// lifetime.
    pub async fn run_session_sweeper(&self, interval: Duration) {
        let groups = self.dispatcher.groups.clone();
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            groups.expire_stale_sessions(std::time::Instant::now()).await;
        }
    }
}
