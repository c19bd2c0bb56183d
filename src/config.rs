//! Broker configuration.
//!
//! Loaded once at startup via [`BrokerConfig::from_env`]; nothing in the
//! broker reaches back into the environment after that, so every knob here
//! is a plain field rather than a lazily-resolved one.

use envconfig::Envconfig;

#[derive(Debug, Clone, Envconfig, serde::Deserialize)]
pub struct BrokerConfig {
    #[envconfig(from = "BROKER_ID")]
    pub broker_id: i32,

    /// `host:port` of every broker in the cluster, including this one.
    #[envconfig(from = "CLUSTER_BROKERS")]
    pub cluster_brokers: String,

    /// A follower more than this many ms behind the leader's last fetch
    /// falls out of the ISR.
    #[envconfig(from = "REPLICA_LAG_MAX_MS", default = "10000")]
    pub replica_lag_max_ms: i64,

    /// `0` disables the message-count lag bound entirely, leaving
    /// `replica_lag_max_ms` as the sole ISR eligibility check.
    #[envconfig(from = "REPLICA_LAG_MAX_MESSAGES", default = "0")]
    pub replica_lag_max_messages: i64,

    #[envconfig(from = "MIN_INSYNC_REPLICAS", default = "1")]
    pub min_insync_replicas: i32,

    #[envconfig(from = "BATCH_MAX_SIZE", default = "1000")]
    pub batch_max_size: usize,

    #[envconfig(from = "BATCH_MAX_BYTES", default = "1048576")]
    pub batch_max_bytes: usize,

    #[envconfig(from = "BATCH_LINGER_MS", default = "5")]
    pub batch_linger_ms: u64,

    /// Upper bound the linger loop's adaptive target may grow to.
    #[envconfig(from = "BATCH_ADAPTIVE_MAX_SIZE", default = "10000")]
    pub batch_adaptive_max_size: usize,

    #[envconfig(from = "GROUP_MIN_SESSION_TIMEOUT_MS", default = "6000")]
    pub group_min_session_timeout_ms: i32,

    #[envconfig(from = "GROUP_MAX_SESSION_TIMEOUT_MS", default = "300000")]
    pub group_max_session_timeout_ms: i32,
}

impl BrokerConfig {
    /// Every `host:port` entry in `cluster_brokers`, in listed order.
    pub fn broker_addrs(&self) -> Vec<&str> {
        self.cluster_brokers.split(',').map(str::trim).collect()
    }

    /// This broker's own advertised `(host, port)`, taken as the
    /// `broker_id`-th entry of `cluster_brokers`. Falls back to
    /// `("localhost", 9092)` if the list is shorter than `broker_id`.
    pub fn own_host_port(&self) -> (String, i32) {
        let addrs = self.broker_addrs();
        let addr = addrs
            .get(self.broker_id as usize)
            .copied()
            .unwrap_or("localhost:9092");
        match addr.rsplit_once(':') {
            Some((host, port)) => (host.to_string(), port.parse().unwrap_or(9092)),
            None => (addr.to_string(), 9092),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_addrs_splits_on_comma() {
        let cfg = BrokerConfig {
            broker_id: 0,
            cluster_brokers: "host-a:9092, host-b:9092".into(),
            replica_lag_max_ms: 10_000,
            replica_lag_max_messages: 0,
            min_insync_replicas: 1,
            batch_max_size: 1000,
            batch_max_bytes: 1 << 20,
            batch_linger_ms: 5,
            batch_adaptive_max_size: 10_000,
            group_min_session_timeout_ms: 6000,
            group_max_session_timeout_ms: 300_000,
        };

        assert_eq!(cfg.broker_addrs(), vec!["host-a:9092", "host-b:9092"]);
    }
}
