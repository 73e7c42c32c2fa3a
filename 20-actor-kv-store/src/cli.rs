use std::{net::SocketAddr, time::Duration};

use clap::Parser;

use crate::processor::{StoreConfig, DEFAULT_QUEUE_CAPACITY};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Socket address the HTTP server should bind to. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Number of requests that may wait for the store worker before callers are held back.
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, value_parser = parse_capacity)]
    pub queue_capacity: usize,

    /// Reject requests that are still queued this many milliseconds after they arrived.
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,
}

impl Cli {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            queue_capacity: self.queue_capacity,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_capacity(raw: &str) -> Result<usize, String> {
    let capacity: usize = raw
        .parse()
        .map_err(|err| format!("invalid queue capacity '{raw}': {err}"))?;
    if capacity == 0 {
        return Err("queue capacity must be at least 1".to_string());
    }
    Ok(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_listen_on_port_8000() {
        let cli = Cli::try_parse_from(["actor-kv-store"]).expect("defaults parse");
        assert_eq!(cli.listen, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(cli.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(cli.request_timeout(), None);
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "actor-kv-store",
            "--listen",
            "127.0.0.1:0",
            "--queue-capacity",
            "8",
            "--request-timeout-ms",
            "250",
        ])
        .expect("overrides parse");
        assert_eq!(cli.store_config().queue_capacity, 8);
        assert_eq!(cli.request_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_zero_capacity() {
        let result = Cli::try_parse_from(["actor-kv-store", "--queue-capacity", "0"]);
        assert!(result.is_err());
    }
}
