use std::collections::HashMap;

use serde::Deserialize;

/// The shard map as the config service serializes it: decimal shard ids
/// mapped to string values, plus a `shardCount` entry of the same shape.
/// Deserializing into a plain string map first keeps us honest about the
/// wire format before picking `shardCount` back out of it.
#[derive(Debug, Clone, Deserialize)]
struct RawConfig(HashMap<String, String>);

#[derive(Debug, Clone)]
pub struct ShardConfig {
    pub shard_count: u32,
    addresses: HashMap<u32, String>,
}

impl ShardConfig {
    /// Looks up a shard's raft address and converts it to the HTTP address
    /// data replicas actually serve requests on (raft port minus 10000).
    pub fn http_address_of(&self, shard_id: u32) -> Option<String> {
        let raft_addr = self.addresses.get(&shard_id)?;
        raft_addr_to_http_addr(raft_addr)
    }
}

fn raft_addr_to_http_addr(raft_addr: &str) -> Option<String> {
    let (host, port) = raft_addr.rsplit_once(':')?;
    let raft_port: u16 = port.parse().ok()?;
    let http_port = raft_port.checked_sub(10000)?;
    Some(format!("{host}:{http_port}"))
}

/// Fetches `/config` from the first reachable config-service replica in
/// `ports`, trying each in order. One fetch serves both the shard-count
/// lookup and the address lookup for a single incoming request, unlike the
/// two independent fetches an earlier version of this router made.
pub async fn fetch_config(
    client: &reqwest::Client,
    ports: &[u16],
) -> anyhow::Result<ShardConfig> {
    let mut last_err = None;

    for &port in ports {
        let url = format!("http://127.0.0.1:{port}/config");
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<RawConfig>().await {
                Ok(raw) => {
                    tracing::debug!(port, "fetched shard config");
                    return parse_config(raw);
                }
                Err(e) => last_err = Some(anyhow::Error::from(e)),
            },
            Ok(resp) => {
                last_err = Some(anyhow::anyhow!("config server on port {port} returned {}", resp.status()));
            }
            Err(e) => last_err = Some(anyhow::Error::from(e)),
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no config servers configured")))
}

fn parse_config(raw: RawConfig) -> anyhow::Result<ShardConfig> {
    let mut addresses = HashMap::new();
    let mut shard_count = None;

    for (key, value) in raw.0 {
        if key == "shardCount" {
            shard_count = Some(value.parse::<u32>()?);
        } else {
            let shard_id: u32 = key.parse()?;
            addresses.insert(shard_id, value);
        }
    }

    let shard_count = shard_count.ok_or_else(|| anyhow::anyhow!("config response had no shardCount"))?;
    Ok(ShardConfig { shard_count, addresses })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shard_count_and_addresses() {
        let mut raw = HashMap::new();
        raw.insert("shardCount".to_string(), "2".to_string());
        raw.insert("1".to_string(), "127.0.0.1:18001".to_string());
        raw.insert("2".to_string(), "127.0.0.1:18002".to_string());

        let config = parse_config(RawConfig(raw)).unwrap();
        assert_eq!(config.shard_count, 2);
        assert_eq!(config.http_address_of(1).as_deref(), Some("127.0.0.1:8001"));
        assert_eq!(config.http_address_of(2).as_deref(), Some("127.0.0.1:8002"));
    }

    #[test]
    fn unknown_shard_id_has_no_address() {
        let mut raw = HashMap::new();
        raw.insert("shardCount".to_string(), "1".to_string());
        raw.insert("1".to_string(), "127.0.0.1:18001".to_string());

        let config = parse_config(RawConfig(raw)).unwrap();
        assert!(config.http_address_of(9).is_none());
    }

    #[test]
    fn missing_shard_count_is_an_error() {
        let raw = HashMap::new();
        assert!(parse_config(RawConfig(raw)).is_err());
    }

    #[test]
    fn raft_port_minus_ten_thousand_is_the_http_port() {
        let mut raw = HashMap::new();
        raw.insert("shardCount".to_string(), "5".to_string());
        raw.insert("5".to_string(), "localhost:18005".to_string());

        let config = parse_config(RawConfig(raw)).unwrap();
        assert_eq!(config.http_address_of(5).as_deref(), Some("localhost:8005"));
    }
}
