/// Shared by every router handler: an HTTP client for talking to shard
/// replicas and config-service replicas, and the ordered list of
/// config-service ports to fail over across.
pub struct RouterState {
    pub client: reqwest::Client,
    pub config_server_ports: Vec<u16>,
}
