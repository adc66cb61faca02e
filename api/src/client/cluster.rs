//! A thin client for a managed search cluster's settings and allocation apis

use std::collections::BTreeMap;

use super::Error;
use crate::conf::GatewaySettings;
use crate::send_build;

/// The cluster setting naming nodes excluded from shard allocation
const EXCLUDE_SETTING: &str = "cluster.routing.allocation.exclude._name";

/// The operations the scaler needs from a managed cluster's REST api
#[async_trait::async_trait]
pub trait Gateway {
    /// Merge a node into the cluster wide allocation exclude list
    ///
    /// Returns true iff the cluster acknowledged the setting. Appending a
    /// name that is already excluded is a no-op that returns true.
    ///
    /// # Arguments
    ///
    /// * `node` - The name of the node to exclude
    async fn append_exclusion(&self, node: &str) -> Result<bool, Error>;

    /// Remove a node from the cluster wide allocation exclude list
    ///
    /// # Arguments
    ///
    /// * `node` - The name of the node to stop excluding
    async fn remove_exclusion(&self, node: &str) -> Result<bool, Error>;

    /// Check whether any shard is currently allocated on a node
    ///
    /// # Arguments
    ///
    /// * `node` - The name of the node to check
    async fn has_shards_on_node(&self, node: &str) -> Result<bool, Error>;
}

/// The settings currently applied to a managed cluster
#[derive(Deserialize, Debug, Default)]
struct ClusterSettings {
    /// Settings that reset on a full cluster restart
    #[serde(default)]
    transient: BTreeMap<String, serde_json::Value>,
}

/// A managed cluster's answer to a settings update
#[derive(Deserialize, Debug)]
struct Acknowledged {
    /// Whether the cluster accepted the update
    acknowledged: bool,
}

/// A row in a managed cluster's shard allocation catalog
#[derive(Deserialize, Debug)]
pub struct ShardAllocation {
    /// The index this shard belongs to
    pub index: String,
    /// The shard number within its index
    pub shard: String,
    /// Whether this is a primary or a replica shard
    pub prirep: String,
    /// The allocation state of this shard
    pub state: String,
    /// The node this shard is allocated on if any
    pub node: Option<String>,
}

/// Split a comma joined exclude list into node names
///
/// # Arguments
///
/// * `raw` - The comma joined list to split
fn split_exclusions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Check whether any shard in an allocation catalog sits on a node
///
/// # Arguments
///
/// * `shards` - The allocation catalog to scan
/// * `node` - The node to look for
fn on_node(shards: &[ShardAllocation], node: &str) -> bool {
    shards
        .iter()
        .any(|shard| shard.node.as_deref() == Some(node))
}

/// A client for a single managed cluster's REST api
///
/// The client holds no state between calls; every operation is a synchronous
/// round trip bounded by the configured deadline.
#[derive(Clone)]
pub struct ClusterClient {
    /// The url this cluster's REST api listens at
    host: String,
    /// The user to authenticate as
    username: String,
    /// The password to authenticate with
    password: String,
    /// The reqwest client to send requests with
    client: reqwest::Client,
}

impl ClusterClient {
    /// Create a new client for a managed cluster
    ///
    /// # Arguments
    ///
    /// * `host` - The url the cluster's REST api can be reached at
    /// * `username` - The user to authenticate as
    /// * `password` - The password to authenticate with
    /// * `settings` - The gateway settings to apply
    pub fn new(
        host: &str,
        username: &str,
        password: &str,
        settings: &GatewaySettings,
    ) -> Result<Self, Error> {
        // make sure we were handed a parseable url
        url::Url::parse(host)?;
        // build a client enforcing the per call deadline
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout))
            .danger_accept_invalid_certs(settings.insecure)
            .build()?;
        Ok(ClusterClient {
            host: host.trim_end_matches('/').to_owned(),
            username: username.to_owned(),
            password: password.to_owned(),
            client,
        })
    }

    /// Read the current allocation exclude list
    ///
    /// Only the transient copy of the setting is read since that is the only
    /// copy the operator writes.
    async fn exclusions(&self) -> Result<Vec<String>, Error> {
        // build request
        let req = self
            .client
            .get(format!("{}/_cluster/settings?flat_settings=true", self.host))
            .basic_auth(&self.username, Some(&self.password));
        // send this request and parse the settings
        let settings = send_build!(self.client, req, ClusterSettings)?;
        // pull the comma joined exclude list out of the transient settings
        let raw = settings
            .transient
            .get(EXCLUDE_SETTING)
            .and_then(|value| value.as_str())
            .unwrap_or("");
        Ok(split_exclusions(raw))
    }

    /// Write the allocation exclude list back to the cluster
    ///
    /// # Arguments
    ///
    /// * `names` - The node names the list should contain
    async fn set_exclusions(&self, names: &[String]) -> Result<bool, Error> {
        // build the settings body with the new comma joined list
        let body = serde_json::json!({
            "transient": {
                "cluster.routing.allocation.exclude._name": names.join(",")
            }
        });
        // build request
        let req = self
            .client
            .put(format!("{}/_cluster/settings", self.host))
            .basic_auth(&self.username, Some(&self.password))
            .json(&body);
        // send this request and check the cluster accepted it
        let ack = send_build!(self.client, req, Acknowledged)?;
        Ok(ack.acknowledged)
    }
}

#[async_trait::async_trait]
impl Gateway for ClusterClient {
    /// Merge a node into the cluster wide allocation exclude list
    ///
    /// # Arguments
    ///
    /// * `node` - The name of the node to exclude
    async fn append_exclusion(&self, node: &str) -> Result<bool, Error> {
        // get the names that are already excluded
        let mut names = self.exclusions().await?;
        // a name that is already excluded does not need a settings write
        if names.iter().any(|name| name == node) {
            return Ok(true);
        }
        names.push(node.to_owned());
        self.set_exclusions(&names).await
    }

    /// Remove a node from the cluster wide allocation exclude list
    ///
    /// # Arguments
    ///
    /// * `node` - The name of the node to stop excluding
    async fn remove_exclusion(&self, node: &str) -> Result<bool, Error> {
        // get the names that are currently excluded
        let mut names = self.exclusions().await?;
        let before = names.len();
        names.retain(|name| name != node);
        // a name that is already absent does not need a settings write
        if names.len() == before {
            return Ok(true);
        }
        self.set_exclusions(&names).await
    }

    /// Check whether any shard is currently allocated on a node
    ///
    /// # Arguments
    ///
    /// * `node` - The name of the node to check
    async fn has_shards_on_node(&self, node: &str) -> Result<bool, Error> {
        // build request
        let req = self
            .client
            .get(format!("{}/_cat/shards?format=json", self.host))
            .basic_auth(&self.username, Some(&self.password));
        // send this request and scan the catalog for our node
        let shards = send_build!(self.client, req, Vec<ShardAllocation>)?;
        Ok(on_node(&shards, node))
    }
}

#[cfg(test)]
mod tests {
    use super::{on_node, split_exclusions, ShardAllocation};

    #[test]
    fn splits_comma_joined_exclude_lists() {
        let names = split_exclusions("cluster-test-nodes-3,cluster-test-master-1");
        assert_eq!(names, vec!["cluster-test-nodes-3", "cluster-test-master-1"]);
        // empty segments and whitespace are dropped
        let names = split_exclusions(" cluster-test-nodes-3 ,,");
        assert_eq!(names, vec!["cluster-test-nodes-3"]);
        assert!(split_exclusions("").is_empty());
    }

    #[test]
    fn finds_shards_in_an_allocation_catalog() {
        // parse a catalog the way the wire hands it to us
        let raw = r#"[
            {"index": "logs", "shard": "0", "prirep": "p", "state": "STARTED", "node": "cluster-test-nodes-3"},
            {"index": "logs", "shard": "0", "prirep": "r", "state": "STARTED", "node": "cluster-test-nodes-1"},
            {"index": "logs", "shard": "1", "prirep": "r", "state": "UNASSIGNED", "node": null}
        ]"#;
        let shards: Vec<ShardAllocation> = serde_json::from_str(raw).unwrap();
        assert!(on_node(&shards, "cluster-test-nodes-3"));
        assert!(!on_node(&shards, "cluster-test-nodes-2"));
    }
}
