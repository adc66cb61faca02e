//! The k8s backed collaborators the scaler drives

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::api::PostParams;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Resource;
use sonar::conf::{Conf, GatewaySettings};
use sonar::models::{ClusterStatus, WorkloadRef};
use sonar::{ClusterClient, Error};
use tracing::{event, Level};

use super::clusters::ClusterMeta;
use super::scaler::{Orchestrator, ScaleReason};
use super::statefulsets;
use crate::app::builders;

/// The orchestrator capabilities backed by the kube api
pub struct K8sOrchestrator {
    /// The cluster client and metadata
    meta: ClusterMeta,
    /// The url the managed cluster's REST api listens at
    url: String,
    /// The user to authenticate against the managed cluster as
    username: String,
    /// The password to authenticate against the managed cluster with
    password: String,
    /// The gateway settings to apply
    settings: GatewaySettings,
    /// The recorder to publish events through
    recorder: Recorder,
    /// The resource events attach to
    reference: ObjectReference,
}

impl K8sOrchestrator {
    /// Build the k8s backed collaborators for one cluster
    ///
    /// # Arguments
    ///
    /// * `meta` - The cluster client and metadata
    /// * `conf` - The operator config
    pub async fn new(meta: &ClusterMeta, conf: &Conf) -> Result<Self, Error> {
        // look up the admin credentials for the managed cluster
        let (username, password) = builders::username_and_password(meta).await?;
        // build the url its REST api listens at
        let url = builders::cluster_url(meta, &conf.gateway);
        // build a recorder for advisory events on the cluster resource
        let reporter = Reporter {
            controller: "sonar-operator".to_owned(),
            instance: None,
        };
        let recorder = Recorder::new(meta.client.clone(), reporter);
        let reference = meta.cluster.object_ref(&());
        Ok(K8sOrchestrator {
            meta: meta.clone(),
            url,
            username,
            password,
            settings: conf.gateway.clone(),
            recorder,
            reference,
        })
    }
}

#[async_trait]
impl Orchestrator for K8sOrchestrator {
    type Gateway = ClusterClient;

    /// Persist a new replica target for a node pool workload
    ///
    /// # Arguments
    ///
    /// * `workload` - The workload reference carrying the new target
    async fn update_workload(&mut self, workload: &WorkloadRef) -> Result<(), Error> {
        statefulsets::set_replicas(&self.meta, workload).await
    }

    /// Persist the component statuses on the cluster resource
    ///
    /// # Arguments
    ///
    /// * `statuses` - The status collection to persist
    async fn update_statuses(&mut self, statuses: &ClusterStatus) -> Result<(), Error> {
        // read the resource fresh so a stale writer conflicts on its
        // resource version instead of clobbering newer status
        let mut cluster = self.meta.clusters_api.get(&self.meta.name).await?;
        cluster.status = Some(statuses.clone());
        let raw = serde_json::to_vec(&cluster)?;
        self.meta
            .clusters_api
            .replace_status(&self.meta.name, &PostParams::default(), raw)
            .await?;
        Ok(())
    }

    /// Build a gateway to the managed cluster's REST api
    async fn gateway(&self) -> Result<ClusterClient, Error> {
        ClusterClient::new(&self.url, &self.username, &self.password, &self.settings)
    }

    /// Emit an advisory event on the cluster resource
    ///
    /// # Arguments
    ///
    /// * `reason` - The reason for this event
    /// * `msg` - The message describing this event
    async fn emit(&mut self, reason: ScaleReason, msg: String) {
        let kind = if reason.is_warning() {
            EventType::Warning
        } else {
            EventType::Normal
        };
        let to_publish = Event {
            type_: kind,
            reason: reason.as_str().to_owned(),
            note: Some(msg),
            action: "Scale".to_owned(),
            secondary: None,
        };
        // events are advisory so a failed publish only warns
        if let Err(error) = self.recorder.publish(&to_publish, &self.reference).await {
            event!(
                Level::WARN,
                error = error.to_string(),
                "failed to publish scaler event"
            );
        }
    }
}
