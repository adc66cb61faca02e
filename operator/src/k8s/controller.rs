//! Watches SonarCluster resources and drives their reconciliation

use futures::StreamExt;
use kube::{
    api::{Api, ListParams},
    client::Client,
    runtime::{
        controller::{Action, Controller},
        finalizer::{finalizer, Event as Finalizer},
        watcher::Config,
    },
};
use sonar::{Conf, Error};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{event, Level};

use crate::args::OperateClusters;
use crate::k8s::clusters::ClusterMeta;
use crate::k8s::crds::{self, SonarCluster};
use crate::k8s::operate;

/// Controller state including kubeapi client and config
#[derive(Clone)]
pub struct State {
    /// kube API client
    client: Client,
    /// the loaded operator config
    conf: Conf,
}

/// Methods operating on controller state
impl State {
    /// Wrap state in Arc
    pub fn to_context(&self) -> Arc<State> {
        Arc::new(self.clone())
    }
}

/// Handle errors in the reconcile process
pub fn error_policy(_cluster: Arc<SonarCluster>, error: &Error, state: Arc<State>) -> Action {
    event!(Level::ERROR, "Controller error: {}", error);
    event!(
        Level::INFO,
        "Requeuing SonarCluster reconciliation in {} seconds",
        state.conf.operator.error_requeue
    );
    Action::requeue(Duration::from_secs(state.conf.operator.error_requeue))
}

/// Reconcile changes to a SonarCluster
///
/// # Arguments
///
/// * `cluster` - The cluster resource being changed
/// * `state` - Controller context including the client instance and config
pub async fn reconcile(cluster: Arc<SonarCluster>, state: Arc<State>) -> Result<Action, Error> {
    // build cluster metadata
    let meta = ClusterMeta::new(&cluster, &state.client).await?;
    let clusters_api: Api<SonarCluster> = Api::namespaced(meta.client.clone(), &meta.namespace);
    event!(
        Level::INFO,
        "Reconciling SonarCluster changes for {} in namespace {}",
        meta.name,
        meta.namespace
    );
    finalizer(&clusters_api, crds::CRD_NAME, cluster, |event| async {
        match event {
            Finalizer::Apply(_cluster) => operate::apply(&meta, &state.conf).await,
            Finalizer::Cleanup(_cluster) => operate::cleanup(&meta).await,
        }
    })
    .await
    .map_err(|e| Error::new(format!("Finalizer error: {}", e)))
}

/// Initialize the controller and shared state (given the crd is installed)
///
/// # Arguments
///
/// * `args` - Arguments passed to the sonar-operator operate sub command
pub async fn run(args: &OperateClusters) {
    // try to load a config file
    let conf = Conf::new(&args.config).expect("Failed to load config");
    // setup our tracer
    sonar::utils::trace::setup("SonarOperator", &conf.tracing);
    let client = Client::try_default()
        .await
        .expect("failed to create kube Client");
    // the crd always has to exist before we can read the resource from k8s
    // create the SonarCluster CRD in k8s
    crds::create_or_update(&client)
        .await
        .expect("failed to create SonarCluster CRD");
    // list SonarCluster resources
    let clusters_api: Api<SonarCluster> = Api::<SonarCluster>::all(client.clone());
    if let Err(e) = clusters_api.list(&ListParams::default().limit(1)).await {
        event!(Level::ERROR, "Failed to list SonarCluster API: {}", e);
        std::process::exit(1);
    }
    let state = State {
        client: client.clone(),
        conf,
    };
    // create the SonarCluster controller to watch for resource changes
    Controller::new(clusters_api, Config::default().any_semantic())
        .shutdown_on_signal()
        .run(reconcile, error_policy, state.to_context())
        .filter_map(|x| async move { std::result::Result::ok(x) })
        .for_each(|_| futures::future::ready(()))
        .await;
}
