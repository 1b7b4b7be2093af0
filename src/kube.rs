//! Clients for querying the Kubernetes API
//!
//! The console tests only read cluster state. [`Cluster`] describes the
//! queries they need and [`KubeCluster`] answers them with a
//! [`Client`][kube::Client].

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, ReplicationController, Service};
use kube::api::{Api, ListParams, LogParams};
use kube::{Client, ResourceExt};

use crate::error::{Error, Result};

/// Annotation which fabric8 sets on services with their external URL
pub const EXPOSE_URL_ANNOTATION: &str = "fabric8.io/exposeUrl";

/// Read access to the state of the cluster
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Searches for a named replication controller.
    async fn find_replication_controller(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ReplicationController>>;

    /// Returns the pods selected by the named service.
    async fn pods_for_service(&self, namespace: &str, name: &str) -> Result<Vec<Pod>>;

    /// Returns the pods selected by the named replication controller.
    async fn pods_for_replication_controller(&self, namespace: &str, name: &str)
        -> Result<Vec<Pod>>;

    /// Returns the logs of the given pod.
    async fn pod_logs(&self, namespace: &str, pod_name: &str) -> Result<String>;

    /// Returns the URL under which the named service is reachable.
    async fn service_url(&self, namespace: &str, name: &str) -> Result<String>;
}

/// A [`Cluster`] backed by the Kubernetes API
///
/// [`KubeCluster`] wraps a [`Client`][kube::Client] configured from the
/// local kubeconfig or the in-cluster environment.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Creates a [`KubeCluster`] with the default client configuration.
    pub async fn new() -> Result<KubeCluster> {
        let client = Client::try_default().await?;
        Ok(KubeCluster { client })
    }

    /// Creates a [`KubeCluster`] which uses the given client.
    pub fn from_client(client: Client) -> KubeCluster {
        KubeCluster { client }
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        services.get_opt(name).await?.ok_or_else(|| {
            Error::Assertion(format!(
                "Service [{}] does not exist in namespace [{}]",
                name, namespace
            ))
        })
    }

    async fn list_selected_pods(
        &self,
        namespace: &str,
        selector: Option<&BTreeMap<String, String>>,
    ) -> Result<Vec<Pod>> {
        let label_selector = match selector.map(to_label_selector) {
            Some(label_selector) if !label_selector.is_empty() => label_selector,
            _ => return Ok(Vec::new()),
        };

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list_params = ListParams::default().labels(&label_selector);
        Ok(pods.list(&list_params).await?.items)
    }
}

#[async_trait]
impl Cluster for KubeCluster {
    async fn find_replication_controller(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ReplicationController>> {
        let controllers: Api<ReplicationController> =
            Api::namespaced(self.client.clone(), namespace);
        Ok(controllers.get_opt(name).await?)
    }

    async fn pods_for_service(&self, namespace: &str, name: &str) -> Result<Vec<Pod>> {
        let service = self.get_service(namespace, name).await?;
        let selector = service.spec.as_ref().and_then(|spec| spec.selector.as_ref());
        self.list_selected_pods(namespace, selector).await
    }

    async fn pods_for_replication_controller(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<Pod>> {
        let controller = self
            .find_replication_controller(namespace, name)
            .await?
            .ok_or_else(|| {
                Error::Assertion(format!(
                    "Replication controller [{}] does not exist in namespace [{}]",
                    name, namespace
                ))
            })?;
        let selector = controller
            .spec
            .as_ref()
            .and_then(|spec| spec.selector.as_ref());
        self.list_selected_pods(namespace, selector).await
    }

    async fn pod_logs(&self, namespace: &str, pod_name: &str) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(pods.logs(pod_name, &LogParams::default()).await?)
    }

    async fn service_url(&self, namespace: &str, name: &str) -> Result<String> {
        let service = self.get_service(namespace, name).await?;
        get_service_url(&service).ok_or_else(|| {
            Error::Assertion(format!(
                "Service [{}] in namespace [{}] exposes no URL",
                name, namespace
            ))
        })
    }
}

/// Joins label requirements to a selector: `key1=value1,key2=value2`.
pub fn to_label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Returns the URL of the given service.
///
/// The exposed URL annotation takes precedence over the cluster IP and
/// the first port of the service.
pub fn get_service_url(service: &Service) -> Option<String> {
    if let Some(url) = service.annotations().get(EXPOSE_URL_ANNOTATION) {
        return Some(url.trim_end_matches('/').to_owned());
    }

    let spec = service.spec.as_ref()?;
    let cluster_ip = spec
        .cluster_ip
        .as_deref()
        .filter(|ip| !ip.is_empty() && *ip != "None")?;
    let port = spec.ports.as_ref()?.first()?.port;
    Some(format!("http://{}:{}", cluster_ip, port))
}

/// Returns the value of an environment variable in the container
/// specifications of the given pod.
///
/// Variables which take their value from a reference are ignored.
pub fn get_pod_env_var(pod: &Pod, name: &str) -> Option<String> {
    pod.spec
        .as_ref()
        .into_iter()
        .flat_map(|spec| spec.containers.iter())
        .flat_map(|container| container.env.iter().flatten())
        .find(|env_var| env_var.name == name)
        .and_then(|env_var| env_var.value.clone())
}

/// Returns the phase of the given pod.
pub fn get_pod_phase(pod: &Pod) -> Option<&str> {
    pod.status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
}

/// Returns true if the given pod is in the phase `Running`.
pub fn is_running(pod: &Pod) -> bool {
    get_pod_phase(pod) == Some("Running")
}
