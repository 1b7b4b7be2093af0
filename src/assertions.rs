//! Assertions about the resources in a namespace

use k8s_openapi::api::core::v1::{Pod, ReplicationController};
use kube::ResourceExt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::kube::{is_running, Cluster};
use crate::wait::PollFailure;

/// HTTP status codes with which the API server rejects log requests
/// while a container is not started yet or a pod was just replaced
const TRANSIENT_LOG_STATUS_CODES: &[u16] = &[400, 404];

/// Assertions about the resources in one namespace
pub struct NamespaceAssert<'a, C: Cluster + ?Sized> {
    cluster: &'a C,
    namespace: &'a str,
}

impl<'a, C: Cluster + ?Sized> NamespaceAssert<'a, C> {
    pub fn new(cluster: &'a C, namespace: &'a str) -> Self {
        NamespaceAssert { cluster, namespace }
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    /// Asserts that the named replication controller exists.
    pub async fn replication_controller(&self, name: &str) -> Result<ReplicationController> {
        self.cluster
            .find_replication_controller(self.namespace, name)
            .await?
            .ok_or_else(|| {
                Error::Assertion(format!(
                    "Replication controller [{}] does not exist in namespace [{}]",
                    name, self.namespace
                ))
            })
    }

    /// Asserts that at least one pod of the named service is running and
    /// returns the running pods.
    pub async fn running_pods_for_service(&self, name: &str) -> Result<Vec<Pod>> {
        let pods: Vec<Pod> = self
            .cluster
            .pods_for_service(self.namespace, name)
            .await?
            .into_iter()
            .filter(is_running)
            .collect();

        if pods.is_empty() {
            Err(Error::Assertion(format!(
                "No running pods found for service [{}] in namespace [{}]",
                name, self.namespace
            )))
        } else {
            Ok(pods)
        }
    }

    /// Asserts that the named replication controller has a pod and returns
    /// it.
    ///
    /// A running pod is preferred.
    pub async fn pod_for_replication_controller(&self, name: &str) -> Result<Pod> {
        let mut pods = self
            .cluster
            .pods_for_replication_controller(self.namespace, name)
            .await?;

        let index = pods.iter().position(is_running).unwrap_or(0);
        if pods.is_empty() {
            Err(Error::Assertion(format!(
                "No pods found for replication controller [{}] in namespace [{}]",
                name, self.namespace
            )))
        } else {
            Ok(pods.swap_remove(index))
        }
    }

    /// Checks whether the logs of a pod of the named replication
    /// controller contain the given text.
    ///
    /// Missing pods and logs which cannot be fetched yet leave the check
    /// pending. Other failures are fatal.
    pub async fn replication_controller_logs_contain(
        &self,
        name: &str,
        text: &str,
    ) -> Result<(), PollFailure> {
        let pods = self
            .cluster
            .pods_for_replication_controller(self.namespace, name)
            .await?;

        if pods.is_empty() {
            return Err(PollFailure::pending(format!(
                "no pods found for replication controller [{}]",
                name
            )));
        }

        let mut pod_names = Vec::new();
        for pod in &pods {
            let pod_name = pod.name_any();
            match self.cluster.pod_logs(self.namespace, &pod_name).await {
                Ok(logs) if logs.contains(text) => return Ok(()),
                Ok(_) => {}
                Err(error) if error.is_api_status(TRANSIENT_LOG_STATUS_CODES) => {
                    debug!(pod = %pod_name, %error, "Logs not available yet");
                }
                Err(error) => return Err(error.into()),
            }
            pod_names.push(pod_name);
        }

        Err(PollFailure::pending(format!(
            "logs of pods [{}] do not contain [{}]",
            pod_names.join(", "),
            text
        )))
    }
}
