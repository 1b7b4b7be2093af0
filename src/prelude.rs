pub use crate::assertions::NamespaceAssert;
pub use crate::browser::{Browser, Locator, WebDriverBrowser};
pub use crate::config::Config;
pub use crate::console::{Fabric8Console, TestFabric8Console};
pub use crate::error::{Error, Result};
pub use crate::forge::{NewProjectFormData, ProjectsPage};
pub use crate::jenkins::{BuildServer, BuildStatus, JenkinsServer};
pub use crate::kube::{get_pod_env_var, Cluster, KubeCluster};
pub use crate::wait::{ConvergenceWaiter, PollFailure, Predicate, UNFINISHED_EVALUATION};

pub use k8s_openapi::api::core::v1::{Pod, ReplicationController, Service};
