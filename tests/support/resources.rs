//! Kubernetes resources for fake clusters

use fabric8_console_tests::prelude::*;
use indoc::formatdoc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub const NAMESPACE: &str = "fabric8-test";

/// Deserializes the given JSON value into the desired type.
pub fn from_value<T>(value: Value) -> T
where
    T: DeserializeOwned,
{
    T::deserialize(value).expect("Deserialization failed")
}

/// Deserializes the given YAML text into the desired type.
pub fn from_yaml<T>(yaml: &str) -> T
where
    T: DeserializeOwned,
{
    serde_yaml::from_str(yaml).expect("String is not a well-formed YAML")
}

/// A replication controller selecting the pods labeled with its name
pub fn replication_controller(name: &str) -> ReplicationController {
    from_yaml(&formatdoc!(
        "
        apiVersion: v1
        kind: ReplicationController
        metadata:
          name: {name}
          namespace: {namespace}
        spec:
          replicas: 1
          selector:
            project: {name}
        ",
        name = name,
        namespace = NAMESPACE,
    ))
}

/// A pod in the given phase with one container and the given
/// environment variables
pub fn pod(name: &str, phase: &str, env: &[(&str, &str)]) -> Pod {
    let env: Vec<Value> = env
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect();

    from_value(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": NAMESPACE
        },
        "spec": {
            "containers": [{
                "name": "main",
                "image": "fabric8/main:latest",
                "env": env
            }]
        },
        "status": {
            "phase": phase
        }
    }))
}

/// A running forge pod using the given archetypes version
pub fn forge_pod(archetypes_version: &str) -> Pod {
    pod(
        "fabric8-forge-x7k2p",
        "Running",
        &[
            ("KUBERNETES_NAMESPACE", NAMESPACE),
            ("FABRIC8_ARCHETYPES_VERSION", archetypes_version),
        ],
    )
}
