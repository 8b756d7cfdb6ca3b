//! Istio networking resources (networking.istio.io/v1beta1)

use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Routing resource: hosts, gateways and weighted HTTP destinations
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "networking.istio.io",
    version = "v1beta1",
    kind = "VirtualService",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServiceSpec {
    pub hosts: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gateways: Vec<String>,

    pub http: Vec<HttpRoute>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct HttpRoute {
    pub name: String,
    pub route: Vec<HttpRouteDestination>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct HttpRouteDestination {
    pub destination: Destination,
    pub weight: i32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Destination {
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortSelector>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct PortSelector {
    pub number: u32,
}

/// Subset-destination resource: named partitions of one service host
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "networking.istio.io",
    version = "v1beta1",
    kind = "DestinationRule",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRuleSpec {
    pub host: String,
    pub subsets: Vec<Subset>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Subset {
    pub name: String,

    /// Left empty; the rollout controller patches in the revision hash
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_without_subset_omits_field() {
        let destination = Destination {
            host: "orders".to_string(),
            subset: None,
            port: Some(PortSelector { number: 8080 }),
        };
        let value = serde_yaml::to_value(&destination).unwrap();
        assert!(value.get("subset").is_none());
        assert_eq!(value["port"]["number"].as_u64(), Some(8080));
    }

    #[test]
    fn test_subset_keeps_empty_labels() {
        let value = serde_yaml::to_value(Subset {
            name: "stable".to_string(),
            labels: BTreeMap::new(),
        })
        .unwrap();
        assert!(value["labels"].as_mapping().unwrap().is_empty());
    }

    #[test]
    fn test_destination_rule_type_meta() {
        let rule = DestinationRule::new("orders", DestinationRuleSpec::default());
        let value = serde_yaml::to_value(&rule).unwrap();
        assert_eq!(value["apiVersion"].as_str(), Some("networking.istio.io/v1beta1"));
        assert_eq!(value["kind"].as_str(), Some("DestinationRule"));
    }
}
