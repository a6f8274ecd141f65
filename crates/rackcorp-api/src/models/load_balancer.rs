//! Load balancer models. The legacy endpoint spells these fields in lowercase.

use chrono::{DateTime, Utc};
use rackcorp_core::ids::{CustomerId, LoadBalancerId, NetworkId};
use rackcorp_core::wire::{self, Extra, NumberString};
use rackcorp_core::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a load balancer is reachable from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum LoadBalancerScope {
    /// Anycast across all locations
    Global,
    /// A single network
    Local,
    /// A scope this client does not know yet
    Other(String),
}

impl From<&str> for LoadBalancerScope {
    fn from(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "global" => Self::Global,
            "local" => Self::Local,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl From<LoadBalancerScope> for String {
    fn from(scope: LoadBalancerScope) -> Self {
        scope.to_string()
    }
}

impl fmt::Display for LoadBalancerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Local => f.write_str("local"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// A load balancer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadBalancer {
    /// Load balancer id
    pub id: LoadBalancerId,
    /// Display name
    pub name: String,
    /// Owning customer
    pub customer_id: Option<CustomerId>,
    /// Public hostname
    pub hostname: Option<String>,
    /// Standardised name
    pub std_name: Option<String>,
    /// Backend host source
    pub host_source: Option<String>,
    /// Host header forced towards the host source
    pub host_source_force_host: Option<String>,
    /// Host header forced towards backends
    pub backend_hostname_force: Option<String>,
    /// Status
    pub status: Option<String>,
    /// Creation time
    pub date_created: Option<DateTime<Utc>>,
    /// Last modification time
    pub date_modified: Option<DateTime<Utc>>,
    /// Configuration version
    pub version: Option<i64>,
    /// Reachability scope
    pub scope: Option<LoadBalancerScope>,
    /// Network of a local scope
    pub scope_network_id: Option<NetworkId>,
    /// Instance count of a local scope
    pub scope_instances: Option<i64>,
    /// Monthly traffic allocation in MB
    pub monthly_allocation_mb: Option<i64>,
    /// Traffic used this month in MB
    pub monthly_usage_mb: Option<i64>,
    /// Traffic left this month in MB
    pub traffic_remaining_mb: Option<i64>,
    /// Fields without a typed counterpart
    pub extra: Extra,
}

/// Filter for `loadbalancer.getall`. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadBalancerFilter {
    /// Match a single load balancer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<LoadBalancerId>,
    /// Match a customer's load balancers
    #[serde(rename = "customerid", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    /// Match by name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Match by standardised name
    #[serde(rename = "stdname", skip_serializing_if = "Option::is_none")]
    pub std_name: Option<String>,
    /// Match by hostname
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Offset of the first result
    #[serde(rename = "resStart", skip_serializing_if = "Option::is_none")]
    pub result_start: Option<u32>,
    /// Maximum number of results
    #[serde(rename = "resWindow", skip_serializing_if = "Option::is_none")]
    pub result_window: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLoadBalancer {
    #[serde(default)]
    id: Option<NumberString>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "customerid")]
    customer_id: Option<NumberString>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default, rename = "stdname")]
    std_name: Option<String>,
    #[serde(default, rename = "hostsource")]
    host_source: Option<String>,
    #[serde(default, rename = "hostsourceforcehost")]
    host_source_force_host: Option<String>,
    #[serde(default)]
    backend_hostname_force: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "datecreated")]
    date_created: Option<NumberString>,
    #[serde(default, rename = "datemodified")]
    date_modified: Option<NumberString>,
    #[serde(default)]
    version: Option<NumberString>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default, rename = "scope_networkid")]
    scope_network_id: Option<NumberString>,
    #[serde(default)]
    scope_instances: Option<NumberString>,
    #[serde(default, rename = "monthlyallocationmb")]
    monthly_allocation_mb: Option<NumberString>,
    #[serde(default, rename = "monthlyusagemb")]
    monthly_usage_mb: Option<NumberString>,
    #[serde(default, rename = "trafficremainingmb")]
    traffic_remaining_mb: Option<NumberString>,
    #[serde(flatten)]
    extra: Extra,
}

impl WireLoadBalancer {
    pub(crate) fn into_domain(self) -> Result<LoadBalancer> {
        Ok(LoadBalancer {
            id: LoadBalancerId::new(wire::required_i64("id", self.id.as_ref())?),
            customer_id: wire::opt_i64("customerid", self.customer_id.as_ref())?
                .map(CustomerId::new),
            date_created: wire::epoch_seconds("datecreated", self.date_created.as_ref())?,
            date_modified: wire::epoch_seconds("datemodified", self.date_modified.as_ref())?,
            version: wire::opt_i64("version", self.version.as_ref())?,
            scope: wire::non_empty(self.scope).map(|raw| LoadBalancerScope::from(raw.as_str())),
            scope_network_id: wire::opt_i64("scope_networkid", self.scope_network_id.as_ref())?
                .filter(|id| *id != 0)
                .map(NetworkId::new),
            scope_instances: wire::opt_i64("scope_instances", self.scope_instances.as_ref())?,
            monthly_allocation_mb: wire::opt_i64(
                "monthlyallocationmb",
                self.monthly_allocation_mb.as_ref(),
            )?,
            monthly_usage_mb: wire::opt_i64("monthlyusagemb", self.monthly_usage_mb.as_ref())?,
            traffic_remaining_mb: wire::opt_i64(
                "trafficremainingmb",
                self.traffic_remaining_mb.as_ref(),
            )?,
            name: self.name.unwrap_or_default(),
            hostname: wire::non_empty(self.hostname),
            std_name: wire::non_empty(self.std_name),
            host_source: wire::non_empty(self.host_source),
            host_source_force_host: wire::non_empty(self.host_source_force_host),
            backend_hostname_force: wire::non_empty(self.backend_hostname_force),
            status: wire::non_empty(self.status),
            extra: self.extra,
        })
    }
}

/// Payload of `loadbalancer.getall`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoadBalancerListPayload {
    #[serde(default)]
    pub(crate) loadbalancers: Option<Vec<WireLoadBalancer>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<LoadBalancer> {
        serde_json::from_value::<WireLoadBalancer>(value)
            .unwrap()
            .into_domain()
    }

    #[test]
    fn load_balancer_decodes() {
        let lb = decode(json!({
            "id": "31",
            "name": "edge",
            "customerid": 456,
            "hostname": "edge.example.com",
            "stdname": "EDGE",
            "status": "ACTIVE",
            "datecreated": "1700000000",
            "datemodified": 0,
            "version": 4,
            "scope": "local",
            "scope_networkid": "12",
            "scope_instances": 2,
            "monthlyallocationmb": 1024,
            "monthlyusagemb": "100",
            "trafficremainingmb": 924,
            "backends": [{"ip": "10.0.0.2"}]
        }))
        .unwrap();

        assert_eq!(lb.id, LoadBalancerId::new(31));
        assert_eq!(lb.customer_id, Some(CustomerId::new(456)));
        assert_eq!(lb.date_created.unwrap().timestamp(), 1_700_000_000);
        assert!(lb.date_modified.is_none());
        assert_eq!(lb.scope, Some(LoadBalancerScope::Local));
        assert_eq!(lb.scope_network_id, Some(NetworkId::new(12)));
        assert_eq!(lb.monthly_usage_mb, Some(100));
        assert!(lb.extra.contains_key("backends"));
    }

    #[test]
    fn unknown_scope_is_kept() {
        let lb = decode(json!({"id": 1, "scope": "regional"})).unwrap();
        assert_eq!(lb.scope, Some(LoadBalancerScope::Other("regional".to_string())));
        assert_eq!(serde_json::to_value(&lb.scope).unwrap(), json!("regional"));
    }

    #[test]
    fn global_scope_has_no_network() {
        let lb = decode(json!({"id": 1, "scope": "GLOBAL", "scope_networkid": 0})).unwrap();
        assert_eq!(lb.scope, Some(LoadBalancerScope::Global));
        assert!(lb.scope_network_id.is_none());
    }

    #[test]
    fn bad_customer_id_is_decode_error() {
        let err = decode(json!({"id": 1, "customerid": "x1"})).unwrap_err();
        assert!(matches!(err, rackcorp_core::Error::Decode { ref field, .. } if field == "customerid"));
    }

    #[test]
    fn filter_uses_lowercase_names() {
        let filter = LoadBalancerFilter {
            customer_id: Some(CustomerId::new(456)),
            std_name: Some("EDGE".to_string()),
            result_window: Some(10),
            ..LoadBalancerFilter::default()
        };
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"customerid": 456, "stdname": "EDGE", "resWindow": 10})
        );
    }
}
