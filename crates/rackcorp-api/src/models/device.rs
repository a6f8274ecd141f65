//! Device models.
//!
//! The REST `devices/{id}` resource and the legacy `device.getall` list share
//! one wire struct: the two endpoints disagree on a handful of names (`dcid` vs
//! `dcId`, `deviceId` vs `id`) and on whether numbers arrive quoted.

use chrono::{DateTime, Utc};
use rackcorp_core::ids::{CustomerId, DataCenterId, DeviceId};
use rackcorp_core::wire::{self, Extra, NumberString};
use rackcorp_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::IpAddr;

/// Generates a string-backed enum whose unknown wire values survive as `Other`.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Value this client does not know, kept verbatim
            Other(String),
        }

        impl $name {
            /// Wire spelling of the value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(raw) => raw,
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                $(
                    if raw.eq_ignore_ascii_case($wire) {
                        return Self::$variant;
                    }
                )+
                Self::Other(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match Self::from(raw.as_str()) {
                    Self::Other(_) => Self::Other(raw),
                    known => known,
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(raw) => raw,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

open_enum! {
    /// Traffic direction a firewall policy applies to.
    FirewallDirection {
        /// Inbound traffic
        Input => "INPUT",
        /// Outbound traffic
        Output => "OUTPUT",
    }
}

open_enum! {
    /// Action of a firewall policy.
    ///
    /// `Deleted` is not an action: sending it removes the existing policy with the same id.
    FirewallPolicyStatus {
        /// Accept matching traffic
        Allow => "ALLOW",
        /// Reject matching traffic
        Reject => "REJECT",
        /// Keep the policy but do not apply it
        Disabled => "DISABLED",
        /// Remove the policy
        Deleted => "DELETED",
    }
}

/// A device firewall policy, as sent to and returned by the REST endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallPolicy {
    /// Provider assigned id, required to modify or delete an existing policy.
    #[serde(
        default,
        deserialize_with = "wire::lenient_opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    /// Traffic direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<FirewallDirection>,
    /// Action, or `DELETED` to remove the policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<FirewallPolicyStatus>,
    /// Protocol (`TCP`, `UDP`, `ICMP`, `ANY`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// First port of the range.
    #[serde(
        default,
        deserialize_with = "wire::lenient_opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub port_from: Option<i64>,
    /// Last port of the range.
    #[serde(
        default,
        deserialize_with = "wire::lenient_opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub port_to: Option<i64>,
    /// Source or destination address, optionally with a prefix length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Free-form comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Evaluation order.
    #[serde(
        default,
        deserialize_with = "wire::lenient_opt_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub order: Option<i64>,
    /// Fields without a typed counterpart.
    #[serde(flatten)]
    pub extra: Extra,
}

impl FirewallPolicy {
    /// A policy with only its direction set.
    #[must_use]
    pub fn new(direction: FirewallDirection) -> Self {
        Self {
            id: None,
            direction: Some(direction),
            policy: None,
            protocol: None,
            port_from: None,
            port_to: None,
            ip_address: None,
            comment: None,
            order: None,
            extra: Extra::new(),
        }
    }

    /// Marker entry that deletes the existing policy `id`.
    #[must_use]
    pub fn deletion(id: i64, direction: FirewallDirection) -> Self {
        Self::new(direction).with_id(id).with_status(FirewallPolicyStatus::Deleted)
    }

    /// Target an existing policy.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the action.
    #[must_use]
    pub fn with_status(mut self, status: FirewallPolicyStatus) -> Self {
        self.policy = Some(status);
        self
    }

    /// Set the protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Set the port range.
    #[must_use]
    pub fn with_ports(mut self, from: i64, to: i64) -> Self {
        self.port_from = Some(from);
        self.port_to = Some(to);
        self
    }

    /// Set the address the policy matches.
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    /// Set the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// True when this entry removes a policy instead of setting one.
    #[must_use]
    pub fn is_deletion(&self) -> bool {
        self.policy == Some(FirewallPolicyStatus::Deleted)
    }
}

/// Network port activity reported by `device.getall`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevicePort {
    /// Interface index
    pub interface: Option<i64>,
    /// Inbound activity in Mbit/s
    pub activity_in_mbit: Option<f64>,
    /// Outbound activity in Mbit/s
    pub activity_out_mbit: Option<f64>,
    /// Link status (`UP`, `DOWN`)
    pub status: Option<String>,
}

/// A device (server, VM, appliance).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    /// Device id
    pub device_id: DeviceId,
    /// Display name
    pub name: String,
    /// Standardised name
    pub std_name: Option<String>,
    /// Owning customer
    pub customer_id: Option<CustomerId>,
    /// Primary IP address, CIDR suffix removed
    pub primary_ip: Option<IpAddr>,
    /// Provisioning status
    pub status: Option<String>,
    /// Device type
    pub device_type: Option<String>,
    /// Data centre id
    pub data_center_id: Option<DataCenterId>,
    /// Data centre name
    pub data_center_name: Option<String>,
    /// Reachability as last observed
    pub online_status: Option<String>,
    /// Detected operating system
    pub os_guess: Option<String>,
    /// Operating system state
    pub os_state: Option<String>,
    /// Hypervisor device id, for virtual machines
    pub vm_host_id: Option<DeviceId>,
    /// Hypervisor name, for virtual machines
    pub vm_host_name: Option<String>,
    /// Firewall policies (REST only)
    pub firewall_policies: Vec<FirewallPolicy>,
    /// Network ports (legacy list only)
    pub ports: Vec<DevicePort>,
    /// Processor utilisation, shape varies by device type
    pub processor_utilisation: Option<Value>,
    /// Creation time
    pub date_created: Option<DateTime<Utc>>,
    /// Last modification time
    pub date_modified: Option<DateTime<Utc>>,
    /// Whether traffic is pooled with other devices
    pub traffic_shared: bool,
    /// Traffic used this period
    pub traffic_current: Option<f64>,
    /// Traffic estimated for the period
    pub traffic_estimated: Option<f64>,
    /// Traffic allowance in MB
    pub traffic_mb: Option<i64>,
    /// Fields without a typed counterpart
    pub extra: Extra,
}

/// Filter for `device.getall`. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceFilter {
    /// Match a single device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DeviceId>,
    /// Match a customer's devices
    #[serde(rename = "customerID", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    /// Match by name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Match by standardised name
    #[serde(rename = "stdName", skip_serializing_if = "Option::is_none")]
    pub std_name: Option<String>,
    /// Offset of the first result
    #[serde(rename = "resStart", skip_serializing_if = "Option::is_none")]
    pub result_start: Option<u32>,
    /// Maximum number of results
    #[serde(rename = "resWindow", skip_serializing_if = "Option::is_none")]
    pub result_window: Option<u32>,
}

impl DeviceFilter {
    /// Empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one customer.
    #[must_use]
    pub fn with_customer(mut self, customer_id: impl Into<CustomerId>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    /// Restrict by name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Request one page of results.
    #[must_use]
    pub const fn with_page(mut self, start: u32, window: u32) -> Self {
        self.result_start = Some(start);
        self.result_window = Some(window);
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePort {
    #[serde(default)]
    device_interface: Option<NumberString>,
    #[serde(default)]
    activity_in_mbit: Option<NumberString>,
    #[serde(default)]
    activity_out_mbit: Option<NumberString>,
    #[serde(default)]
    status: Option<String>,
}

impl WirePort {
    fn into_domain(self) -> Result<DevicePort> {
        Ok(DevicePort {
            interface: wire::opt_i64("ports.deviceInterface", self.device_interface.as_ref())?,
            activity_in_mbit: wire::opt_f64(
                "ports.activityInMbit",
                self.activity_in_mbit.as_ref(),
            )?,
            activity_out_mbit: wire::opt_f64(
                "ports.activityOutMbit",
                self.activity_out_mbit.as_ref(),
            )?,
            status: wire::non_empty(self.status),
        })
    }
}

/// Device as either endpoint sends it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDevice {
    #[serde(default)]
    device_id: Option<NumberString>,
    #[serde(default)]
    id: Option<NumberString>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    std_name: Option<String>,
    #[serde(default)]
    customer_id: Option<NumberString>,
    #[serde(default, rename = "primaryIP")]
    primary_ip: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "type")]
    device_type: Option<String>,
    #[serde(default, rename = "dcId", alias = "dcid")]
    dc_id: Option<NumberString>,
    #[serde(default)]
    dc_name: Option<String>,
    #[serde(default)]
    online_status: Option<String>,
    #[serde(default)]
    os_guess: Option<String>,
    #[serde(default)]
    os_state: Option<String>,
    #[serde(default, rename = "vmhostId")]
    vm_host_id: Option<NumberString>,
    #[serde(default, rename = "vmhostName")]
    vm_host_name: Option<String>,
    #[serde(default)]
    firewall_policies: Option<Vec<FirewallPolicy>>,
    #[serde(default)]
    ports: Option<Vec<WirePort>>,
    #[serde(default)]
    processor_utilisation: Option<Value>,
    #[serde(default)]
    date_created: Option<NumberString>,
    #[serde(default)]
    date_modified: Option<NumberString>,
    #[serde(default, deserialize_with = "wire::flexible_bool")]
    traffic_shared: bool,
    #[serde(default)]
    traffic_current: Option<NumberString>,
    #[serde(default)]
    traffic_estimated: Option<NumberString>,
    #[serde(default, rename = "trafficMB")]
    traffic_mb: Option<NumberString>,
    #[serde(flatten)]
    extra: Extra,
}

impl WireDevice {
    /// Convert to the domain type. `deviceId` wins over `id` when both are present.
    pub(crate) fn into_domain(self) -> Result<Device> {
        let raw_id = self
            .device_id
            .as_ref()
            .filter(|raw| !raw.is_empty())
            .or(self.id.as_ref());
        let device_id = DeviceId::new(wire::required_i64("deviceId", raw_id)?);
        let customer_id =
            wire::opt_i64("customerId", self.customer_id.as_ref())?.map(CustomerId::new);
        let primary_ip = match self.primary_ip.as_deref() {
            Some(raw) => wire::parse_ip("primaryIP", raw)?,
            None => None,
        };
        let data_center_id = wire::opt_i64("dcId", self.dc_id.as_ref())?.map(DataCenterId::new);
        let vm_host_id = wire::opt_i64("vmhostId", self.vm_host_id.as_ref())?
            .filter(|id| *id != 0)
            .map(DeviceId::new);
        let date_created = wire::epoch_seconds("dateCreated", self.date_created.as_ref())?;
        let date_modified = wire::epoch_seconds("dateModified", self.date_modified.as_ref())?;
        let traffic_current = wire::opt_f64("trafficCurrent", self.traffic_current.as_ref())?;
        let traffic_estimated =
            wire::opt_f64("trafficEstimated", self.traffic_estimated.as_ref())?;
        let traffic_mb = wire::opt_i64("trafficMB", self.traffic_mb.as_ref())?;
        let ports = self
            .ports
            .unwrap_or_default()
            .into_iter()
            .map(WirePort::into_domain)
            .collect::<Result<Vec<_>>>()?;

        Ok(Device {
            device_id,
            name: self.name.unwrap_or_default(),
            std_name: wire::non_empty(self.std_name),
            customer_id,
            primary_ip,
            status: wire::non_empty(self.status),
            device_type: wire::non_empty(self.device_type),
            data_center_id,
            data_center_name: wire::non_empty(self.dc_name),
            online_status: wire::non_empty(self.online_status),
            os_guess: wire::non_empty(self.os_guess),
            os_state: wire::non_empty(self.os_state),
            vm_host_id,
            vm_host_name: wire::non_empty(self.vm_host_name),
            firewall_policies: self.firewall_policies.unwrap_or_default(),
            ports,
            processor_utilisation: self.processor_utilisation,
            date_created,
            date_modified,
            traffic_shared: self.traffic_shared,
            traffic_current,
            traffic_estimated,
            traffic_mb,
            extra: self.extra,
        })
    }
}

/// Payload of `device.getall`.
#[derive(Debug, Deserialize)]
pub(crate) struct DeviceListPayload {
    #[serde(default)]
    pub(crate) devices: Option<Vec<WireDevice>>,
}

/// Body of `PUT devices/{id}/firewall`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FirewallUpdateRequest<'a> {
    pub(crate) firewall_policies: &'a [FirewallPolicy],
}
