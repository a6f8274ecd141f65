//! Order and order contract models.
//!
//! Order and contract identifiers stay strings on the caller side: the provider
//! hands them out as either JSON numbers or strings and callers pass them back
//! verbatim.

use rackcorp_core::wire::{self, Extra, NumberString};
use rackcorp_core::Result;
use serde::{Deserialize, Serialize};

/// Operating system install options for a new server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Install {
    /// Operating system image code, e.g. `UBUNTU22.04_64`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    /// Hostname to configure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl Install {
    fn is_empty(&self) -> bool {
        self.operating_system.is_none() && self.hostname.is_none()
    }
}

/// One storage volume of a new server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    /// Size in GB
    #[serde(rename = "sizeGB")]
    pub size_gb: u32,
    /// Storage class, e.g. `SSD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
}

/// Product configuration sent with `order.create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    /// Virtual CPU count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_count: Option<u32>,
    /// Memory in GB
    #[serde(default, rename = "memoryGB", skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<u32>,
    /// Storage volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage: Vec<Storage>,
    /// Install options
    #[serde(default, skip_serializing_if = "Install::is_empty")]
    pub install: Install,
    /// Location code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Monthly traffic allowance in GB
    #[serde(default, rename = "trafficGB", skip_serializing_if = "Option::is_none")]
    pub traffic_gb: Option<u32>,
}

impl ProductDetails {
    /// Empty product configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CPU count.
    #[must_use]
    pub const fn with_cpu_count(mut self, cpu_count: u32) -> Self {
        self.cpu_count = Some(cpu_count);
        self
    }

    /// Set the memory size.
    #[must_use]
    pub const fn with_memory_gb(mut self, memory_gb: u32) -> Self {
        self.memory_gb = Some(memory_gb);
        self
    }

    /// Add a storage volume.
    #[must_use]
    pub fn with_storage(mut self, size_gb: u32, storage_type: impl Into<String>) -> Self {
        self.storage.push(Storage {
            size_gb,
            storage_type: Some(storage_type.into()),
        });
        self
    }

    /// Set the operating system.
    #[must_use]
    pub fn with_operating_system(mut self, operating_system: impl Into<String>) -> Self {
        self.install.operating_system = Some(operating_system.into());
        self
    }

    /// Set the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Result of `order.confirm`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfirmedOrder {
    /// Contracts created by the confirmation
    pub contract_ids: Vec<String>,
}

/// Result of `order.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedOrder {
    /// New order id
    pub order_id: String,
    /// Human readable summary of the changes, one per line
    pub change_text: String,
}

/// An order as returned by `GET order/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    /// Order id
    pub order_id: String,
    /// Owning customer
    pub customer_id: Option<String>,
    /// Contract created from the order, once confirmed
    pub contract_id: Option<String>,
    /// Order status, e.g. `PENDING`, `ACCEPTED`
    pub status: Option<String>,
    /// Fields without a typed counterpart
    pub extra: Extra,
}

/// A billing contract returned by `order.contract.get`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderContract {
    /// Contract id
    pub contract_id: String,
    /// Owning customer
    pub customer_id: Option<String>,
    /// Device the contract provisions
    pub device_id: Option<String>,
    /// Contract status
    pub status: Option<String>,
    /// Contract type
    pub contract_type: Option<String>,
    /// Fields without a typed counterpart
    pub extra: Extra,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderConfirmParams<'a> {
    pub(crate) order_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderCreateParams<'a> {
    pub(crate) product_code: &'a str,
    pub(crate) customer_id: &'a str,
    pub(crate) product_details: &'a ProductDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContractGetParams<'a> {
    pub(crate) contract_id: &'a str,
}

/// Payload of `order.confirm`.
#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmPayload {
    #[serde(default, rename = "contractID", alias = "contractId")]
    contract_ids: Option<Vec<NumberString>>,
}

impl ConfirmPayload {
    pub(crate) fn into_domain(self) -> Option<ConfirmedOrder> {
        let contract_ids = self.contract_ids?;
        Some(ConfirmedOrder {
            contract_ids: contract_ids
                .into_iter()
                .map(NumberString::into_string)
                .collect(),
        })
    }
}

/// Payload of `order.create`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePayload {
    #[serde(default)]
    order_id: Option<NumberString>,
    #[serde(default)]
    change_txt: Option<String>,
}

impl CreatePayload {
    pub(crate) fn into_domain(self) -> Option<CreatedOrder> {
        Some(CreatedOrder {
            order_id: wire::opt_text(self.order_id)?,
            change_text: self.change_txt.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireOrder {
    #[serde(default)]
    order_id: Option<NumberString>,
    #[serde(default)]
    customer_id: Option<NumberString>,
    #[serde(default)]
    contract_id: Option<NumberString>,
    #[serde(default)]
    status: Option<String>,
    #[serde(flatten)]
    extra: Extra,
}

impl WireOrder {
    pub(crate) fn into_domain(self) -> Result<Order> {
        Ok(Order {
            order_id: required_text("orderId", self.order_id)?,
            customer_id: wire::opt_text(self.customer_id),
            contract_id: wire::opt_text(self.contract_id),
            status: wire::non_empty(self.status),
            extra: self.extra,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireOrderContract {
    #[serde(default)]
    contract_id: Option<NumberString>,
    #[serde(default)]
    customer_id: Option<NumberString>,
    #[serde(default, rename = "deviceID", alias = "deviceId")]
    device_id: Option<NumberString>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "type")]
    contract_type: Option<String>,
    #[serde(flatten)]
    extra: Extra,
}

impl WireOrderContract {
    pub(crate) fn into_domain(self) -> Result<OrderContract> {
        Ok(OrderContract {
            contract_id: required_text("contractId", self.contract_id)?,
            customer_id: wire::opt_text(self.customer_id),
            device_id: wire::opt_text(self.device_id),
            status: wire::non_empty(self.status),
            contract_type: wire::non_empty(self.contract_type),
            extra: self.extra,
        })
    }
}

/// Payload of `order.contract.get`.
#[derive(Debug, Deserialize)]
pub(crate) struct ContractPayload {
    #[serde(default)]
    pub(crate) contract: Option<WireOrderContract>,
}

fn required_text(field: &str, raw: Option<NumberString>) -> Result<String> {
    wire::opt_text(raw)
        .ok_or_else(|| rackcorp_core::Error::decode(field, "", "field is missing"))
}
