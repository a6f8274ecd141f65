//! RackCorp client and data models.
//!
//! Provides typed structures and an asynchronous client for the RackCorp API,
//! covering both the legacy `json.php` command endpoint and the REST endpoint.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{RackcorpClient, RackcorpClientBuilder};
pub use models::{
    ConfirmedOrder, CreatedOrder, Device, DeviceFilter, DevicePort, FirewallDirection,
    FirewallPolicy, FirewallPolicyStatus, Install, LoadBalancer, LoadBalancerFilter,
    LoadBalancerScope, Order, OrderContract, ProductDetails, Storage, Transaction,
    TransactionFilter, TransactionPage, TransactionStartupCloudInit, TransactionStartupData,
};
pub use rackcorp_core::client::{with_deadline, DebugLog};
pub use rackcorp_core::config::RackcorpConfig;
pub use rackcorp_core::credential::Credential;
pub use rackcorp_core::ids::{CustomerId, DataCenterId, DeviceId, LoadBalancerId, NetworkId};
pub use rackcorp_core::Error;

/// Convenient result alias that reuses the shared RackCorp error type.
pub type Result<T> = rackcorp_core::Result<T>;
