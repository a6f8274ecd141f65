//! RackCorp resource models.
//!
//! Each resource module pairs the public domain types with crate-private wire
//! structs that mirror the provider JSON, and the conversions between them.

pub mod device;
pub mod load_balancer;
pub mod order;
pub mod transaction;

pub use device::{
    Device, DeviceFilter, DevicePort, FirewallDirection, FirewallPolicy, FirewallPolicyStatus,
};
pub use load_balancer::{LoadBalancer, LoadBalancerFilter, LoadBalancerScope};
pub use order::{ConfirmedOrder, CreatedOrder, Install, Order, OrderContract, ProductDetails, Storage};
pub use transaction::{
    Transaction, TransactionFilter, TransactionPage, TransactionStartupCloudInit,
    TransactionStartupData,
};

/// Legacy endpoint command names, sent as the `cmd` body field.
pub(crate) mod command {
    pub const DEVICE_GET_ALL: &str = "device.getall";
    pub const LOAD_BALANCER_GET_ALL: &str = "loadbalancer.getall";
    pub const ORDER_CONFIRM: &str = "order.confirm";
    pub const ORDER_CONTRACT_GET: &str = "order.contract.get";
    pub const ORDER_CREATE: &str = "order.create";
    pub const TRANSACTION_GET: &str = "rctransaction.get";
    pub const TRANSACTION_GET_ALL: &str = "rctransaction.getall";
}
