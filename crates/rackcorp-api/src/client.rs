//! Asynchronous RackCorp client implementation.

use crate::models::command;
use crate::models::device::{DeviceListPayload, FirewallUpdateRequest, WireDevice};
use crate::models::load_balancer::{LoadBalancerListPayload, WireLoadBalancer};
use crate::models::order::{
    ConfirmPayload, ContractGetParams, ContractPayload, CreatePayload, OrderConfirmParams,
    OrderCreateParams, WireOrder,
};
use crate::models::transaction::{
    TransactionCreateRequest, TransactionGetParams, TransactionListPayload, TransactionPayload,
    WireCreatedTransaction, OBJECT_TYPE_DEVICE, TYPE_STARTUP,
};
use crate::models::{
    ConfirmedOrder, CreatedOrder, Device, DeviceFilter, FirewallPolicy, LoadBalancer,
    LoadBalancerFilter, Order, OrderContract, ProductDetails, Transaction, TransactionFilter,
    TransactionPage, TransactionStartupData,
};
use crate::Result;
use rackcorp_core::client::{DebugLog, ServiceClient, ServiceClientBuilder, Transport};
use rackcorp_core::config::RackcorpConfig;
use rackcorp_core::credential::{Credential, CredentialChain};
use rackcorp_core::envelope::{LegacyEnvelope, RestEnvelope};
use rackcorp_core::ids::DeviceId;
use rackcorp_core::Error;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Builder for [`RackcorpClient`].
#[derive(Clone)]
pub struct RackcorpClientBuilder {
    inner: ServiceClientBuilder,
}

impl RackcorpClientBuilder {
    /// Create a builder for the given credential and the default endpoint.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self {
            inner: ServiceClientBuilder::new(credential),
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: RackcorpConfig) -> Self {
        self.inner = self.inner.with_config(config);
        self
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.inner = self.inner.with_base_url(base_url);
        self
    }

    /// Override the API version segment.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.inner = self.inner.with_api_version(api_version);
        self
    }

    /// Override the whole-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.inner = self.inner.with_user_agent(user_agent);
        self
    }

    /// Use a custom transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.inner = self.inner.with_transport(transport);
        self
    }

    /// Install a debug log sink receiving request and response bodies.
    #[must_use]
    pub fn with_debug_log<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner = self.inner.with_debug_log(Arc::new(sink));
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration.
    pub fn build(self) -> Result<RackcorpClient> {
        let inner = self.inner.build()?;
        Ok(RackcorpClient { inner })
    }
}

/// Asynchronous RackCorp client.
///
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Clone, Debug)]
pub struct RackcorpClient {
    inner: ServiceClient,
}

impl RackcorpClient {
    /// Construct a client for the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `uuid` or `secret` is empty.
    pub fn new(uuid: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        RackcorpClientBuilder::new(Credential::new(uuid, secret)?).build()
    }

    /// Construct a client from credentials found in the environment or the
    /// user's RackCorp config files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no credentials are found.
    pub fn from_env() -> Result<Self> {
        let credential = CredentialChain::standard().resolve()?;
        RackcorpClientBuilder::new(credential).build()
    }

    /// Start a builder.
    #[must_use]
    pub fn builder(credential: Credential) -> RackcorpClientBuilder {
        RackcorpClientBuilder::new(credential)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    /// Return the active configuration.
    #[must_use]
    pub fn config(&self) -> &RackcorpConfig {
        self.inner.config()
    }

    /// Install or clear the debug log sink.
    pub fn set_debug_log(&mut self, debug_log: Option<DebugLog>) {
        self.inner.set_debug_log(debug_log);
    }

    /// Fetch one device.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] for an unset id, or with the transport,
    /// decode or provider error of the call.
    pub async fn device_get(&self, device_id: impl Into<DeviceId>) -> Result<Device> {
        let device_id = device_id.into();
        let context = format!("device.get {device_id}");
        if device_id.is_unset() {
            return Err(required("deviceId").with_context(&context));
        }

        let envelope: RestEnvelope<WireDevice> = self
            .inner
            .rest::<(), _>(Method::GET, &["devices", &device_id.to_string()], None)
            .await
            .map_err(|err| err.with_context(&context))?;
        envelope
            .into_data(&context)?
            .into_domain()
            .map_err(|err| err.with_context(&context))
    }

    /// Replace, add or delete firewall policies of a device.
    ///
    /// A policy whose status is [`FirewallPolicyStatus::Deleted`] removes the
    /// existing policy with the same id.
    ///
    /// [`FirewallPolicyStatus::Deleted`]: crate::FirewallPolicyStatus::Deleted
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] for an unset id or an empty policy list.
    pub async fn device_update_firewall(
        &self,
        device_id: impl Into<DeviceId>,
        policies: &[FirewallPolicy],
    ) -> Result<()> {
        let device_id = device_id.into();
        let context = format!("device.firewall {device_id}");
        if device_id.is_unset() {
            return Err(required("deviceId").with_context(&context));
        }
        if policies.is_empty() {
            return Err(
                Error::Validation("must update with firewall policies".to_string())
                    .with_context(&context),
            );
        }

        let body = FirewallUpdateRequest {
            firewall_policies: policies,
        };
        let envelope: RestEnvelope<Value> = self
            .inner
            .rest(
                Method::PUT,
                &["devices", &device_id.to_string(), "firewall"],
                Some(&body),
            )
            .await
            .map_err(|err| err.with_context(&context))?;
        envelope.into_ack(&context)?;

        info!(%device_id, policies = policies.len(), "updated device firewall");
        Ok(())
    }

    /// List devices matching `filter`.
    ///
    /// A malformed id or address in any element fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns the transport, decode or provider error of the call.
    pub async fn device_get_all(&self, filter: &DeviceFilter) -> Result<Vec<Device>> {
        let context = command::DEVICE_GET_ALL;
        let envelope: LegacyEnvelope<DeviceListPayload> = self
            .inner
            .legacy(command::DEVICE_GET_ALL, filter)
            .await
            .map_err(|err| err.with_context(context))?;
        let devices = envelope
            .require(context, "devices", |payload| payload.devices)?
            .into_iter()
            .map(WireDevice::into_domain)
            .collect::<Result<Vec<_>>>()
            .map_err(|err| err.with_context(context))?;

        debug!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Confirm an order, turning it into contracts.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] for an empty order id.
    pub async fn order_confirm(&self, order_id: &str) -> Result<ConfirmedOrder> {
        let context = format!("{} {order_id}", command::ORDER_CONFIRM);
        ensure_present("orderId", order_id).map_err(|err| err.with_context(&context))?;

        let params = OrderConfirmParams { order_id };
        let envelope: LegacyEnvelope<ConfirmPayload> = self
            .inner
            .legacy(command::ORDER_CONFIRM, &params)
            .await
            .map_err(|err| err.with_context(&context))?;
        let confirmed = envelope.require(&context, "contractID", ConfirmPayload::into_domain)?;

        info!(order_id, contracts = confirmed.contract_ids.len(), "confirmed order");
        Ok(confirmed)
    }

    /// Create an order for a product.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] for an empty product code or customer id.
    pub async fn order_create(
        &self,
        product_code: &str,
        customer_id: &str,
        product_details: &ProductDetails,
    ) -> Result<CreatedOrder> {
        let context = format!("{} {product_code}", command::ORDER_CREATE);
        ensure_present("productCode", product_code)
            .and_then(|()| ensure_present("customerId", customer_id))
            .map_err(|err| err.with_context(&context))?;

        let params = OrderCreateParams {
            product_code,
            customer_id,
            product_details,
        };
        let envelope: LegacyEnvelope<CreatePayload> = self
            .inner
            .legacy(command::ORDER_CREATE, &params)
            .await
            .map_err(|err| err.with_context(&context))?;
        let created = envelope.require(&context, "orderId", CreatePayload::into_domain)?;

        info!(order_id = %created.order_id, customer_id, "created order");
        Ok(created)
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] for an empty order id.
    pub async fn order_get(&self, order_id: &str) -> Result<Order> {
        let context = format!("order.get {order_id}");
        ensure_present("orderId", order_id).map_err(|err| err.with_context(&context))?;

        let envelope: RestEnvelope<WireOrder> = self
            .inner
            .rest::<(), _>(Method::GET, &["order", order_id], None)
            .await
            .map_err(|err| err.with_context(&context))?;
        envelope
            .into_data(&context)?
            .into_domain()
            .map_err(|err| err.with_context(&context))
    }

    /// Fetch one order contract.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] for an empty contract id.
    pub async fn order_contract_get(&self, contract_id: &str) -> Result<OrderContract> {
        let context = format!("{} {contract_id}", command::ORDER_CONTRACT_GET);
        ensure_present("contractId", contract_id).map_err(|err| err.with_context(&context))?;

        let params = ContractGetParams { contract_id };
        let envelope: LegacyEnvelope<ContractPayload> = self
            .inner
            .legacy(command::ORDER_CONTRACT_GET, &params)
            .await
            .map_err(|err| err.with_context(&context))?;
        envelope
            .require(&context, "contract", |payload| payload.contract)?
            .into_domain()
            .map_err(|err| err.with_context(&context))
    }

    /// Create a transaction against an object.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] when any of the three strings is empty.
    pub async fn transaction_create(
        &self,
        transaction_type: &str,
        object_type: &str,
        object_id: &str,
        confirm: bool,
    ) -> Result<Transaction> {
        self.create_transaction(transaction_type, object_type, object_id, confirm, String::new())
            .await
    }

    /// Start a device, optionally deploying media and cloud-init data.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] for an empty device id.
    pub async fn transaction_device_startup(
        &self,
        device_id: &str,
        data: &TransactionStartupData,
    ) -> Result<Transaction> {
        let encoded = serde_json::to_string(data).map_err(|err| {
            Error::Transport(format!(
                "failed to JSON encode transaction startup data: {err}"
            ))
        })?;
        self.create_transaction(TYPE_STARTUP, OBJECT_TYPE_DEVICE, device_id, true, encoded)
            .await
    }

    async fn create_transaction(
        &self,
        transaction_type: &str,
        object_type: &str,
        object_id: &str,
        confirm: bool,
        data: String,
    ) -> Result<Transaction> {
        let context = format!("rctransaction.create {transaction_type} {object_type} {object_id}");
        ensure_present("transactionType", transaction_type)
            .and_then(|()| ensure_present("objectType", object_type))
            .and_then(|()| ensure_present("objectId", object_id))
            .map_err(|err| err.with_context(&context))?;

        let body = TransactionCreateRequest {
            object_type,
            object_id,
            transaction_type,
            confirm,
            data,
        };
        let envelope: RestEnvelope<WireCreatedTransaction> = self
            .inner
            .rest(Method::POST, &["rctransaction"], Some(&body))
            .await
            .map_err(|err| err.with_context(&context))?;
        let transaction = envelope
            .into_data(&context)?
            .into_domain()
            .map_err(|err| err.with_context(&context))?;

        info!(
            transaction_id = %transaction.transaction_id,
            transaction_type,
            object_id,
            "created transaction"
        );
        Ok(transaction)
    }

    /// Fetch one transaction.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] for an empty transaction id.
    pub async fn transaction_get(&self, transaction_id: &str) -> Result<Transaction> {
        let context = format!("{} {transaction_id}", command::TRANSACTION_GET);
        ensure_present("transactionId", transaction_id)
            .map_err(|err| err.with_context(&context))?;

        let params = TransactionGetParams { transaction_id };
        let envelope: LegacyEnvelope<TransactionPayload> = self
            .inner
            .legacy(command::TRANSACTION_GET, &params)
            .await
            .map_err(|err| err.with_context(&context))?;
        envelope
            .require(&context, "rcTransaction", |payload| payload.rc_transaction)?
            .into_domain()
            .map_err(|err| err.with_context(&context))
    }

    /// List transactions matching `filter`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] when `filter.object_type` is empty.
    pub async fn transaction_get_all(&self, filter: &TransactionFilter) -> Result<TransactionPage> {
        let context = command::TRANSACTION_GET_ALL;
        if filter.object_type.trim().is_empty() {
            return Err(Error::Validation(
                "field object_type of TransactionFilter is required".to_string(),
            )
            .with_context(context));
        }

        let envelope: LegacyEnvelope<TransactionListPayload> = self
            .inner
            .legacy(command::TRANSACTION_GET_ALL, filter)
            .await
            .map_err(|err| err.with_context(context))?;
        let page = envelope
            .require(context, "rcTransactions", TransactionListPayload::into_domain)?
            .map_err(|err| err.with_context(context))?;

        debug!(
            count = page.transactions.len(),
            matches = ?page.matches,
            "listed transactions"
        );
        Ok(page)
    }

    /// List load balancers matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns the transport, decode or provider error of the call.
    pub async fn load_balancer_get_all(
        &self,
        filter: &LoadBalancerFilter,
    ) -> Result<Vec<LoadBalancer>> {
        let context = command::LOAD_BALANCER_GET_ALL;
        let envelope: LegacyEnvelope<LoadBalancerListPayload> = self
            .inner
            .legacy(command::LOAD_BALANCER_GET_ALL, filter)
            .await
            .map_err(|err| err.with_context(context))?;
        let load_balancers = envelope
            .require(context, "loadbalancers", |payload| payload.loadbalancers)?
            .into_iter()
            .map(WireLoadBalancer::into_domain)
            .collect::<Result<Vec<_>>>()
            .map_err(|err| err.with_context(context))?;

        debug!(count = load_balancers.len(), "listed load balancers");
        Ok(load_balancers)
    }
}

fn required(name: &str) -> Error {
    Error::Validation(format!("{name} parameter is required"))
}

fn ensure_present(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(required(name))
    } else {
        Ok(())
    }
}
