//! Transaction models.
//!
//! A transaction is a provider-side asynchronous action (startup, shutdown,
//! VNC access …) against an object. Creation goes through REST, lookups go
//! through the legacy endpoint, and the two describe the same record with
//! different field names (`type` vs `method`).

use rackcorp_core::wire::{self, Extra, NumberString};
use rackcorp_core::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Object type of device transactions.
pub const OBJECT_TYPE_DEVICE: &str = "DEVICE";

/// Transaction has started.
pub const STATUS_COMMENCED: &str = "COMMENCED";
/// Transaction has finished.
pub const STATUS_COMPLETED: &str = "COMPLETED";
/// Transaction is queued.
pub const STATUS_PENDING: &str = "PENDING";

/// Cancel a pending transaction.
pub const TYPE_CANCEL: &str = "CANCEL";
/// Close console access.
pub const TYPE_CLOSE_VNC: &str = "CLOSEVNC";
/// Power off without a guest shutdown.
pub const TYPE_FORCE_SHUTDOWN: &str = "FORCESHUTDOWN";
/// Open console access; `data` names the public IP allowed to connect.
pub const TYPE_OPEN_VNC: &str = "OPENVNC";
/// Push configuration changes to the device.
pub const TYPE_REFRESH_CONFIG: &str = "REFRESHCONFIG";
/// Guest shutdown, falling back to power off.
pub const TYPE_SAFE_SHUTDOWN: &str = "SAFESHUTDOWN";
/// Guest shutdown.
pub const TYPE_SHUTDOWN: &str = "SHUTDOWN";
/// Power on, optionally with deploy media and cloud-init data.
pub const TYPE_STARTUP: &str = "STARTUP";

/// A transaction record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Transaction id
    pub transaction_id: String,
    /// Object type, e.g. `DEVICE`
    pub object_type: String,
    /// Object id
    pub object_id: String,
    /// Transaction type, e.g. `STARTUP`
    pub transaction_type: String,
    /// Opaque type specific data
    pub data: String,
    /// Whether the provider wants a confirmation before running it
    pub confirmation_required: bool,
    /// Confirmation prompt
    pub confirmation_text: Option<String>,
    /// Progress status (lookups only)
    pub status: Option<String>,
    /// Progress detail (lookups only)
    pub status_info: Option<String>,
    /// Fields without a typed counterpart
    pub extra: Extra,
}

/// One page of `rctransaction.getall`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionPage {
    /// Transactions on this page
    pub transactions: Vec<Transaction>,
    /// Total number of matches across all pages, when the provider reports it
    pub matches: Option<i64>,
}

/// cloud-init documents passed to a `STARTUP` transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStartupCloudInit {
    /// meta-data document
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub meta_data: String,
    /// network-config document
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_config: String,
    /// user-data document
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_data: String,
}

/// Data of a `STARTUP` transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStartupData {
    /// Object storage access key for the deploy image
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deploy_media_image_access_key: String,
    /// Object storage secret for the deploy image
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deploy_media_image_access_secret: String,
    /// Bucket holding the deploy image
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deploy_media_image_bucket: String,
    /// Deploy image id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deploy_media_image_id: String,
    /// Path of the deploy image inside the bucket
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deploy_media_image_path: String,
    /// cloud-init documents
    #[serde(default)]
    pub cloud_init: TransactionStartupCloudInit,
}

/// Filter for `rctransaction.getall`. `object_type` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionFilter {
    /// Object type, e.g. `DEVICE`
    #[serde(rename = "objType")]
    pub object_type: String,
    /// Restrict to these object ids
    #[serde(rename = "objId", skip_serializing_if = "Vec::is_empty")]
    pub object_ids: Vec<String>,
    /// Restrict to these transaction types
    #[serde(rename = "method", skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    /// Restrict to these statuses
    #[serde(rename = "status", skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<String>,
    /// Restrict to these customers
    #[serde(rename = "customerId", skip_serializing_if = "Vec::is_empty")]
    pub customer_ids: Vec<String>,
    /// Offset of the first result
    #[serde(rename = "resStart", skip_serializing_if = "Option::is_none")]
    pub result_start: Option<u32>,
    /// Maximum number of results
    #[serde(rename = "resWindow", skip_serializing_if = "Option::is_none")]
    pub result_window: Option<u32>,
}

impl TransactionFilter {
    /// Filter over one object type.
    #[must_use]
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            ..Self::default()
        }
    }

    /// Restrict to one object.
    #[must_use]
    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_ids.push(object_id.into());
        self
    }

    /// Restrict to one transaction type.
    #[must_use]
    pub fn with_type(mut self, transaction_type: impl Into<String>) -> Self {
        self.types.push(transaction_type.into());
        self
    }

    /// Restrict to one status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.statuses.push(status.into());
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

/// Body of `POST rctransaction`.
#[derive(Debug, Serialize)]
pub(crate) struct TransactionCreateRequest<'a> {
    #[serde(rename = "objType")]
    pub(crate) object_type: &'a str,
    #[serde(rename = "objId")]
    pub(crate) object_id: &'a str,
    #[serde(rename = "type")]
    pub(crate) transaction_type: &'a str,
    #[serde(rename = "confirmation")]
    pub(crate) confirm: bool,
    pub(crate) data: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TransactionGetParams<'a> {
    #[serde(rename = "rcTransactionId")]
    pub(crate) transaction_id: &'a str,
}

/// Transaction as returned by `POST rctransaction`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCreatedTransaction {
    #[serde(default)]
    rc_transaction_id: Option<NumberString>,
    #[serde(default, deserialize_with = "wire::flexible_bool")]
    confirmation_required: bool,
    #[serde(default)]
    confirmation_text: Option<String>,
    #[serde(default, rename = "objType")]
    object_type: Option<String>,
    #[serde(default, rename = "objId")]
    object_id: Option<NumberString>,
    #[serde(default, rename = "type")]
    transaction_type: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(flatten)]
    extra: Extra,
}

impl WireCreatedTransaction {
    pub(crate) fn into_domain(self) -> Result<Transaction> {
        Ok(Transaction {
            transaction_id: required_id(self.rc_transaction_id)?,
            object_type: self.object_type.unwrap_or_default(),
            object_id: wire::opt_text(self.object_id).unwrap_or_default(),
            transaction_type: self.transaction_type.unwrap_or_default(),
            data: data_text(self.data),
            confirmation_required: self.confirmation_required,
            confirmation_text: wire::non_empty(self.confirmation_text),
            status: None,
            status_info: None,
            extra: self.extra,
        })
    }
}

/// Transaction as returned by the legacy lookups.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireExistingTransaction {
    #[serde(default)]
    rc_transaction_id: Option<NumberString>,
    #[serde(default, rename = "objType")]
    object_type: Option<String>,
    #[serde(default, rename = "objId")]
    object_id: Option<NumberString>,
    #[serde(default, rename = "method", alias = "type")]
    transaction_type: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    status_info: Option<String>,
    #[serde(flatten)]
    extra: Extra,
}

impl WireExistingTransaction {
    pub(crate) fn into_domain(self) -> Result<Transaction> {
        Ok(Transaction {
            transaction_id: required_id(self.rc_transaction_id)?,
            object_type: self.object_type.unwrap_or_default(),
            object_id: wire::opt_text(self.object_id).unwrap_or_default(),
            transaction_type: self.transaction_type.unwrap_or_default(),
            data: data_text(self.data),
            confirmation_required: false,
            confirmation_text: None,
            status: wire::non_empty(self.status),
            status_info: wire::non_empty(self.status_info),
            extra: self.extra,
        })
    }
}

/// Payload of `rctransaction.get`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionPayload {
    #[serde(default)]
    pub(crate) rc_transaction: Option<WireExistingTransaction>,
}

/// Payload of `rctransaction.getall`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionListPayload {
    #[serde(default)]
    rc_transactions: Option<Vec<WireExistingTransaction>>,
    #[serde(default)]
    matches: Option<NumberString>,
}

impl TransactionListPayload {
    /// `None` when the list itself is missing.
    pub(crate) fn into_domain(self) -> Option<Result<TransactionPage>> {
        let transactions = self.rc_transactions?;
        Some(build_page(transactions, self.matches.as_ref()))
    }
}

fn build_page(
    wire_transactions: Vec<WireExistingTransaction>,
    matches: Option<&NumberString>,
) -> Result<TransactionPage> {
    let transactions = wire_transactions
        .into_iter()
        .map(WireExistingTransaction::into_domain)
        .collect::<Result<Vec<_>>>()?;
    Ok(TransactionPage {
        transactions,
        matches: wire::opt_i64("matches", matches)?,
    })
}

fn required_id(raw: Option<NumberString>) -> Result<String> {
    wire::opt_text(raw)
        .ok_or_else(|| rackcorp_core::Error::decode("rcTransactionId", "", "field is missing"))
}

fn data_text(raw: Option<Value>) -> String {
    match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    }
}
