use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ethers::types::H256;
use serde::Serialize;
use tracing::debug;

use crate::error::{ProtegoError, Result};
use crate::provider::{ProviderGateway, Receipt};

pub const APPROVE_GAS_LIMIT: u64 = 100_000;
pub const DEPOSIT_GAS_LIMIT: u64 = 200_000;
pub const WITHDRAW_GAS_LIMIT: u64 = 200_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Approve,
    Deposit,
    Withdraw,
}

impl OperationKind {
    pub fn gas_limit(self) -> u64 {
        match self {
            OperationKind::Approve => APPROVE_GAS_LIMIT,
            OperationKind::Deposit => DEPOSIT_GAS_LIMIT,
            OperationKind::Withdraw => WITHDRAW_GAS_LIMIT,
        }
    }

    fn index(self) -> usize {
        match self {
            OperationKind::Approve => 0,
            OperationKind::Deposit => 1,
            OperationKind::Withdraw => 2,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Approve => write!(f, "Approval"),
            OperationKind::Deposit => write!(f, "Deposit"),
            OperationKind::Withdraw => write!(f, "Withdrawal"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    #[default]
    Idle,
    Submitted,
    Confirmed,
    Failed,
}

/// The most recent operation of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    pub kind: OperationKind,
    /// Amount as entered, in token units.
    pub amount: String,
    pub status: OperationStatus,
    pub transaction_ref: Option<H256>,
}

impl PendingOperation {
    pub fn new(kind: OperationKind, amount: impl Into<String>) -> Self {
        Self {
            kind,
            amount: amount.into(),
            status: OperationStatus::Idle,
            transaction_ref: None,
        }
    }

    /// The user triggered the operation; the wallet call is under way.
    pub fn mark_submitted(&mut self) {
        self.status = OperationStatus::Submitted;
        self.transaction_ref = None;
    }

    pub fn record_transaction(&mut self, hash: H256) {
        self.transaction_ref = Some(hash);
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.status, OperationStatus::Confirmed | OperationStatus::Failed)
    }
}

/// One in-flight flag per operation kind.
#[derive(Debug, Default)]
pub struct OperationGuard {
    flags: [AtomicBool; 3],
}

impl OperationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `kind`; fails with `OperationInFlight` if already claimed.
    /// The claim is released when the returned ticket drops.
    pub fn try_acquire(&self, kind: OperationKind) -> Result<OperationTicket<'_>> {
        let flag = &self.flags[kind.index()];
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ProtegoError::OperationInFlight(kind));
        }
        Ok(OperationTicket { flag, kind })
    }

    pub fn is_busy(&self, kind: OperationKind) -> bool {
        self.flags[kind.index()].load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct OperationTicket<'a> {
    flag: &'a AtomicBool,
    kind: OperationKind,
}

impl OperationTicket<'_> {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

impl Drop for OperationTicket<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Poll for the receipt of `hash` until it appears. There is no timeout.
///
/// # Errors
///
/// `TransactionReverted` when the receipt reports failure; provider errors
/// while polling are returned as-is.
pub async fn wait_for_receipt(
    gateway: &ProviderGateway,
    hash: H256,
    poll_interval: Duration,
) -> Result<Receipt> {
    let mut polls = 0u64;
    loop {
        if let Some(receipt) = gateway.transaction_receipt(hash).await? {
            debug!(tx = ?hash, polls, block = ?receipt.block_number, "receipt observed");
            if !receipt.success {
                return Err(ProtegoError::TransactionReverted(hash));
            }
            return Ok(receipt);
        }
        polls += 1;
        tokio::time::sleep(poll_interval).await;
    }
}
