use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::abi::{self, TokenCall, VaultCall};
use crate::actions::{DashboardAction, Strategy};
use crate::balance::{self, BalanceState, RefreshTag};
use crate::config::ProtegoConfig;
use crate::error::{ProtegoError, Result};
use crate::network::{self, ChainSwitch};
use crate::provider::events::{EventKind, ProviderEvent};
use crate::provider::subscriber::EventSubscription;
use crate::provider::{ProviderGateway, Receipt, TransactionRequest, WalletProvider};
use crate::session::{ConnectionStatus, Session};
use crate::token::{self, ContractDescriptor};
use crate::tx::{self, OperationGuard, OperationKind, OperationStatus, OperationTicket, PendingOperation};
use crate::utils::{format_base_units, short_address};

/// Event subscription owned by the current session.
struct Listener {
    /// Taken by `run_events` while it is running.
    subscription: Option<EventSubscription>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct ControllerState {
    session: Session,
    descriptor: Option<ContractDescriptor>,
    operations: HashMap<OperationKind, PendingOperation>,
    /// Bumped on every account change; see [`RefreshTag`].
    epoch: u64,
    listener: Option<Listener>,
}

impl ControllerState {
    fn refresh_tag(&self) -> Option<RefreshTag> {
        self.session.address.map(|address| RefreshTag {
            address,
            epoch: self.epoch,
        })
    }

    /// Drop the event listener. A running `run_events` loop stops.
    fn release_listener(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.cancel.cancel();
        }
    }

    /// Forget the account and everything derived from it.
    fn reset(&mut self, message: &str) {
        self.release_listener();
        self.session.clear(message);
        self.descriptor = None;
        self.epoch += 1;
    }
}

/// Clears the connecting flag on drop.
struct ConnectingFlag<'a>(&'a AtomicBool);

impl Drop for ConnectingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wallet session controller.
///
/// Sequences account access, network switching, token verification,
/// balance refreshes and vault transactions against a [`WalletProvider`].
/// All methods take `&self`; share it behind an `Arc` to drive events and
/// user actions from separate tasks. The state lock is never held across a
/// provider call.
pub struct WalletController {
    gateway: Option<ProviderGateway>,
    config: ProtegoConfig,
    state: Mutex<ControllerState>,
    connecting: AtomicBool,
    guard: OperationGuard,
    hook: Option<mpsc::Sender<DashboardAction>>,
}

impl std::fmt::Debug for WalletController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletController")
            .field("config", &self.config)
            .field("has_provider", &self.gateway.is_some())
            .finish_non_exhaustive()
    }
}

impl WalletController {
    /// Create a controller. `None` means no wallet is available, and every
    /// wallet operation fails with `ProviderUnavailable`.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, config: ProtegoConfig) -> Self {
        Self {
            gateway: provider.map(ProviderGateway::new),
            config,
            state: Mutex::new(ControllerState::default()),
            connecting: AtomicBool::new(false),
            guard: OperationGuard::new(),
            hook: None,
        }
    }

    /// Forward dashboard actions to `hook`.
    pub fn with_action_hook(mut self, hook: mpsc::Sender<DashboardAction>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn config(&self) -> &ProtegoConfig {
        &self.config
    }

    pub fn gateway(&self) -> Result<&ProviderGateway> {
        self.gateway.as_ref().ok_or(ProtegoError::ProviderUnavailable)
    }

    // --- snapshots ---

    pub async fn session(&self) -> Session {
        self.state.lock().await.session.clone()
    }

    pub async fn descriptor(&self) -> Option<ContractDescriptor> {
        self.state.lock().await.descriptor.clone()
    }

    pub async fn operation(&self, kind: OperationKind) -> Option<PendingOperation> {
        self.state.lock().await.operations.get(&kind).cloned()
    }

    /// Whether a new operation of `kind` would be accepted right now.
    pub async fn can_submit(&self, kind: OperationKind) -> bool {
        if self.guard.is_busy(kind) {
            return false;
        }
        let state = self.state.lock().await;
        state.session.is_connected() && state.descriptor.is_some()
    }

    async fn set_message(&self, message: impl Into<String>) {
        self.state.lock().await.session.set_message(message);
    }

    async fn fail_connection(&self, err: ProtegoError, message: Option<String>) -> ProtegoError {
        let message = message.unwrap_or_else(|| err.user_message());
        warn!(error = %err, "wallet connection failed");
        let mut state = self.state.lock().await;
        state.release_listener();
        state.session.failed(message);
        err
    }

    // --- connection ---

    /// Connect to the wallet and bring the session to `Connected`.
    ///
    /// Requests accounts, ensures the configured chain, subscribes to
    /// account and chain events, verifies the token contract and refreshes
    /// balances. A verification failure leaves the session connected but
    /// without a descriptor, so no amount-bearing operation is possible,
    /// and is returned as the error.
    pub async fn connect(&self) -> Result<Session> {
        let gateway = match self.gateway() {
            Ok(gateway) => gateway,
            Err(e) => return Err(self.fail_connection(e, None).await),
        };
        if self
            .connecting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let err = ProtegoError::ConnectionInProgress;
            self.set_message(err.user_message()).await;
            return Err(err);
        }
        let _flag = ConnectingFlag(&self.connecting);

        {
            let mut state = self.state.lock().await;
            state.release_listener();
            state.descriptor = None;
            state.epoch += 1;
            state.session.connecting();
        }
        info!("connecting to wallet");

        let address = match gateway.request_accounts().await {
            Ok(accounts) => accounts[0],
            Err(e) => return Err(self.fail_connection(e, None).await),
        };

        let chain = &self.config.chain;
        match gateway.chain_id().await {
            Ok(current) if current != chain.chain_id => {
                self.set_message(format!(
                    "Wrong network detected (Chain ID: {current}). Switching to {}...",
                    chain.name
                ))
                .await;
            }
            Ok(_) => {}
            Err(e) => return Err(self.fail_connection(e, None).await),
        }
        match network::ensure_chain(gateway, chain).await {
            Ok(ChainSwitch::AlreadyActive) => {}
            Ok(outcome) => info!(?outcome, chain_id = chain.chain_id, "network switched"),
            Err(e @ ProtegoError::ManualSwitchRequired { .. }) => {
                let message = format!(
                    "Please manually switch to {} (Chain ID: {})",
                    chain.name, chain.chain_id
                );
                return Err(self.fail_connection(e, Some(message)).await);
            }
            Err(e) => return Err(self.fail_connection(e, None).await),
        }
        // The network context may have changed; read it again.
        let chain_id = match gateway.chain_id().await {
            Ok(id) => id,
            Err(e) => return Err(self.fail_connection(e, None).await),
        };

        {
            let mut state = self.state.lock().await;
            state.listener = Some(Listener {
                subscription: Some(
                    gateway.subscribe(&[EventKind::AccountsChanged, EventKind::ChainChanged]),
                ),
                cancel: CancellationToken::new(),
            });
            state.session.connected(address, chain_id, &chain.name);
            state.session.set_message("Verifying contracts...");
        }
        info!(address = %format!("{address:#x}"), chain_id, "wallet connected");

        if let Err(e) = self.verify_token().await {
            self.set_message("Wallet connected but contract verification failed. Check contract addresses.")
                .await;
            return Err(e);
        }

        let symbol = self
            .descriptor()
            .await
            .map(|d| d.symbol)
            .unwrap_or_default();
        self.set_message(format!("Fetching {symbol} balance...")).await;
        let refreshed = match self.refresh_balance().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "initial balance refresh failed");
                false
            }
        };

        let mut state = self.state.lock().await;
        if refreshed && state.session.address == Some(address) {
            state
                .session
                .set_message(format!("Connected to {} | {}", chain.name, short_address(&address)));
        }
        Ok(state.session.clone())
    }

    /// Verify the configured token and store its descriptor.
    pub async fn verify_token(&self) -> Result<ContractDescriptor> {
        let gateway = match self.gateway() {
            Ok(gateway) => gateway,
            Err(e) => return Err(self.surface(e).await),
        };
        let epoch = {
            let mut state = self.state.lock().await;
            state.descriptor = None;
            state.epoch
        };
        let descriptor = match token::verify(gateway, self.config.token_address).await {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, token = %format!("{:#x}", self.config.token_address), "token verification failed");
                self.set_message(format!("Contract verification failed: {}", e.user_message()))
                    .await;
                return Err(e);
            }
        };
        let mut state = self.state.lock().await;
        if state.epoch == epoch && state.session.is_connected() {
            state.descriptor = Some(descriptor.clone());
        } else {
            debug!("session changed during verification, descriptor discarded");
        }
        Ok(descriptor)
    }

    /// Tear down the session: unsubscribe, clear state.
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        state.reset("Wallet disconnected");
        state.operations.clear();
        info!("wallet disconnected");
    }

    // --- events ---

    /// Apply one wallet event to the session.
    pub async fn handle_event(&self, event: ProviderEvent) -> Result<()> {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    let mut state = self.state.lock().await;
                    state.reset("Wallet disconnected");
                    info!("wallet removed all accounts");
                    Ok(())
                }
                Some(&address) => {
                    {
                        let mut state = self.state.lock().await;
                        if state.session.status != ConnectionStatus::Connected
                            || state.session.address == Some(address)
                        {
                            return Ok(());
                        }
                        state.epoch += 1;
                        state.session.address = Some(address);
                        state.session.balance = BalanceState::Unknown;
                        state.session.native_balance = BalanceState::Unknown;
                        state.session.set_message(format!(
                            "Connected to {} | {}",
                            self.config.chain.name,
                            short_address(&address)
                        ));
                    }
                    info!(address = %format!("{address:#x}"), "account changed");
                    self.refresh_balance().await.map(|_| ())
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                let required = self.config.chain.chain_id;
                let needs_verify = {
                    let mut state = self.state.lock().await;
                    if state.session.status != ConnectionStatus::Connected {
                        return Ok(());
                    }
                    if state.session.chain_id == Some(chain_id) {
                        return Ok(());
                    }
                    state.epoch += 1;
                    state.session.chain_id = Some(chain_id);
                    state.session.balance = BalanceState::Unknown;
                    state.session.native_balance = BalanceState::Unknown;
                    if chain_id != required {
                        state.descriptor = None;
                        state.session.set_message(
                            ProtegoError::WrongNetwork {
                                expected: required,
                                actual: chain_id,
                            }
                            .user_message(),
                        );
                        false
                    } else {
                        state.descriptor.is_none()
                    }
                };
                info!(chain_id, required, "chain changed");
                if needs_verify {
                    self.verify_token().await?;
                    self.refresh_balance().await?;
                }
                Ok(())
            }
        }
    }

    /// Process wallet events until `shutdown` fires or the session ends.
    ///
    /// Event handling errors are logged and do not stop the loop.
    pub async fn run_events(&self, shutdown: CancellationToken) -> Result<()> {
        let taken = {
            let mut state = self.state.lock().await;
            match state.listener.as_mut() {
                None => Err(ProtegoError::NotConnected),
                Some(listener) => match listener.subscription.take() {
                    Some(subscription) => Ok((subscription, listener.cancel.clone())),
                    None => Err(ProtegoError::Validation("event loop already running".into())),
                },
            }
        };
        let (mut subscription, cancel) = match taken {
            Ok(taken) => taken,
            Err(e) => return Err(self.surface(e).await),
        };
        info!(kinds = ?subscription.kinds(), "listening for wallet events");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("event loop shutting down");
                    break;
                }
                _ = cancel.cancelled() => {
                    debug!("session ended, event loop stopping");
                    break;
                }
                event = subscription.next() => match event {
                    Some(event) => {
                        debug!(?event, "wallet event");
                        match self.handle_event(event).await {
                            Ok(()) => {}
                            Err(e) if e.is_recoverable() => {
                                warn!(error = %e, "failed to handle wallet event");
                            }
                            Err(e) => {
                                error!(error = %e, "wallet event left the session unusable until reconfigured");
                            }
                        }
                    }
                    None => {
                        warn!("wallet provider closed its event stream");
                        break;
                    }
                },
            }
        }
        Ok(())
    }

    // --- balances ---

    /// Refresh token and native balances for the active account.
    ///
    /// Returns `Ok(None)` when the account changed while the request was in
    /// flight; the result is then discarded rather than applied.
    pub async fn refresh_balance(&self) -> Result<Option<String>> {
        match self.load_balances().await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.set_message(format!("Failed to fetch balance: {}", e.user_message()))
                    .await;
                Err(e)
            }
        }
    }

    async fn load_balances(&self) -> Result<Option<String>> {
        let gateway = self.gateway()?;
        let (tag, descriptor) = {
            let state = self.state.lock().await;
            if !state.session.is_connected() {
                return Err(ProtegoError::NotConnected);
            }
            let descriptor = state
                .descriptor
                .clone()
                .ok_or(ProtegoError::ContractNotVerified)?;
            let tag = state.refresh_tag().ok_or(ProtegoError::NotConnected)?;
            (tag, descriptor)
        };

        let token_result = balance::fetch_token_balance(gateway, tag.address, &descriptor).await;
        let native_result =
            balance::fetch_native_balance(gateway, tag.address, &self.config.chain.native_currency)
                .await;

        let mut state = self.state.lock().await;
        if state.refresh_tag() != Some(tag) {
            debug!(
                address = %format!("{:#x}", tag.address),
                epoch = tag.epoch,
                "discarding stale balance response"
            );
            return Ok(None);
        }
        state.session.native_balance = match native_result {
            Ok(v) => BalanceState::Value(v),
            Err(e) => {
                warn!(error = %e, "native balance refresh failed");
                BalanceState::Error
            }
        };
        match token_result {
            Ok(value) => {
                debug!(balance = %value, symbol = %descriptor.symbol, "balance refreshed");
                state.session.balance = BalanceState::Value(value.clone());
                Ok(Some(value))
            }
            Err(e) => {
                warn!(error = %e, "token balance refresh failed");
                state.session.balance = BalanceState::Error;
                Err(e)
            }
        }
    }

    // --- transactions ---

    /// Approve the vault to spend `amount` tokens.
    pub async fn approve(&self, amount: Decimal) -> Result<PendingOperation> {
        let result = self.submit_approve(amount).await;
        self.settle(OperationKind::Approve, result).await
    }

    /// Deposit `amount` tokens into the vault. The vault must already hold
    /// a sufficient allowance.
    pub async fn deposit(&self, amount: Decimal) -> Result<PendingOperation> {
        let result = self.submit_deposit(amount).await;
        self.settle(OperationKind::Deposit, result).await
    }

    /// Withdraw every vault share held by the active account.
    ///
    /// The recorded amount is the share count formatted with the vault's
    /// own decimals, not the token's.
    pub async fn emergency_withdraw(&self) -> Result<PendingOperation> {
        self.emit(DashboardAction::EmergencyWithdrawal).await;
        let result = self.submit_withdraw().await;
        self.settle(OperationKind::Withdraw, result).await
    }

    async fn submit_approve(&self, amount: Decimal) -> Result<PendingOperation> {
        let kind = OperationKind::Approve;
        let (owner, descriptor) = self.ready_for(amount).await?;
        let ticket = self.guard.try_acquire(kind)?;
        let gateway = self.gateway()?;
        let base = descriptor.parse_amount(amount)?;

        match token::allowance(gateway, descriptor.address, owner, self.config.vault_address).await {
            Ok(current) if current >= base => {
                info!(allowance = %descriptor.format_amount(current)?, "existing allowance already covers amount")
            }
            Ok(current) => debug!(allowance = %current, "current allowance"),
            Err(e) => debug!(error = %e, "allowance check failed"),
        }

        self.set_message("Preparing approval transaction...").await;
        let tx = TransactionRequest {
            from: owner,
            to: descriptor.address,
            data: TokenCall::Approve {
                spender: self.config.vault_address,
                amount: base,
            }
            .encode(),
            gas: kind.gas_limit(),
        };
        self.execute(ticket, amount.to_string(), &descriptor.symbol, tx).await
    }

    async fn submit_deposit(&self, amount: Decimal) -> Result<PendingOperation> {
        let kind = OperationKind::Deposit;
        let (owner, descriptor) = self.ready_for(amount).await?;
        let ticket = self.guard.try_acquire(kind)?;
        let base = descriptor.parse_amount(amount)?;

        self.set_message("Depositing into Protego Yield Vault...").await;
        let tx = TransactionRequest {
            from: owner,
            to: self.config.vault_address,
            data: VaultCall::Deposit {
                assets: base,
                receiver: owner,
            }
            .encode(),
            gas: kind.gas_limit(),
        };
        self.execute(ticket, amount.to_string(), &descriptor.symbol, tx).await
    }

    async fn submit_withdraw(&self) -> Result<PendingOperation> {
        let kind = OperationKind::Withdraw;
        let (owner, _) = self.ready().await?;
        let ticket = self.guard.try_acquire(kind)?;
        let gateway = self.gateway()?;
        let vault = self.config.vault_address;

        let shares = vault_shares(gateway, vault, owner).await?;
        if shares.is_zero() {
            return Err(ProtegoError::Validation("no vault shares to withdraw".into()));
        }
        let decimals = vault_decimals(gateway, vault).await?;
        let amount = format_base_units(shares, decimals)?;
        warn!(shares = %amount, decimals, "emergency withdrawal requested");

        self.set_message("Withdrawing from Protego Yield Vault...").await;
        let tx = TransactionRequest {
            from: owner,
            to: vault,
            data: VaultCall::Withdraw {
                shares,
                receiver: owner,
                owner,
            }
            .encode(),
            gas: kind.gas_limit(),
        };
        self.execute(ticket, amount, "shares", tx).await
    }

    /// Record the failure of an operation in the status line.
    async fn settle(
        &self,
        kind: OperationKind,
        result: Result<PendingOperation>,
    ) -> Result<PendingOperation> {
        if let Err(e) = &result {
            self.set_message(failure_message(kind, e)).await;
        }
        result
    }

    /// Put `err` in the status line and hand it back.
    async fn surface(&self, err: ProtegoError) -> ProtegoError {
        self.set_message(err.user_message()).await;
        err
    }

    /// Check the session can carry an amount-bearing operation. Issues no
    /// provider call.
    async fn ready(&self) -> Result<(Address, ContractDescriptor)> {
        let state = self.state.lock().await;
        if self.gateway.is_none() {
            Err(ProtegoError::ProviderUnavailable)
        } else if !state.session.is_connected() {
            Err(ProtegoError::NotConnected)
        } else if let (Some(address), Some(descriptor)) =
            (state.session.address, state.descriptor.clone())
        {
            Ok((address, descriptor))
        } else {
            Err(ProtegoError::ContractNotVerified)
        }
    }

    async fn ready_for(&self, amount: Decimal) -> Result<(Address, ContractDescriptor)> {
        if amount <= Decimal::ZERO {
            return Err(ProtegoError::Validation(format!(
                "amount must be positive, got {amount}"
            )));
        }
        self.ready().await
    }

    /// Submit `tx`, wait for its receipt and record the outcome. `unit`
    /// labels `amount` in the success message.
    async fn execute(
        &self,
        ticket: OperationTicket<'_>,
        amount: String,
        unit: &str,
        tx: TransactionRequest,
    ) -> Result<PendingOperation> {
        let kind = ticket.kind();
        let gateway = self.gateway()?;
        self.update_operation(kind, |op| {
            *op = PendingOperation::new(kind, amount.clone());
            op.mark_submitted();
        })
        .await;
        info!(%kind, %amount, to = %format!("{:#x}", tx.to), gas = tx.gas, "submitting transaction");

        let outcome: Result<Receipt> = async {
            let hash = gateway.send_transaction(&tx).await?;
            self.update_operation(kind, |op| op.record_transaction(hash)).await;
            self.set_message(format!("{kind} transaction sent: {hash:#x}")).await;
            info!(%kind, tx = ?hash, "transaction sent");
            tx::wait_for_receipt(gateway, hash, self.config.receipt_poll_interval).await
        }
        .await;

        match outcome {
            Ok(receipt) => {
                let op = self
                    .update_operation(kind, |op| op.status = OperationStatus::Confirmed)
                    .await;
                info!(%kind, tx = ?receipt.transaction_hash, block = ?receipt.block_number, "transaction confirmed");
                self.set_message(success_message(kind, &amount, unit)).await;
                drop(ticket);
                if let Err(e) = self.refresh_balance().await {
                    warn!(error = %e, "balance refresh after {kind} failed");
                }
                Ok(op)
            }
            Err(e) => {
                self.update_operation(kind, |op| op.status = OperationStatus::Failed)
                    .await;
                warn!(%kind, error = %e, "transaction failed");
                Err(e)
            }
        }
    }

    async fn update_operation(
        &self,
        kind: OperationKind,
        f: impl FnOnce(&mut PendingOperation),
    ) -> PendingOperation {
        let mut state = self.state.lock().await;
        let op = state
            .operations
            .entry(kind)
            .or_insert_with(|| PendingOperation::new(kind, String::new()));
        f(op);
        op.clone()
    }

    // --- dashboard hooks ---

    /// Ask the embedding application to analyze the portfolio.
    pub async fn analyze_portfolio(&self) -> bool {
        self.request_strategy(Strategy::PortfolioAnalysis).await
    }

    /// Ask the embedding application to apply `strategy`.
    pub async fn request_strategy(&self, strategy: Strategy) -> bool {
        self.set_message(format!("Requested strategy: {strategy}")).await;
        self.emit(DashboardAction::Optimize(strategy)).await
    }

    async fn emit(&self, action: DashboardAction) -> bool {
        let Some(hook) = &self.hook else {
            debug!(?action, "no action hook installed");
            return false;
        };
        match hook.send(action).await {
            Ok(()) => true,
            Err(e) => {
                warn!(action = ?e.0, "action hook closed");
                false
            }
        }
    }
}

fn success_message(kind: OperationKind, amount: &str, unit: &str) -> String {
    match kind {
        OperationKind::Approve => format!("Approval successful for {amount} {unit}!"),
        OperationKind::Deposit => format!("Deposit of {amount} {unit} successful!"),
        OperationKind::Withdraw => format!("Emergency withdrawal of {amount} {unit} successful!"),
    }
}

/// Status line for an operation that did not complete. Refusals that
/// happen before anything is attempted keep their own wording.
fn failure_message(kind: OperationKind, err: &ProtegoError) -> String {
    match err {
        ProtegoError::ProviderUnavailable
        | ProtegoError::NotConnected
        | ProtegoError::ContractNotVerified
        | ProtegoError::OperationInFlight(_) => err.user_message(),
        _ => format!("{kind} failed: {}", err.user_message()),
    }
}

/// Decimals of the vault share token.
pub async fn vault_decimals(gateway: &ProviderGateway, vault: Address) -> Result<u8> {
    let data = gateway.call(vault, VaultCall::Decimals.encode()).await?;
    abi::decode_u8(&data)
}

/// Vault share balance for `owner`, in base units.
pub async fn vault_shares(gateway: &ProviderGateway, vault: Address, owner: Address) -> Result<U256> {
    let data = gateway.call(vault, VaultCall::BalanceOf(owner).encode()).await?;
    abi::decode_uint(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_messages() {
        assert_eq!(
            success_message(OperationKind::Approve, "10", "USDC"),
            "Approval successful for 10 USDC!"
        );
        assert_eq!(
            success_message(OperationKind::Deposit, "2.5", "USDC"),
            "Deposit of 2.5 USDC successful!"
        );
    }

    #[test]
    fn test_state_reset_bumps_epoch_and_cancels_listener() {
        let mut state = ControllerState::default();
        let cancel = CancellationToken::new();
        state.listener = Some(Listener {
            subscription: None,
            cancel: cancel.clone(),
        });
        state.session.connected(Address::repeat_byte(1), 1328, "Sei Testnet");
        let before = state.epoch;
        state.reset("Wallet disconnected");
        assert!(cancel.is_cancelled());
        assert!(state.listener.is_none());
        assert_eq!(state.epoch, before + 1);
        assert_eq!(state.refresh_tag(), None);
    }
}
