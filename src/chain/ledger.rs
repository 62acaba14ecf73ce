//! The ledger seam used by the workflow and resolver.
//!
//! `CredentialLedger` is the single surface through which off-chain code
//! touches the chain. The live implementation composes the pipeline
//! (network guard → signing session → binding → gateway → event
//! extraction); tests substitute scripted mocks.

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;

use crate::chain::client::ChainClient;
use crate::chain::events::{self, IssuedEvent, RevokedEvent};
use crate::chain::gateway::TxGateway;
use crate::chain::guard::NetworkGuard;
use crate::chain::signer::SigningSession;
use crate::chain::types::{ChainConfig, ChainError, ChainResult, TxOptions};
use crate::contracts::ContractRegistry;
use crate::credentials::model::OnChainLinkage;

/// Arguments for an on-chain issuance.
#[derive(Debug, Clone)]
pub struct IssueArgs {
    pub student: Address,
    pub credential_type: String,
    pub credential_data: String,
    /// Unix timestamp; zero means no expiry.
    pub expires_at: u64,
}

/// A confirmed issuance: the validated event plus its linkage record.
#[derive(Debug, Clone)]
pub struct IssueOutcome {
    pub event: IssuedEvent,
    pub linkage: OnChainLinkage,
}

/// A confirmed revocation.
#[derive(Debug, Clone)]
pub struct RevokeOutcome {
    pub event: RevokedEvent,
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Result of probing a previously recorded issuance hash.
#[derive(Debug, Clone)]
pub enum TxProbe {
    /// No receipt yet; the transaction may still be pending.
    NotIncluded,
    /// Mined but reverted; no on-chain effect occurred.
    Reverted,
    /// Mined successfully and the issuance event was found.
    Issued(IssueOutcome),
    /// Mined successfully but the issuance event is missing.
    MissingEvent,
}

/// Chain operations needed by the credential workflow and the public
/// verification resolver.
#[async_trait]
pub trait CredentialLedger: Send + Sync {
    /// Issue a credential on-chain and wait for the confirming event.
    async fn issue(&self, args: IssueArgs) -> ChainResult<IssueOutcome>;

    /// Revoke an issued credential on-chain.
    async fn revoke(&self, credential_id: u64) -> ChainResult<RevokeOutcome>;

    /// Read the ledger's validity flag for a credential. Read-only; no
    /// signing, no network guard.
    async fn credential_valid(&self, credential_id: u64) -> ChainResult<bool>;

    /// Probe a recorded transaction hash during reconciliation.
    async fn probe_issue_tx(&self, tx_hash: TxHash) -> ChainResult<TxProbe>;
}

/// Live implementation backed by the configured RPC endpoints.
pub struct ChainCredentialLedger {
    client: ChainClient,
    guard: NetworkGuard,
    session: SigningSession,
    gateway: TxGateway,
    registry: ContractRegistry,
    tx_options: TxOptions,
}

impl ChainCredentialLedger {
    pub fn new(config: &ChainConfig, registry: ContractRegistry) -> ChainResult<Self> {
        let client = ChainClient::new(config.clone())?;
        Ok(Self {
            guard: NetworkGuard::new(config.expected_chain_id),
            session: SigningSession::new(config),
            gateway: TxGateway::new(client.clone()),
            tx_options: TxOptions::from(config),
            registry,
            client,
        })
    }

    pub fn client(&self) -> &ChainClient {
        &self.client
    }

    async fn linkage_chain_id(&self) -> ChainResult<u64> {
        match self.guard.expected_chain_id() {
            Some(id) => Ok(id),
            None => Ok(self.client.get_chain_id().await?.0),
        }
    }
}

#[async_trait]
impl CredentialLedger for ChainCredentialLedger {
    async fn issue(&self, args: IssueArgs) -> ChainResult<IssueOutcome> {
        let contract = *self.registry.credentials()?;

        self.guard.ensure(&self.client).await?;
        let signer = self.session.acquire()?;
        let call = contract.issue_credential(
            args.student,
            &args.credential_type,
            &args.credential_data,
            args.expires_at,
        )?;
        let receipt = self
            .gateway
            .submit_and_wait(&signer, &call, self.tx_options)
            .await?;
        let event = events::extract_issued(&receipt)?;

        let linkage = OnChainLinkage {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            chain_id: self.linkage_chain_id().await?,
            contract_address: contract.address(),
            emitted_credential_id: event.credential_id,
        };

        tracing::info!(
            credential_id = event.credential_id,
            student = %event.student,
            tx_hash = %linkage.transaction_hash,
            "Credential issued on-chain"
        );

        Ok(IssueOutcome { event, linkage })
    }

    async fn revoke(&self, credential_id: u64) -> ChainResult<RevokeOutcome> {
        let contract = *self.registry.credentials()?;

        self.guard.ensure(&self.client).await?;
        let signer = self.session.acquire()?;
        let call = contract.revoke_credential(credential_id)?;
        let receipt = self
            .gateway
            .submit_and_wait(&signer, &call, self.tx_options)
            .await?;
        let event = events::extract_revoked(&receipt)?;

        if event.credential_id != credential_id {
            // A revocation event for a different credential means the
            // receipt does not confirm this operation.
            return Err(ChainError::EventNotFound {
                tx_hash: receipt.transaction_hash,
                event: "CredentialRevoked",
            });
        }

        tracing::info!(
            credential_id = credential_id,
            tx_hash = %receipt.transaction_hash,
            "Credential revoked on-chain"
        );

        Ok(RevokeOutcome {
            event,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    async fn credential_valid(&self, credential_id: u64) -> ChainResult<bool> {
        use alloy::network::TransactionBuilder;
        use alloy::sol_types::SolCall;

        let contract = self.registry.credentials()?;
        let call = contract.is_credential_valid(credential_id)?;

        let tx = alloy::rpc::types::TransactionRequest::default()
            .with_to(call.to)
            .with_input(call.calldata.clone());
        let data = self.client.call(tx).await?;

        crate::contracts::abi::isCredentialValidCall::abi_decode_returns(&data)
            .map_err(|e| ChainError::Rpc(format!("undecodable isCredentialValid return: {}", e)))
    }

    async fn probe_issue_tx(&self, tx_hash: TxHash) -> ChainResult<TxProbe> {
        let Some(receipt) = self.client.get_transaction_receipt(tx_hash).await? else {
            return Ok(TxProbe::NotIncluded);
        };

        if !receipt.status() {
            return Ok(TxProbe::Reverted);
        }

        match events::extract_issued(&receipt) {
            Ok(event) => {
                let contract = *self.registry.credentials()?;
                let linkage = OnChainLinkage {
                    transaction_hash: receipt.transaction_hash,
                    block_number: receipt.block_number,
                    chain_id: self.linkage_chain_id().await?,
                    contract_address: contract.address(),
                    emitted_credential_id: event.credential_id,
                };
                Ok(TxProbe::Issued(IssueOutcome { event, linkage }))
            }
            Err(ChainError::EventNotFound { .. }) => Ok(TxProbe::MissingEvent),
            Err(e) => Err(e),
        }
    }
}
