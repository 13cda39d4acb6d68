//! The disposable chain instance.
//!
//! One [`Blockchain`] wraps one [`ChainStore`] for the lifetime of a
//! sandbox session. It commits the genesis block on startup, provisions
//! accounts, deploys contracts, and turns engine output into block
//! commits. Every state change lands as exactly one block.

use crate::engine::{EmittedEvent, ExecutionEngine, ExecutionOutput, KeyValueEngine, ScriptResult};
use crate::{Error, Result};
use sandbox_config::ChainConfig;
use sandbox_core::{
    Address, Block, Collection, Delta, Event, Identifier, RegisterKey, TransactionBody,
    TransactionResult, TransactionStatus,
};
use parking_lot::Mutex;
use sandbox_store::{ChainStore, StoreSnapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Event emitted once when the chain starts.
pub const CHAIN_STARTED_EVENT: &str = "sandbox.ChainStarted";
/// Event emitted for every provisioned account.
pub const ACCOUNT_CREATED_EVENT: &str = "sandbox.AccountCreated";
/// Event emitted for every deployed contract.
pub const CONTRACT_DEPLOYED_EVENT: &str = "sandbox.ContractDeployed";

/// A contract to deploy into the sandbox chain.
#[derive(Clone, Debug)]
pub struct ContractDescriptor {
    /// The contract name, used as its register address.
    pub name: String,
    /// The contract source.
    pub source: Vec<u8>,
    /// Where the source came from within the project tree.
    pub location: String,
}

/// An in-process, single-node chain.
pub struct Blockchain {
    store: Arc<ChainStore>,
    engine: Arc<dyn ExecutionEngine>,
    service_account: Address,
    // Next index of the flat address space; 1 is the service account.
    next_account_index: AtomicU64,
    // Serializes parent read + commit so concurrent transactions land
    // at consecutive heights instead of racing on the same parent.
    commit_lock: Mutex<()>,
}

impl Blockchain {
    /// Creates a chain with the built-in engine and commits its
    /// genesis block.
    pub fn new(config: ChainConfig) -> Result<Self> {
        Self::with_engine(config, Arc::new(KeyValueEngine::new()))
    }

    /// Creates a chain driven by a caller-supplied engine.
    pub fn with_engine(config: ChainConfig, engine: Arc<dyn ExecutionEngine>) -> Result<Self> {
        let chain = Self {
            store: Arc::new(ChainStore::new()),
            engine,
            service_account: Address::SERVICE,
            next_account_index: AtomicU64::new(2),
            commit_lock: Mutex::new(()),
        };

        // Genesis: provision the service account and record the chain
        // start, all in the block at height 0.
        let mut delta = Delta::new();
        delta.set(
            RegisterKey::account_status(chain.service_account),
            b"exists".to_vec(),
        );
        let mut events = vec![
            (CHAIN_STARTED_EVENT, config.chain_id.clone().into_bytes()),
            (
                ACCOUNT_CREATED_EVENT,
                chain.service_account.to_string().into_bytes(),
            ),
        ];
        for _ in 0..config.initial_accounts {
            let address = Address::at_index(chain.next_account_index.fetch_add(1, Ordering::SeqCst));
            delta.set(RegisterKey::account_status(address), b"exists".to_vec());
            events.push((ACCOUNT_CREATED_EVENT, address.to_string().into_bytes()));
        }

        let events = events
            .into_iter()
            .enumerate()
            .map(|(index, (event_type, payload))| {
                Event::new(event_type, payload, 0, index as u32)
            })
            .collect();
        let block = Block::new(0, Identifier::ZERO, timestamp_ms(), vec![]);
        chain
            .store
            .commit_block(block, vec![], vec![], vec![], delta, events)?;

        info!(target: "sandbox::chain", chain_id = %config.chain_id, "chain started");
        Ok(chain)
    }

    /// The service account of this chain.
    pub fn service_account(&self) -> Address {
        self.service_account
    }

    /// The embedded store, for read-side collaborators.
    pub fn store(&self) -> &Arc<ChainStore> {
        &self.store
    }

    /// Exports the store's indexed state for inspection.
    pub fn export_state(&self) -> StoreSnapshot {
        self.store.export()
    }

    /// Runs a read-only script against the latest committed state.
    ///
    /// Never commits; an aborted or failed script leaves the chain
    /// untouched.
    pub async fn execute_script(
        &self,
        script: &str,
        arguments: &[String],
    ) -> Result<ScriptResult> {
        let view = self.store.ledger_view(self.store.latest_height()?);
        self.engine.execute_script(&view, script, arguments).await
    }

    /// Executes a transaction and commits it as the next block.
    ///
    /// A transaction the engine marks as failed still commits, carrying
    /// the failure message and no writes.
    pub async fn execute_transaction(
        &self,
        transaction: TransactionBody,
    ) -> Result<TransactionResult> {
        let view = self.store.ledger_view(self.store.latest_height()?);
        let output = self.engine.execute_transaction(&view, &transaction).await?;
        self.commit_executed(transaction, output)
    }

    /// Deploys contracts into the service account, one block each.
    pub async fn deploy(&self, descriptors: Vec<ContractDescriptor>) -> Result<()> {
        let count = descriptors.len();
        for descriptor in descriptors {
            let source = String::from_utf8_lossy(&descriptor.source).into_owned();
            let transaction = TransactionBody::new(
                source,
                vec![],
                vec![self.service_account],
                descriptor.location.clone(),
            );

            let mut delta = Delta::new();
            delta.set(
                RegisterKey::contract(self.service_account, &descriptor.name),
                descriptor.source,
            );
            let output = ExecutionOutput::succeeded(
                delta,
                vec![EmittedEvent {
                    event_type: CONTRACT_DEPLOYED_EVENT.to_string(),
                    payload: descriptor.name.clone().into_bytes(),
                }],
            );

            let result = self.commit_executed(transaction, output)?;
            if !result.is_succeeded() {
                return Err(Error::Engine(format!(
                    "deployment of {} failed: {}",
                    descriptor.name,
                    result.error_message.unwrap_or_default()
                )));
            }
            info!(target: "sandbox::chain", contract = %descriptor.name, "deployed contract");
        }
        info!(target: "sandbox::chain", count, "deployment finished");
        Ok(())
    }

    /// Provisions a fresh account and commits the change as a block.
    pub async fn create_account(&self) -> Result<Address> {
        let address = Address::at_index(self.next_account_index.fetch_add(1, Ordering::SeqCst));
        let transaction = TransactionBody::new(
            format!("create-account {address}"),
            vec![],
            vec![self.service_account],
            "system/create-account",
        );

        let mut delta = Delta::new();
        delta.set(RegisterKey::account_status(address), b"exists".to_vec());
        let output = ExecutionOutput::succeeded(
            delta,
            vec![EmittedEvent {
                event_type: ACCOUNT_CREATED_EVENT.to_string(),
                payload: address.to_string().into_bytes(),
            }],
        );

        self.commit_executed(transaction, output)?;
        info!(target: "sandbox::chain", account = %address, "created account");
        Ok(address)
    }

    /// Wraps one executed transaction into a block and commits it.
    fn commit_executed(
        &self,
        transaction: TransactionBody,
        output: ExecutionOutput,
    ) -> Result<TransactionResult> {
        let _guard = self.commit_lock.lock();
        let parent = self.store.latest_block()?;
        let height = parent.height + 1;

        let events: Vec<Event> = output
            .events
            .into_iter()
            .enumerate()
            .map(|(index, emitted)| {
                Event::new(emitted.event_type, emitted.payload, height, index as u32)
            })
            .collect();

        let result = match output.status {
            TransactionStatus::Succeeded => TransactionResult::succeeded(
                transaction.id(),
                events.iter().map(|event| event.event_index).collect(),
            ),
            TransactionStatus::Failed => TransactionResult::failed(
                transaction.id(),
                output.error_message.unwrap_or_else(|| "execution failed".to_string()),
            ),
        };

        let collection = Collection::new(vec![transaction.id()]);
        let block = Block::new(height, parent.id(), timestamp_ms(), vec![collection.id()]);

        self.store.commit_block(
            block,
            vec![collection],
            vec![transaction],
            vec![result.clone()],
            output.delta,
            events,
        )?;

        Ok(result)
    }
}

fn timestamp_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
