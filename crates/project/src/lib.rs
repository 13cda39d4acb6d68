//! Sandbox Project Orchestrator
//!
//! Drives one sandbox session: clone the project tree, start a
//! disposable chain, provision the accounts the manifest asks for,
//! deploy the manifest's contracts, and serve script/transaction
//! execution and state export on top of the result. The orchestrator
//! never touches the chain store directly; everything goes through the
//! chain instance.

#![warn(missing_docs)]

/// The project manifest (`sandbox.json`)
pub mod manifest;

use manifest::Manifest;
use sandbox_chain::{Blockchain, ContractDescriptor, ScriptResult};
use sandbox_config::ChainConfig;
use sandbox_core::{Address, TransactionBody, TransactionResult};
use sandbox_source::{SourceFile, SourceProvider};
use sandbox_store::StoreSnapshot;
use std::collections::HashMap;
use tracing::info;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Orchestration error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source acquisition failed.
    #[error(transparent)]
    Source(#[from] sandbox_source::Error),

    /// The chain rejected an operation.
    #[error(transparent)]
    Chain(#[from] sandbox_chain::Error),

    /// The project manifest is missing or malformed.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// The request's argument list could not be parsed.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Serializing a response failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One opened sandbox session: a cloned source tree plus a running
/// chain with the project's contracts deployed.
pub struct Project {
    repository: Box<dyn SourceProvider>,
    blockchain: Blockchain,
    accounts: HashMap<String, Address>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

impl Project {
    /// Opens a project: clone → start chain → create accounts → deploy
    /// contracts.
    pub async fn open(
        mut repository: Box<dyn SourceProvider>,
        config: ChainConfig,
        url: &str,
    ) -> Result<Self> {
        info!(target: "sandbox::project", url, "opening project");
        repository.clone_from(url).await?;

        let blockchain = Blockchain::new(config)?;
        let manifest = Self::load_manifest(repository.as_ref()).await?;

        let mut accounts = HashMap::new();
        for name in &manifest.accounts {
            let address = blockchain.create_account().await?;
            info!(target: "sandbox::project", account = %name, address = %address, "created account");
            accounts.insert(name.clone(), address);
        }

        let mut descriptors = Vec::with_capacity(manifest.contracts.len());
        for (name, path) in &manifest.contracts {
            let source = repository.read_file(path).await?;
            descriptors.push(ContractDescriptor {
                name: name.clone(),
                source,
                location: path.clone(),
            });
        }
        let deployed = descriptors.len();
        blockchain.deploy(descriptors).await?;
        info!(target: "sandbox::project", contracts = deployed, "project opened");

        Ok(Self {
            repository,
            blockchain,
            accounts,
        })
    }

    async fn load_manifest(repository: &dyn SourceProvider) -> Result<Manifest> {
        let bytes = repository
            .read_file(sandbox_config::MANIFEST_FILE)
            .await
            .map_err(|_| {
                Error::Manifest(format!(
                    "project has no {} at its root",
                    sandbox_config::MANIFEST_FILE
                ))
            })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Manifest(format!("{}: {e}", sandbox_config::MANIFEST_FILE)))
    }

    /// Lists the files of the cloned source tree.
    pub async fn files(&self) -> Result<Vec<SourceFile>> {
        Ok(self.repository.files().await?)
    }

    /// The accounts created from the manifest, by name.
    pub fn accounts(&self) -> &HashMap<String, Address> {
        &self.accounts
    }

    /// Runs a read-only script against the latest chain state.
    pub async fn execute_script(
        &self,
        source: &str,
        _location: &str,
        arguments_json: &str,
    ) -> Result<ScriptResult> {
        let arguments = parse_arguments(arguments_json)?;
        Ok(self.blockchain.execute_script(source, &arguments).await?)
    }

    /// Executes a transaction signed by the service account and commits
    /// it as the next block.
    pub async fn execute_transaction(
        &self,
        source: &str,
        location: &str,
        arguments_json: &str,
    ) -> Result<TransactionResult> {
        let arguments = parse_arguments(arguments_json)?;
        let body = TransactionBody::new(
            source,
            arguments,
            vec![self.blockchain.service_account()],
            location,
        );
        Ok(self.blockchain.execute_transaction(body).await?)
    }

    /// Exports the chain's indexed state.
    pub fn chain_state(&self) -> StoreSnapshot {
        self.blockchain.export_state()
    }
}

/// Parses a JSON-encoded argument list into its element encodings.
///
/// An empty string means no arguments; anything else must be a JSON
/// array.
fn parse_arguments(arguments_json: &str) -> Result<Vec<String>> {
    if arguments_json.is_empty() {
        return Ok(Vec::new());
    }
    let values: Vec<serde_json::Value> = serde_json::from_str(arguments_json)
        .map_err(|e| Error::InvalidArguments(e.to_string()))?;
    Ok(values.into_iter().map(|value| value.to_string()).collect())
}
