//! The execution engine boundary.
//!
//! The chain does not interpret scripts itself: it hands the current
//! ledger view to an [`ExecutionEngine`] and commits whatever delta and
//! events the engine produces. A real contract-language interpreter
//! would implement this trait; the sandbox ships [`KeyValueEngine`], a
//! deterministic register machine driven by small JSON programs, which
//! exercises every store path without a language runtime.
//!
//! ## KeyValueEngine program form
//!
//! Scripts (read-only):
//!
//! ```json
//! { "read": "counter" }
//! ```
//!
//! Transactions (state-changing):
//!
//! ```json
//! {
//!   "writes": { "counter": "42" },
//!   "events": [ { "type": "app.Updated", "payload": "counter=42" } ]
//! }
//! ```
//!
//! A transaction with a `"fail"` key fails with that message; the
//! failure is still recorded on chain. Registers are owned by the
//! transaction's first authorizer (the service account for scripts).

use crate::{Error, Result};
use async_trait::async_trait;
use sandbox_core::{Address, Delta, RegisterKey, TransactionBody, TransactionStatus};
use sandbox_store::SnapshotTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An event produced by the engine, before the store assigns its
/// height and position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmittedEvent {
    /// The event type tag.
    pub event_type: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// What executing one transaction produced.
#[derive(Clone, Debug)]
pub struct ExecutionOutput {
    /// Terminal status of the execution.
    pub status: TransactionStatus,
    /// Failure message, present iff the status is `Failed`.
    pub error_message: Option<String>,
    /// The register write set. Empty for failed executions.
    pub delta: Delta,
    /// Events emitted during execution, in order. Empty for failed
    /// executions.
    pub events: Vec<EmittedEvent>,
}

impl ExecutionOutput {
    /// A successful output.
    pub fn succeeded(delta: Delta, events: Vec<EmittedEvent>) -> Self {
        Self {
            status: TransactionStatus::Succeeded,
            error_message: None,
            delta,
            events,
        }
    }

    /// A failed output; the failure still commits as a result, but
    /// carries no writes and no events.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: TransactionStatus::Failed,
            error_message: Some(message.into()),
            delta: Delta::new(),
            events: Vec::new(),
        }
    }
}

/// The value a read-only script evaluated to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptResult {
    /// The evaluated value: a string for UTF-8 register contents, null
    /// for a register that was never written.
    pub value: serde_json::Value,
}

/// Script and transaction interpretation, supplied by a collaborator.
///
/// Script execution only ever reads the given view; transaction
/// execution returns its writes as a delta and never touches the store
/// directly.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Runs a read-only script against a ledger view.
    async fn execute_script(
        &self,
        view: &SnapshotTree,
        script: &str,
        arguments: &[String],
    ) -> Result<ScriptResult>;

    /// Runs a state-changing transaction against a ledger view.
    async fn execute_transaction(
        &self,
        view: &SnapshotTree,
        transaction: &TransactionBody,
    ) -> Result<ExecutionOutput>;
}

#[derive(Debug, Deserialize)]
struct ScriptProgram {
    read: String,
    #[serde(default)]
    owner: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct TransactionProgram {
    #[serde(default)]
    writes: BTreeMap<String, String>,
    #[serde(default)]
    events: Vec<EventSpec>,
    #[serde(default)]
    fail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventSpec {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    payload: String,
}

/// The built-in deterministic register machine.
#[derive(Debug, Default)]
pub struct KeyValueEngine;

impl KeyValueEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }

    fn authorizer(transaction: &TransactionBody) -> Address {
        transaction
            .authorizers
            .first()
            .copied()
            .unwrap_or(Address::SERVICE)
    }
}

#[async_trait]
impl ExecutionEngine for KeyValueEngine {
    async fn execute_script(
        &self,
        view: &SnapshotTree,
        script: &str,
        _arguments: &[String],
    ) -> Result<ScriptResult> {
        let program: ScriptProgram = serde_json::from_str(script)
            .map_err(|e| Error::InvalidRequest(format!("malformed script: {e}")))?;
        let owner = program.owner.unwrap_or(Address::SERVICE);
        let key = RegisterKey::new(owner, program.read);
        let value = match view.get(&key) {
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => serde_json::Value::String(text.to_string()),
                Err(_) => serde_json::Value::String(hex::encode(bytes)),
            },
            None => serde_json::Value::Null,
        };
        Ok(ScriptResult { value })
    }

    async fn execute_transaction(
        &self,
        _view: &SnapshotTree,
        transaction: &TransactionBody,
    ) -> Result<ExecutionOutput> {
        let program: TransactionProgram = match serde_json::from_str(&transaction.script) {
            Ok(program) => program,
            // A malformed program is an on-chain failure, not an
            // engine fault: the result still commits.
            Err(e) => return Ok(ExecutionOutput::failed(format!("malformed transaction: {e}"))),
        };

        if let Some(message) = program.fail {
            return Ok(ExecutionOutput::failed(message));
        }

        let owner = Self::authorizer(transaction);
        let mut delta = Delta::new();
        for (key, value) in program.writes {
            delta.set(RegisterKey::new(owner, key), value.into_bytes());
        }

        let events = program
            .events
            .into_iter()
            .map(|spec| EmittedEvent {
                event_type: spec.event_type,
                payload: spec.payload.into_bytes(),
            })
            .collect();

        Ok(ExecutionOutput::succeeded(delta, events))
    }
}
