//! Operation replay
//!
//! Applies a stream of [`Operation`]s to a [`PaymentEngine`] in order and
//! writes one JSON outcome line per operation:
//!
//! ```text
//! {"line":1,"op":"transfer","ok":true,"result":{"transaction_id":"..."}}
//! {"line":2,"op":"act","ok":false,"error":"user 'mallory' is not authorised to accept"}
//! ```
//!
//! `transfer` and `request` lines may name their result with an `alias`;
//! later `act` / `get` lines can use the alias or the raw id.

use crate::core::{PageRequest, PaymentEngine, TransactionPage};
use crate::io::Operation;
use crate::types::{PaymentError, RequestId, Transaction, TransactionId, TransactionStatus};
use anyhow::Context;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use tracing::{info, warn};

/// Successful result of one operation
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Transferred { transaction_id: TransactionId },
    Requested { request_id: RequestId },
    Acted { status: TransactionStatus },
    Found(Box<Transaction>),
    Listed(TransactionPage),
}

#[derive(Debug, Serialize)]
struct Outcome<'a> {
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    op: Option<&'static str>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a OperationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Counts of what a replay did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub failed: usize,
    /// Lines that could not be decoded
    pub skipped: usize,
}

pub struct Runner<'a> {
    engine: &'a PaymentEngine,
    aliases: HashMap<String, String>,
}

impl<'a> Runner<'a> {
    pub fn new(engine: &'a PaymentEngine) -> Self {
        Runner {
            engine,
            aliases: HashMap::new(),
        }
    }

    /// Apply a single operation
    pub fn apply(&mut self, operation: Operation) -> Result<OperationResult, PaymentError> {
        match operation {
            Operation::Transfer { alias, command } => {
                let transaction_id = self.engine.initiate(command)?;
                self.bind(alias, &transaction_id);
                Ok(OperationResult::Transferred { transaction_id })
            }
            Operation::Request { alias, command } => {
                let request_id = self.engine.make_request(command)?;
                self.bind(alias, &request_id);
                Ok(OperationResult::Requested { request_id })
            }
            Operation::Act {
                request,
                action,
                user,
            } => {
                let status = self.engine.act(self.resolve(&request), &action, &user)?;
                Ok(OperationResult::Acted { status })
            }
            Operation::Get {
                transaction,
                role,
                user,
            } => {
                let found = self
                    .engine
                    .get_by_id(self.resolve(&transaction), &role, &user)?;
                Ok(OperationResult::Found(Box::new(found)))
            }
            Operation::List {
                role,
                user,
                page_size,
                page_number,
            } => {
                let page = PageRequest::new(page_size.unwrap_or(0), page_number.unwrap_or(0));
                Ok(OperationResult::Listed(self.engine.list(&role, &user, page)?))
            }
        }
    }

    /// Apply every operation and write one outcome line each to `output`
    ///
    /// Business failures are reported and replay continues. A fatal store
    /// error, or a failure to write output, stops the replay.
    pub fn run<I, W>(&mut self, operations: I, output: &mut W) -> anyhow::Result<RunSummary>
    where
        I: IntoIterator<Item = (usize, Result<Operation, String>)>,
        W: Write + ?Sized,
    {
        let mut summary = RunSummary::default();

        for (line, operation) in operations {
            let operation = match operation {
                Ok(operation) => operation,
                Err(e) => {
                    warn!(line, error = %e, "skipping malformed operation");
                    summary.skipped += 1;
                    let outcome = Outcome {
                        line,
                        op: None,
                        ok: false,
                        result: None,
                        error: Some(e),
                    };
                    write_outcome(output, &outcome)?;
                    continue;
                }
            };

            let op = operation.name();
            match self.apply(operation) {
                Ok(result) => {
                    summary.applied += 1;
                    let outcome = Outcome {
                        line,
                        op: Some(op),
                        ok: true,
                        result: Some(&result),
                        error: None,
                    };
                    write_outcome(output, &outcome)?;
                }
                Err(e) => {
                    summary.failed += 1;
                    let outcome = Outcome {
                        line,
                        op: Some(op),
                        ok: false,
                        result: None,
                        error: Some(e.to_string()),
                    };
                    write_outcome(output, &outcome)?;
                    if e.is_fatal() {
                        return Err(e)
                            .with_context(|| format!("line {line}: store failure, stopping replay"));
                    }
                }
            }
        }

        info!(
            applied = summary.applied,
            failed = summary.failed,
            skipped = summary.skipped,
            "operations replayed"
        );
        Ok(summary)
    }

    fn bind(&mut self, alias: Option<String>, id: &str) {
        if let Some(alias) = alias {
            if self.aliases.insert(alias.clone(), id.to_string()).is_some() {
                warn!(alias = %alias, "alias rebound to a newer id");
            }
        }
    }

    fn resolve<'k>(&'k self, key: &'k str) -> &'k str {
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }
}

fn write_outcome<W: Write + ?Sized>(output: &mut W, outcome: &Outcome<'_>) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *output, outcome).context("failed to encode outcome")?;
    writeln!(output).context("failed to write outcome")?;
    Ok(())
}
