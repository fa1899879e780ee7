//! The request/response correlator: allocates request ids,
//! matches `COMMAND_RESULT` payloads back to the caller that's waiting on
//! them. Grounded on `RPCManager` (`allocate_id`/`create_request`/`recv`),
//! re-expressed with one-shot futures in place of callbacks.

use std::collections::{HashMap, HashSet};

use companion_types::CommandRequest;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::ServiceError;

/// Allocates ids, stores pending completions, and matches them to
/// `COMMAND_RESULT` payloads as they arrive. Delivery order is whatever the
/// server chooses; each completion fires at most once.
#[derive(Debug, Default)]
pub struct RpcCorrelator {
    next_id: u32,
    outstanding: HashMap<u32, oneshot::Sender<Value>>,
    /// Ids whose caller called `cancel` before the response arrived — the
    /// eventual response is accepted and silently dropped, not treated as
    /// `UnknownResponse`.
    cancelled: HashSet<u32>,
}

impl RpcCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id, stores a completion, and returns the JSON request
    /// plus the receiver half the caller awaits.
    pub fn create_request(&mut self, kind: u8, args: Vec<Value>) -> (CommandRequest, oneshot::Receiver<Value>) {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let (tx, rx) = oneshot::channel();
        self.outstanding.insert(id, tx);
        (CommandRequest { id, kind, args }, rx)
    }

    /// Decodes a `COMMAND_RESULT` payload and delivers it to the matching
    /// completion.
    pub fn recv(&mut self, payload: &[u8]) -> Result<(), ServiceError> {
        let value: Value = serde_json::from_slice(payload).map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
        let id = value
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| ServiceError::MalformedResponse("COMMAND_RESULT missing integer \"id\"".to_string()))?
            as u32;

        if let Some(tx) = self.outstanding.remove(&id) {
            // The caller may have dropped its receiver (e.g. timed out
            // without calling `cancel`); that's not an error here.
            let _ = tx.send(value);
            Ok(())
        } else if self.cancelled.remove(&id) {
            Ok(())
        } else {
            Err(ServiceError::UnknownResponse(id))
        }
    }

    /// Discards the completion for `id` without affecting in-flight network
    /// state; a response that later arrives for `id` is accepted and
    /// dropped rather than surfacing as `UnknownResponse`.
    pub fn cancel(&mut self, id: u32) {
        if self.outstanding.remove(&id).is_some() {
            self.cancelled.insert(id);
        }
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }
}
