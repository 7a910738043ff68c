//! Wire shapes of a console-port RPC to the compute service or cell router.
//!
//! Calls use the JSON-RPC 2.0 envelope. A reply is only trusted when it
//! answers the call that was sent: its `id` must match.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::RpcError;

#[derive(Debug, Serialize)]
pub struct RpcCall<'a> {
    jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcCall<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcReply {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcFault>,
}

/// Error member of a reply, e.g. the remote's InstanceNotFound.
#[derive(Debug, Deserialize)]
struct RpcFault {
    code: i64,
    message: String,
}

impl RpcReply {
    /// The `result` of the call numbered `call_id`.
    ///
    /// Faults win over everything else since servers may send them with a
    /// null id (parse errors).
    pub fn into_result(self, call_id: u64) -> Result<Value, RpcError> {
        if let Some(fault) = self.error {
            return Err(RpcError::Remote {
                code: fault.code,
                message: fault.message,
            });
        }
        if self.id != Some(call_id) {
            return Err(RpcError::IdMismatch {
                expected: call_id,
                got: self.id,
            });
        }
        self.result
            .ok_or_else(|| RpcError::InvalidResult("reply has neither result nor error".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(body: Value) -> RpcReply {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_call_envelope() {
        let call = RpcCall::new(7, "validate_console_port", json!({ "port": "5900" }));
        let wire = serde_json::to_value(&call).unwrap();
        assert_eq!(
            wire,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "validate_console_port",
                "params": { "port": "5900" },
            })
        );
    }

    #[test]
    fn test_matching_reply_yields_result() {
        let value = reply(json!({ "jsonrpc": "2.0", "id": 3, "result": true }))
            .into_result(3)
            .unwrap();
        assert_eq!(value, json!(true));
    }

    #[test]
    fn test_reply_for_another_call_is_rejected() {
        let err = reply(json!({ "jsonrpc": "2.0", "id": 2, "result": true }))
            .into_result(3)
            .unwrap_err();
        assert!(matches!(err, RpcError::IdMismatch { expected: 3, got: Some(2) }));

        let err = reply(json!({ "jsonrpc": "2.0", "result": true }))
            .into_result(3)
            .unwrap_err();
        assert!(matches!(err, RpcError::IdMismatch { expected: 3, got: None }));
    }

    #[test]
    fn test_fault_with_null_id_is_remote_error() {
        let err = reply(json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": -32700, "message": "Parse error" },
        }))
        .into_result(3)
        .unwrap_err();
        assert!(matches!(err, RpcError::Remote { code: -32700, .. }));
    }

    #[test]
    fn test_empty_reply_is_invalid() {
        let err = reply(json!({ "jsonrpc": "2.0", "id": 3 }))
            .into_result(3)
            .unwrap_err();
        assert!(matches!(err, RpcError::InvalidResult(_)));
    }
}
