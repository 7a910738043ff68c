//! Key and value encoding for the cache backend.
//!
//! Token and instance identifiers are untrusted text (any Unicode). Keys are
//! `<namespace>:<hex of the UTF-8 bytes>`, which is ASCII, free of spaces and
//! control characters, reversible, and keeps tokens and instances from
//! colliding with each other. Values are JSON.

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::CodecError;
use crate::models::token::ConsoleToken;

const TOKEN_NAMESPACE: &str = "consoleauth:token";
const INSTANCE_NAMESPACE: &str = "consoleauth:instance";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Token,
    Instance,
}

impl KeyKind {
    fn namespace(self) -> &'static str {
        match self {
            KeyKind::Token => TOKEN_NAMESPACE,
            KeyKind::Instance => INSTANCE_NAMESPACE,
        }
    }
}

pub fn encode_key(kind: KeyKind, raw: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(kind.namespace().len() + 1 + raw.len() * 2);
    key.extend_from_slice(kind.namespace().as_bytes());
    key.push(b':');
    key.extend_from_slice(hex::encode(raw.as_bytes()).as_bytes());
    key
}

pub fn token_key(token: &str) -> Vec<u8> {
    encode_key(KeyKind::Token, token)
}

pub fn instance_key(instance_uuid: &str) -> Vec<u8> {
    encode_key(KeyKind::Instance, instance_uuid)
}

/// Inverse of `encode_key`.
pub fn decode_key(key: &[u8]) -> Result<(KeyKind, String), CodecError> {
    let text = std::str::from_utf8(key)
        .map_err(|_| CodecError::MalformedKey("key is not UTF-8".into()))?;
    let (namespace, encoded) = text
        .rsplit_once(':')
        .ok_or_else(|| CodecError::MalformedKey(format!("no namespace in '{}'", text)))?;
    let kind = match namespace {
        TOKEN_NAMESPACE => KeyKind::Token,
        INSTANCE_NAMESPACE => KeyKind::Instance,
        other => return Err(CodecError::MalformedKey(format!("unknown namespace '{}'", other))),
    };
    let bytes = hex::decode(encoded).map_err(|e| CodecError::MalformedKey(e.to_string()))?;
    let raw = String::from_utf8(bytes)
        .map_err(|_| CodecError::MalformedKey("identifier is not UTF-8".into()))?;
    Ok((kind, raw))
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(value)?)
}

fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn encode_token(token: &ConsoleToken) -> Result<Vec<u8>, CodecError> {
    encode_value(token)
}

pub fn decode_token(bytes: &[u8]) -> Result<ConsoleToken, CodecError> {
    decode_value(bytes)
}

/// Instance index values are a JSON array of token ids, order preserved.
pub fn encode_index(tokens: &[String]) -> Result<Vec<u8>, CodecError> {
    encode_value(&tokens)
}

pub fn decode_index(bytes: &[u8]) -> Result<Vec<String>, CodecError> {
    decode_value(bytes)
}
