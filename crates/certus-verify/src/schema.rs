//! JSON Schema of the scope export document.

use serde_json::{json, Value};

const HEX_DIGEST: &str = "^[0-9a-f]{64}$";

/// The structural contract every export must satisfy before its chain is walked.
pub fn export_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["scopeId", "exportedAt", "events", "terminalHash", "exportDigest"],
        "properties": {
            "scopeId": { "type": "string", "minLength": 1 },
            "exportedAt": { "type": "string" },
            "terminalHash": { "type": "string", "pattern": "^([0-9a-f]{64})?$" },
            "exportDigest": { "type": "string", "pattern": HEX_DIGEST },
            "events": {
                "type": "array",
                "items": { "$ref": "#/$defs/event" }
            }
        },
        "$defs": {
            "event": {
                "type": "object",
                "required": [
                    "id", "scopeId", "type", "payload", "payloadDigest", "previousHash",
                    "linkHash", "sequenceNumber", "createdAt", "canonicalVersion",
                    "timestampStatus"
                ],
                "properties": {
                    "id": { "type": "string" },
                    "scopeId": { "type": "string", "minLength": 1 },
                    "type": { "type": "string", "minLength": 1 },
                    "payloadDigest": { "type": "string", "pattern": HEX_DIGEST },
                    "previousHash": { "type": "string", "pattern": HEX_DIGEST },
                    "linkHash": { "type": "string", "pattern": HEX_DIGEST },
                    "sequenceNumber": { "type": "integer", "minimum": 0 },
                    "createdAt": { "type": "string" },
                    "canonicalVersion": { "type": "integer", "minimum": 1 },
                    "timestampStatus": {
                        "enum": ["not-required", "pending", "attached"]
                    },
                    "qualifiedTimestamp": {
                        "type": ["object", "null"],
                        "required": ["issuer", "assertedTime", "proof", "digest"],
                        "properties": {
                            "issuer": { "type": "string" },
                            "assertedTime": { "type": "string" },
                            "proof": { "type": "string" },
                            "digest": { "type": "string", "pattern": HEX_DIGEST }
                        }
                    }
                }
            }
        }
    })
}
