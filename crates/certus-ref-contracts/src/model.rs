//! Domain records produced by the contract-management services.
//!
//! These are the typed payloads the producers hand to the log. Field names
//! serialize in camelCase; the essential keys configured for
//! `contract.terms_recorded` refer to the top-level fields of `ContractTerms`.

use serde::{Deserialize, Serialize};

// ── Documents ─────────────────────────────────────────────────────────────────

/// A file attached to a contract file, identified by its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub document_id: String,
    pub name: String,
    pub media_type: String,
    /// SHA-256 (hex) of the file contents.
    pub sha256: String,
    pub uploaded_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureMethod {
    AdvancedEsign,
    QualifiedEsign,
    Handwritten,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub document_id: String,
    pub signer: String,
    pub method: SignatureMethod,
}

// ── Communications ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Email,
    CertifiedEmail,
    Sms,
}

/// An outbound or inbound message. Only the body's hash is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    pub channel: Channel,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body_sha256: String,
}

// ── Notary ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotaryAppointment {
    pub notary: String,
    pub office: String,
    /// Local date, `YYYY-MM-DD`.
    pub date: String,
    /// Local time, `HH:MM`.
    pub time: String,
}

// ── Contract ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractState {
    Draft,
    Negotiation,
    Reserved,
    Signed,
    Notarized,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub from: ContractState,
    pub to: ContractState,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub cadastral_ref: String,
    pub address: String,
}

/// Amounts are kept in integer cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub amount_cents: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub role: String,
    pub name: String,
    pub tax_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deadlines {
    pub deposit_due: String,
    pub signing_due: String,
}

/// One version of the commercial terms of a contract.
///
/// `price`, `parties`, `deadlines` and `property` are essential; `notes` and
/// `revision` are not, so a version that only touches them is cosmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTerms {
    pub revision: u32,
    pub property: Property,
    pub price: Price,
    pub parties: Vec<Party>,
    pub deadlines: Deadlines,
    pub notes: String,
}
