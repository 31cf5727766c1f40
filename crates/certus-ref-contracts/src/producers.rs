//! Event producers for the contract-management domain.
//!
//! Each service wraps a shared `CertifiedEventLog` and turns one kind of
//! domain fact into an append. The services hold no chain state of their
//! own; everything they know about a contract is read back from the log.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use certus_canonical::to_payload;
use certus_config::EssentialFieldRegistry;
use certus_contracts::{
    error::CertusResult,
    event::{Event, EventId, ScopeId},
    filter::EventFilter,
};
use certus_log::CertifiedEventLog;

use crate::model::{
    ContractTerms, DocumentRecord, Message, NotaryAppointment, Signature, StateChange,
};

/// Event type names recorded by the reference producers.
pub mod event_types {
    pub const DOCUMENT_UPLOADED: &str = "document.uploaded";
    pub const DOCUMENT_SIGNED: &str = "document.signed";
    pub const COMMUNICATION_SENT: &str = "communication.sent";
    pub const COMMUNICATION_RECEIVED: &str = "communication.received";
    pub const CONTRACT_STATE_CHANGED: &str = "contract.state_changed";
    pub const NOTARY_APPOINTMENT_SCHEDULED: &str = "notary.appointment_scheduled";
    pub const CONTRACT_TERMS_RECORDED: &str = "contract.terms_recorded";
}

// ── Documents ─────────────────────────────────────────────────────────────────

pub struct DocumentService {
    log: Arc<CertifiedEventLog>,
}

impl DocumentService {
    pub fn new(log: Arc<CertifiedEventLog>) -> Self {
        Self { log }
    }

    pub fn upload(&self, scope_id: &ScopeId, document: &DocumentRecord) -> CertusResult<Event> {
        self.log
            .append_typed(scope_id, event_types::DOCUMENT_UPLOADED, document)
    }

    pub fn sign(&self, scope_id: &ScopeId, signature: &Signature) -> CertusResult<Event> {
        self.log
            .append_typed(scope_id, event_types::DOCUMENT_SIGNED, signature)
    }
}

// ── Communications ────────────────────────────────────────────────────────────

/// Outbound messages sent on behalf of the agency.
pub struct CommunicationService {
    log: Arc<CertifiedEventLog>,
}

impl CommunicationService {
    pub fn new(log: Arc<CertifiedEventLog>) -> Self {
        Self { log }
    }

    pub fn send(&self, scope_id: &ScopeId, message: &Message) -> CertusResult<Event> {
        self.log
            .append_typed(scope_id, event_types::COMMUNICATION_SENT, message)
    }
}

/// Messages received from counterparties.
pub struct InboundService {
    log: Arc<CertifiedEventLog>,
}

impl InboundService {
    pub fn new(log: Arc<CertifiedEventLog>) -> Self {
        Self { log }
    }

    pub fn receive(&self, scope_id: &ScopeId, message: &Message) -> CertusResult<Event> {
        self.log
            .append_typed(scope_id, event_types::COMMUNICATION_RECEIVED, message)
    }
}

// ── Notary ────────────────────────────────────────────────────────────────────

pub struct NotaryService {
    log: Arc<CertifiedEventLog>,
}

impl NotaryService {
    pub fn new(log: Arc<CertifiedEventLog>) -> Self {
        Self { log }
    }

    pub fn schedule(&self, scope_id: &ScopeId, appointment: &NotaryAppointment) -> CertusResult<Event> {
        self.log
            .append_typed(scope_id, event_types::NOTARY_APPOINTMENT_SCHEDULED, appointment)
    }

    /// Record a new date as a correction of the original appointment event.
    pub fn reschedule(
        &self,
        scope_id: &ScopeId,
        original: &EventId,
        appointment: &NotaryAppointment,
    ) -> CertusResult<Event> {
        self.log.append_correction(
            scope_id,
            original,
            event_types::NOTARY_APPOINTMENT_SCHEDULED,
            to_payload(appointment)?,
        )
    }
}

// ── Contract ──────────────────────────────────────────────────────────────────

/// Outcome of recording a new version of the contract terms.
#[derive(Debug, Clone, PartialEq)]
pub struct TermsRecorded {
    pub event: Event,
    /// `None` for the first version; otherwise whether an essential key changed.
    pub material: Option<bool>,
}

pub struct ContractService {
    log: Arc<CertifiedEventLog>,
    essential_fields: EssentialFieldRegistry,
}

impl ContractService {
    pub fn new(log: Arc<CertifiedEventLog>) -> Self {
        let essential_fields = log.config().essential_fields();
        Self {
            log,
            essential_fields,
        }
    }

    pub fn transition(&self, scope_id: &ScopeId, change: &StateChange) -> CertusResult<Event> {
        self.log
            .append_typed(scope_id, event_types::CONTRACT_STATE_CHANGED, change)
    }

    /// True if `next` differs from `previous` in any essential term.
    pub fn material_change(&self, previous: &ContractTerms, next: &ContractTerms) -> CertusResult<bool> {
        self.essential_fields.is_material_change(
            event_types::CONTRACT_TERMS_RECORDED,
            &to_payload(previous)?,
            &to_payload(next)?,
        )
    }

    /// The payload of the most recently recorded terms, if any.
    pub fn current_terms(&self, scope_id: &ScopeId) -> CertusResult<Option<Value>> {
        let recorded = self.log.list_events(
            scope_id,
            &EventFilter::of_type(event_types::CONTRACT_TERMS_RECORDED),
        )?;
        Ok(recorded.into_iter().last().map(|e| e.payload))
    }

    /// Append a new version of the terms, classified against the previous one.
    pub fn record_terms(&self, scope_id: &ScopeId, terms: &ContractTerms) -> CertusResult<TermsRecorded> {
        let payload = to_payload(terms)?;
        let material = match self.current_terms(scope_id)? {
            Some(previous) => Some(self.essential_fields.is_material_change(
                event_types::CONTRACT_TERMS_RECORDED,
                &previous,
                &payload,
            )?),
            None => None,
        };

        let event = self
            .log
            .append(scope_id, event_types::CONTRACT_TERMS_RECORDED, payload)?;
        info!(
            scope_id = %scope_id,
            revision = terms.revision,
            material = ?material,
            sequence_number = event.sequence_number,
            "contract terms recorded"
        );
        Ok(TermsRecorded { event, material })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
