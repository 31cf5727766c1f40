//! Simulated contract-management data for the Certus reference producers.
//!
//! All data in this module is hardcoded and fictional. File and message
//! contents are represented by short placeholder texts whose SHA-256 stands
//! in for the hash of the real document.

use certus_canonical::hash_sha256;
use certus_contracts::event::ScopeId;

use crate::model::{
    Channel, ContractTerms, Deadlines, DocumentRecord, Message, NotaryAppointment, Party, Price,
    Property,
};

const PURCHASE_AGREEMENT_TEXT: &str =
    "PRIVATE PURCHASE AGREEMENT. The Vendor sells and the Buyer purchases the dwelling at \
     Calle del Olmo 14, 3B, free of charges, for the price stated in clause 2.";
const SURVEY_TEXT: &str =
    "PROPERTY SURVEY. Usable area 84.2 m2. No structural defects observed. Energy rating D.";
const OFFER_BODY: &str =
    "Dear Ms. Ortega, please find attached the purchase agreement for your review and signature.";
const REPLY_BODY: &str =
    "Thank you. I have reviewed the agreement and signed it. Could we confirm the notary date?";

// ── Scope ─────────────────────────────────────────────────────────────────────

/// The contract file every scenario works on, unless it needs its own.
pub fn contract_scope() -> ScopeId {
    ScopeId::new("contract-2026-0042")
}

// ── Documents ─────────────────────────────────────────────────────────────────

pub fn purchase_agreement() -> DocumentRecord {
    DocumentRecord {
        document_id: "doc-0042-agreement".to_string(),
        name: "purchase-agreement-v1.pdf".to_string(),
        media_type: "application/pdf".to_string(),
        sha256: hash_sha256(PURCHASE_AGREEMENT_TEXT),
        uploaded_by: "agent.marquez@inmo.example".to_string(),
    }
}

pub fn property_survey() -> DocumentRecord {
    DocumentRecord {
        document_id: "doc-0042-survey".to_string(),
        name: "property-survey.pdf".to_string(),
        media_type: "application/pdf".to_string(),
        sha256: hash_sha256(SURVEY_TEXT),
        uploaded_by: "surveyor@tasaciones.example".to_string(),
    }
}

// ── Communications ────────────────────────────────────────────────────────────

pub fn offer_email() -> Message {
    Message {
        message_id: "msg-0042-0001".to_string(),
        channel: Channel::CertifiedEmail,
        from: "agent.marquez@inmo.example".to_string(),
        to: vec!["l.ortega@mail.example".to_string()],
        subject: "Purchase agreement for Calle del Olmo 14, 3B".to_string(),
        body_sha256: hash_sha256(OFFER_BODY),
    }
}

pub fn buyer_reply() -> Message {
    Message {
        message_id: "msg-0042-0002".to_string(),
        channel: Channel::Email,
        from: "l.ortega@mail.example".to_string(),
        to: vec!["agent.marquez@inmo.example".to_string()],
        subject: "Re: Purchase agreement for Calle del Olmo 14, 3B".to_string(),
        body_sha256: hash_sha256(REPLY_BODY),
    }
}

// ── Notary ────────────────────────────────────────────────────────────────────

pub fn notary_appointment() -> NotaryAppointment {
    NotaryAppointment {
        notary: "Notaria Villanueva".to_string(),
        office: "Plaza Mayor 3, Madrid".to_string(),
        date: "2026-05-04".to_string(),
        time: "10:30".to_string(),
    }
}

/// Same office, one day later.
pub fn rescheduled_appointment() -> NotaryAppointment {
    NotaryAppointment {
        date: "2026-05-05".to_string(),
        time: "12:00".to_string(),
        ..notary_appointment()
    }
}

// ── Contract terms ────────────────────────────────────────────────────────────

pub fn initial_terms() -> ContractTerms {
    ContractTerms {
        revision: 1,
        property: Property {
            cadastral_ref: "9872023VH5797S0001WX".to_string(),
            address: "Calle del Olmo 14, 3B, 28012 Madrid".to_string(),
        },
        price: Price {
            amount_cents: 31_500_000,
            currency: "EUR".to_string(),
        },
        parties: vec![
            Party {
                role: "vendor".to_string(),
                name: "Inversiones Olmo SL".to_string(),
                tax_id: "B00000000".to_string(),
            },
            Party {
                role: "buyer".to_string(),
                name: "Lucia Ortega".to_string(),
                tax_id: "00000000T".to_string(),
            },
        ],
        deadlines: Deadlines {
            deposit_due: "2026-04-15".to_string(),
            signing_due: "2026-05-04".to_string(),
        },
        notes: "Keys handed over at signing.".to_string(),
    }
}

/// Reworded notes only.
pub fn cosmetic_revision(terms: &ContractTerms) -> ContractTerms {
    ContractTerms {
        revision: terms.revision + 1,
        notes: "Keys are handed over at the notary signing.".to_string(),
        ..terms.clone()
    }
}

/// Price lowered after the survey.
pub fn price_renegotiation(terms: &ContractTerms) -> ContractTerms {
    ContractTerms {
        revision: terms.revision + 1,
        price: Price {
            amount_cents: terms.price.amount_cents - 750_000,
            ..terms.price.clone()
        },
        ..terms.clone()
    }
}

/// Signing deadline moved to match the notary reschedule.
pub fn deadline_extension(terms: &ContractTerms) -> ContractTerms {
    ContractTerms {
        revision: terms.revision + 1,
        deadlines: Deadlines {
            signing_due: "2026-05-05".to_string(),
            ..terms.deadlines.clone()
        },
        ..terms.clone()
    }
}
