//! Domain types for ticket check-in.
//!
//! Wire names are camelCase to match the payload a ticket holder's device
//! renders into its QR code.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque ticket identifier (e.g. `TKT-001`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Creates a ticket id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty or whitespace only
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the event a ticket admits to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates an event id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty or whitespace only
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of the current ticket holder (e.g. `0xabc...`)
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    /// Creates an owner address
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the address is empty or whitespace only
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Hex addresses are compared case-insensitively (checksum casing varies).
impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Ticket identity
// ============================================================================

/// A single issued ticket as the ledger knows it
///
/// `checked_in` only ever moves from `false` to `true`; the ledger is the only
/// place that flips it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketIdentity {
    /// Ticket identifier
    pub ticket_id: TicketId,
    /// Parent event
    pub event_id: EventId,
    /// Position in the event's issuance sequence
    #[serde(default)]
    pub token_id: u64,
    /// Current holder
    pub owner: Owner,
    /// Display name of the event
    #[serde(default)]
    pub event_name: String,
    /// Display name of the ticket tier
    #[serde(default)]
    pub tier_name: String,
    /// Attendee name, when the holder provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee_name: Option<String>,
    /// Whether the ticket has been used
    #[serde(default)]
    pub checked_in: bool,
    /// Epoch milliseconds of the check-in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<i64>,
}

impl TicketIdentity {
    /// Creates a not-yet-checked-in ticket
    #[must_use]
    pub fn new(ticket_id: TicketId, event_id: EventId, token_id: u64, owner: Owner) -> Self {
        Self {
            ticket_id,
            event_id,
            token_id,
            owner,
            event_name: String::new(),
            tier_name: String::new(),
            attendee_name: None,
            checked_in: false,
            checked_in_at: None,
        }
    }

    /// Sets the event display name
    #[must_use]
    pub fn with_event_name(mut self, name: impl Into<String>) -> Self {
        self.event_name = name.into();
        self
    }

    /// Sets the tier display name
    #[must_use]
    pub fn with_tier_name(mut self, name: impl Into<String>) -> Self {
        self.tier_name = name.into();
        self
    }

    /// Sets the attendee name
    #[must_use]
    pub fn with_attendee_name(mut self, name: impl Into<String>) -> Self {
        self.attendee_name = Some(name.into());
        self
    }

    /// Whether ticket id, event id and owner are all present
    #[must_use]
    pub fn has_identity(&self) -> bool {
        !self.ticket_id.is_blank() && !self.event_id.is_blank() && !self.owner.is_blank()
    }
}

// ============================================================================
// Scan payload
// ============================================================================

/// Freshness nonce embedded in a displayed code
///
/// Not a signature: it only makes successive renders of the same ticket
/// differ. Generated from the clock in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Salt(i64);

impl Salt {
    /// Salt from an epoch-milliseconds reading
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Raw value
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// What a ticket holder's QR code carries, and what a kiosk submits
///
/// Every field is optional on the way in so that a structurally incomplete
/// scan still deserializes and can be rejected with a precise reason.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanPayload {
    /// Ticket identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<TicketId>,
    /// Issuance sequence number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<u64>,
    /// Parent event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    /// Holder address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    /// Freshness nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<Salt>,
    /// Creation time, epoch milliseconds
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "epoch_millis::deserialize"
    )]
    pub timestamp: Option<i64>,
}

/// Lenient epoch-milliseconds field
///
/// Browsers produce `Date.now()` as an integer but arithmetic on it can
/// leave a fraction (`1735689600000.0`); such values are truncated rather
/// than failing the whole body.
pub mod epoch_millis {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Integer(i64),
        Fractional(f64),
    }

    /// Deserialize an optional integer or fractional millisecond count
    ///
    /// # Errors
    ///
    /// Fails for anything that is not a number or null.
    #[allow(clippy::cast_possible_truncation)] // Saturating by definition of `as`
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Millis>::deserialize(deserializer)?.map(|millis| match millis {
            Millis::Integer(value) => value,
            Millis::Fractional(value) => value.trunc() as i64,
        }))
    }
}

/// Identity fields of a payload that passed the structural check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIdentity {
    /// Ticket identifier
    pub ticket_id: TicketId,
    /// Parent event
    pub event_id: EventId,
    /// Holder address
    pub owner: Owner,
}

impl ScanPayload {
    /// Identity fields, if all three are present and non-blank
    #[must_use]
    pub fn identity(&self) -> Option<ScanIdentity> {
        let ticket_id = self.ticket_id.as_ref().filter(|id| !id.is_blank())?;
        let event_id = self.event_id.as_ref().filter(|id| !id.is_blank())?;
        let owner = self.owner.as_ref().filter(|owner| !owner.is_blank())?;

        Some(ScanIdentity {
            ticket_id: ticket_id.clone(),
            event_id: event_id.clone(),
            owner: owner.clone(),
        })
    }

    /// Payload timestamp, with a missing one read as the epoch
    #[must_use]
    pub fn timestamp_or_epoch(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }
}

// ============================================================================
// Check-in outcomes
// ============================================================================

/// One validation attempt as shown in the operator feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRecord {
    /// Record id
    pub id: String,
    /// Scanned ticket; empty when the scan carried none
    pub ticket_id: String,
    /// Event display name, when the ticket is known
    pub event_name: String,
    /// Attendee name, when the ticket is known and has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee_name: Option<String>,
    /// Epoch milliseconds of the outcome
    pub timestamp: i64,
    /// Whether the ticket was admitted
    pub success: bool,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A successful check-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInSuccess {
    /// Admitted ticket
    pub ticket_id: TicketId,
    /// Event display name
    pub event_name: String,
    /// Attendee name
    pub attendee_name: Option<String>,
    /// Epoch milliseconds of the check-in
    pub timestamp: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_identity_requires_all_fields() {
        let payload: ScanPayload = serde_json::from_str(r#"{"ticketId":"T1","eventId":"E1"}"#).unwrap();
        assert!(payload.identity().is_none());

        let payload: ScanPayload =
            serde_json::from_str(r#"{"ticketId":"T1","eventId":"E1","owner":"0xabc"}"#).unwrap();
        let identity = payload.identity().unwrap();
        assert_eq!(identity.ticket_id.as_str(), "T1");
        assert_eq!(identity.owner.as_str(), "0xabc");
    }

    #[test]
    fn test_blank_fields_are_not_identity() {
        let payload: ScanPayload =
            serde_json::from_str(r#"{"ticketId":"  ","eventId":"E1","owner":"0xabc"}"#).unwrap();
        assert!(payload.identity().is_none());
    }

    #[test]
    fn test_empty_object_deserializes() {
        let payload: ScanPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload, ScanPayload::default());
        assert_eq!(payload.timestamp_or_epoch(), 0);
    }

    #[test]
    fn test_fractional_timestamp_is_truncated() {
        let payload: ScanPayload =
            serde_json::from_str(r#"{"ticketId":"T1","timestamp":1735689600000.7}"#).unwrap();
        assert_eq!(payload.timestamp, Some(1_735_689_600_000));

        let payload: ScanPayload = serde_json::from_str(r#"{"timestamp":null}"#).unwrap();
        assert_eq!(payload.timestamp, None);

        assert!(serde_json::from_str::<ScanPayload>(r#"{"timestamp":"soon"}"#).is_err());
    }

    #[test]
    fn test_owner_comparison_ignores_hex_case() {
        assert_eq!(Owner::new("0xAbC"), Owner::new("0xabc"));
        assert_ne!(Owner::new("0xabc"), Owner::new("0xabd"));
    }

    #[test]
    fn test_ticket_serializes_camel_case() {
        let ticket = TicketIdentity::new(
            TicketId::new("TKT-001"),
            EventId::new("E1"),
            7,
            Owner::new("0xabc"),
        )
        .with_event_name("Web3 Developer Conference");

        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["ticketId"], "TKT-001");
        assert_eq!(json["tokenId"], 7);
        assert_eq!(json["checkedIn"], false);
        assert!(json.get("checkedInAt").is_none());
    }
}
