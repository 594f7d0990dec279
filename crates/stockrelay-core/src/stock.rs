//! Stock change event and its JSON wire format.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::DecodeError;

/// Layout of timestamps as produced by the branch database. Fractional
/// seconds are optional; no zone designator, always UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Layout used when encoding, fixed at microsecond precision.
const ENCODED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A mutation of one product's stock in one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStockChange")]
pub struct StockChangeEvent {
    /// Opaque row identifier.
    pub id: String,
    /// Product identifier.
    pub product_id: i64,
    /// Branch identifier.
    pub branch_id: i64,
    /// Current on-hand quantity.
    pub quantity: i64,
    /// Quantity reserved against open orders.
    pub reserved: i64,
    /// Row creation time.
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Notification body before timestamp parsing. Absent and `null` fields
/// take their zero value, so a missing timestamp surfaces as a timestamp
/// error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStockChange {
    id: Option<String>,
    product_id: Option<i64>,
    branch_id: Option<i64>,
    quantity: Option<i64>,
    reserved: Option<i64>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl TryFrom<RawStockChange> for StockChangeEvent {
    type Error = DecodeError;

    fn try_from(raw: RawStockChange) -> Result<Self, Self::Error> {
        let created_at = parse_timestamp("created_at", &raw.created_at.unwrap_or_default())?;
        let updated_at = parse_timestamp("updated_at", &raw.updated_at.unwrap_or_default())?;

        Ok(Self {
            id: raw.id.unwrap_or_default(),
            product_id: raw.product_id.unwrap_or_default(),
            branch_id: raw.branch_id.unwrap_or_default(),
            quantity: raw.quantity.unwrap_or_default(),
            reserved: raw.reserved.unwrap_or_default(),
            created_at,
            updated_at,
        })
    }
}

impl StockChangeEvent {
    /// Decodes one notification body.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::Malformed` for invalid JSON or mistyped fields,
    /// and `DecodeError::BadTimestamp` when either timestamp does not match
    /// [`TIMESTAMP_FORMAT`].
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let wire: RawStockChange = serde_json::from_str(raw)?;
        Self::try_from(wire)
    }

    /// Encodes the event as compact JSON, timestamps at microsecond
    /// precision.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; not expected for this type.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, DecodeError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| DecodeError::BadTimestamp {
            field,
            value: value.to_owned(),
            source,
        })
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&timestamp.format(ENCODED_TIMESTAMP_FORMAT))
}
