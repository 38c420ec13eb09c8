//! Per-transaction execution context.

use chrono::{DateTime, SecondsFormat, Utc};

/// What the runtime asserts about one transaction.
///
/// Every value here comes from the execution runtime, never from the
/// request payload: the caller identity is the authenticated submitter,
/// the transaction id is unique per transaction, and the timestamp is the
/// one agreed for the transaction, so that every node executing it derives
/// the same record bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    caller: String,
    tx_id: String,
    timestamp: DateTime<Utc>,
}

impl TxContext {
    /// Creates a context.
    pub fn new(
        caller: impl Into<String>,
        tx_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            caller: caller.into(),
            tx_id: tx_id.into(),
            timestamp,
        }
    }

    /// Asserted identity of the submitter.
    #[must_use]
    pub fn caller(&self) -> &str {
        &self.caller
    }

    /// Unique transaction identifier.
    #[must_use]
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Transaction timestamp.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Transaction timestamp as stored in records: RFC 3339, UTC, millis.
    #[must_use]
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_format_is_fixed() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let ctx = TxContext::new("Org1MSP", "tx-1", ts);
        assert_eq!(ctx.timestamp_string(), "2025-03-14T09:26:53.000Z");
        assert_eq!(ctx.caller(), "Org1MSP");
        assert_eq!(ctx.tx_id(), "tx-1");
    }
}
