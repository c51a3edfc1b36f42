use serde::{Deserialize, Serialize};

/// Why a span record was dropped instead of inserted. Skips are counted
/// per reason so batch summaries stay inspectable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SkipReason {
    /// One of trace_id, span_id, start_time, end_time was absent.
    MissingFields,
    /// A timestamp was present but unparsable, or end_time precedes
    /// start_time.
    InvalidTime,
    /// `type` was neither "llm" nor "tool".
    UnknownKind,
}

/// Aggregated result of one spans batch. `failed` counts records that
/// normalized cleanly but whose insert errored; those never abort siblings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpanBatchSummary {
    pub llm_inserted: usize,
    pub tool_inserted: usize,
    pub skipped_missing_fields: usize,
    pub skipped_invalid_time: usize,
    pub skipped_unknown_kind: usize,
    pub failed: usize,
}

impl SpanBatchSummary {
    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingFields => self.skipped_missing_fields += 1,
            SkipReason::InvalidTime => self.skipped_invalid_time += 1,
            SkipReason::UnknownKind => self.skipped_unknown_kind += 1,
        }
    }
}

/// Aggregated result of one OTel batch. Failures are counted, never fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OtelBatchSummary {
    pub metrics_inserted: usize,
    pub logs_inserted: usize,
    pub failed: usize,
}

/// Result of one commit ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CommitOutcome {
    Inserted(crate::model::commit::CommitSummary),
    /// The hash was already stored; success without effect.
    Duplicate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_skip_reasons() {
        let mut summary = SpanBatchSummary::default();
        summary.record_skip(SkipReason::MissingFields);
        summary.record_skip(SkipReason::MissingFields);
        summary.record_skip(SkipReason::UnknownKind);
        assert_eq!(summary.skipped_missing_fields, 2);
        assert_eq!(summary.skipped_unknown_kind, 1);
        assert_eq!(summary.skipped_invalid_time, 0);
    }
}
