use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod health;
pub mod scoring;
pub mod sse;

fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
