use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rendered reminder ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderMessage {
    pub booking_id: Uuid,
    pub business_id: Uuid,
    pub customer_id: Uuid,
    pub body: String,
}

/// Outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub dispatched: u32,
    pub failed: u32,
    /// Candidates another sweep claimed first.
    pub skipped: u32,
}

impl SweepReport {
    pub fn merge(&mut self, other: SweepReport) {
        self.dispatched += other.dispatched;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}
