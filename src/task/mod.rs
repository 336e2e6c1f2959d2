//! Background tasks driving the periodic notification and maintenance
//! cycles.

pub mod listing_maintenance;
pub mod notification_cycle;
