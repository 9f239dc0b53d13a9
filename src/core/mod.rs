//! Core business logic - calendar, money, billing, allocation, and storage operations.
//!
//! Nothing in here knows about Discord. The bot layer calls these functions and
//! formats what they return.

/// Bulk payment allocation and surplus handling
pub mod allocation;
/// Bill persistence, lookups, and the submission workflow
pub mod bill;
/// Pure multi-month bill calculation
pub mod billing;
/// The 12-month calendar, billing periods, and accepted years
pub mod calendar;
/// Rounding, minor units, and payment status
pub mod money;
/// Plain-text statements
pub mod statement;
/// Tenant management
pub mod tenant;
