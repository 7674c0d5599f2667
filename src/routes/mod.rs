//! Router Module Index
//!
//! Routes are grouped by audience. The staff gate itself is the `StaffUser` extractor
//! that every staff and admin handler takes.

/// Routes accessible to everyone (anonymous, read-only).
pub mod public;

/// Employee mutation routes. Every handler requires `StaffUser`.
pub mod staff;

/// Department administration, nested under `/admin`. Every handler requires `StaffUser`.
pub mod admin;
