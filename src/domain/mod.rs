//! Domain layer: entities, validation rules, and data access traits.

pub mod entities;
pub mod redemption;
pub mod repositories;
pub mod usage_event;
pub mod usage_worker;
