//! Version-independent models and their per-version wire mappings

pub mod audit;
pub mod barcode;
pub mod drink;
pub mod server_info;
pub mod user;
pub mod wire;

// Re-export for convenience
pub use audit::{Audit, AuditFilter, AuditInfo};
pub use barcode::Barcode;
pub use drink::{Drink, MISSING_DRINK};
pub use server_info::{ProductDefaults, ServerInfo};
pub use user::User;
