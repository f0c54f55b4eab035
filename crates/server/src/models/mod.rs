//! Domain models shared across the database, service, and route layers.

pub mod admin_user;
pub mod audit;
pub mod claim;
pub mod claim_file;
pub mod company_info;

pub use admin_user::AdminUser;
pub use audit::{AuditAction, AuditEntry};
pub use claim::{Claim, NewClaim, PublicClaim};
pub use claim_file::{ClaimFile, NewClaimFile};
pub use company_info::CompanyInfo;
