//! Core domain types.

pub mod claim_number;
pub mod email;
pub mod id;
pub mod status;

pub use claim_number::{ClaimNumber, ClaimNumberError};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::{
    AdminRole, ClaimStatus, ClaimType, Currency, DocumentType, InvalidEnumValue,
    ProductServiceType, StorageKind, UploadType,
};
