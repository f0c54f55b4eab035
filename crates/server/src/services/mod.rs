//! Service layer: storage, rendering, email, caching, and the submission
//! pipeline that ties them together.

pub mod company;
pub mod email;
pub mod pdf;
pub mod storage;
pub mod submission;
