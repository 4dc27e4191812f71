//! 도메인 모델.

pub mod identity;
pub mod ownership;
pub mod role;
pub mod subject;

pub use identity::VerifiedIdentity;
pub use ownership::OwnershipTag;
pub use role::Role;
pub use subject::{Subject, SubjectPatch, SubjectProfile};
