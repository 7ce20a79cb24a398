pub mod member;

pub use member::{AuditResult, Member, MemberPage, TwoFactorStatus};
