pub mod auditor;
pub mod dispatcher;
pub mod members_api;
pub mod metrics;
pub mod providers;
pub mod report;

pub use auditor::{AuditError, MemberAuditor, DEFAULT_MAX_PAGES, PAGE_SIZE};
pub use dispatcher::{DispatchError, DispatchOutcome, NotificationDispatcher};
pub use members_api::{MembersApi, MembersEndpoint, PageSource};
pub use providers::{
    EmailMessage, EmailProvider, MockEmailProvider, ProviderError, ProviderResponse, SmtpProvider,
};
pub use report::AlertReport;
