//! Exhaustive audit of the workspace member listing.
//!
//! Pages are fetched one at a time until the server returns a page smaller
//! than requested. Any failure discards everything gathered so far: a failed
//! audit means "state unknown", never "nobody flagged".

use crate::models::{AuditResult, MemberPage};
use crate::services::members_api::PageSource;
use crate::services::metrics::{record_flagged_members, record_page_fetch};
use monitor_core::http::HttpError;
use thiserror::Error;

/// Entries requested per page.
pub const PAGE_SIZE: u32 = 500;

/// Default cap on pages visited before giving up on a server that never
/// returns a short page.
pub const DEFAULT_MAX_PAGES: u32 = 1000;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("error fetching page {page}")]
    Transport {
        page: u32,
        #[source]
        source: HttpError,
    },

    #[error("error decoding workspace members on page {page}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("pagination did not terminate after {max_pages} pages")]
    PaginationNonTermination { max_pages: u32 },
}

impl AuditError {
    /// Page the audit failed on, if the failure is tied to one.
    pub fn page(&self) -> Option<u32> {
        match self {
            AuditError::Transport { page, .. } | AuditError::Decode { page, .. } => Some(*page),
            AuditError::PaginationNonTermination { .. } => None,
        }
    }
}

pub struct MemberAuditor<S> {
    source: S,
    page_size: u32,
    max_pages: u32,
}

impl<S: PageSource> MemberAuditor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            page_size: PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Walk every page and collect the members lacking two-step verification.
    #[tracing::instrument(skip(self), fields(page_size = self.page_size, max_pages = self.max_pages))]
    pub async fn fetch_all(&self) -> Result<AuditResult, AuditError> {
        let mut aggregate = AuditResult::new();

        for page in 1..=self.max_pages {
            let body = self
                .source
                .fetch_page(page, self.page_size)
                .await
                .map_err(|source| AuditError::Transport { page, source })?;

            let members = MemberPage::from_json(&body)
                .map_err(|source| AuditError::Decode { page, source })?;
            let reported_size = members.reported_size;
            let before = aggregate.len();

            aggregate.extend(members.at_risk_members());
            record_page_fetch();

            tracing::debug!(
                page,
                reported_size,
                flagged = aggregate.len() - before,
                "Fetched workspace members page"
            );

            if reported_size < self.page_size {
                tracing::info!(
                    pages = page,
                    flagged = aggregate.len(),
                    "Workspace member audit complete"
                );
                record_flagged_members(aggregate.len());
                return Ok(aggregate);
            }
        }

        tracing::error!(max_pages = self.max_pages, "Member pagination never reached a short page");
        Err(AuditError::PaginationNonTermination {
            max_pages: self.max_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TwoFactorStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves canned pages and records which page numbers were requested.
    struct ScriptedPages {
        pages: Vec<Result<String, u16>>,
        requested: Mutex<Vec<(u32, u32)>>,
    }

    impl ScriptedPages {
        fn new(pages: Vec<Result<String, u16>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested_pages(&self) -> Vec<u32> {
            self.requested.lock().unwrap().iter().map(|(p, _)| *p).collect()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedPages {
        async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<u8>, HttpError> {
            self.requested.lock().unwrap().push((page, per_page));
            match self.pages.get(page as usize - 1) {
                Some(Ok(body)) => Ok(body.clone().into_bytes()),
                Some(Err(status)) => Err(HttpError::Status {
                    url: format!("http://test/members?page={page}"),
                    status: *status,
                    body: "boom".to_string(),
                }),
                None => Ok(page_json(&[], 0).into_bytes()),
            }
        }
    }

    /// Always claims a full page, never terminating on its own.
    struct EndlessPages;

    #[async_trait]
    impl PageSource for EndlessPages {
        async fn fetch_page(&self, _page: u32, per_page: u32) -> Result<Vec<u8>, HttpError> {
            Ok(page_json(&[], per_page).into_bytes())
        }
    }

    fn user(name: &str, flag: Option<bool>) -> String {
        let flag = match flag {
            Some(value) => format!(",\"has_2fa_enabled\":{value}"),
            None => String::new(),
        };
        format!(r#"{{"user":{{"display_name":"{name}","nickname":"{name}"{flag}}}}}"#)
    }

    fn page_json(users: &[String], size: u32) -> String {
        format!(r#"{{"values":[{}],"size":{}}}"#, users.join(","), size)
    }

    /// A full page whose members are all enabled except those listed.
    fn full_page(prefix: &str, flagged: &[usize]) -> String {
        let users: Vec<String> = (0..PAGE_SIZE as usize)
            .map(|i| {
                let flag = if flagged.contains(&i) { Some(false) } else { Some(true) };
                user(&format!("{prefix}{i}"), flag)
            })
            .collect();
        page_json(&users, PAGE_SIZE)
    }

    fn handles(result: &AuditResult) -> Vec<String> {
        result.iter().map(|m| m.handle.clone()).collect()
    }

    #[tokio::test]
    async fn single_short_page_flags_null_and_skips_enabled() {
        let source = ScriptedPages::new(vec![Ok(page_json(
            &[user("member1", None), user("member2", Some(true))],
            2,
        ))]);
        let auditor = MemberAuditor::new(source);

        let result = auditor.fetch_all().await.unwrap();

        assert_eq!(handles(&result), vec!["member1"]);
        assert_eq!(result.members()[0].two_factor, TwoFactorStatus::Unknown);
        assert_eq!(auditor.source().requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn all_three_states_on_one_page() {
        let source = ScriptedPages::new(vec![Ok(page_json(
            &[
                user("off", Some(false)),
                user("on", Some(true)),
                user("absent", None),
            ],
            3,
        ))]);

        let result = MemberAuditor::new(source).fetch_all().await.unwrap();

        assert_eq!(handles(&result), vec!["off", "absent"]);
    }

    #[tokio::test]
    async fn requests_fixed_page_size() {
        let source = ScriptedPages::new(vec![Ok(page_json(&[], 0))]);
        let auditor = MemberAuditor::new(source);

        auditor.fetch_all().await.unwrap();

        let requested = auditor.source().requested.lock().unwrap().clone();
        assert_eq!(requested, vec![(1, PAGE_SIZE)]);
    }

    #[tokio::test]
    async fn multi_page_preserves_page_then_in_page_order() {
        let source = ScriptedPages::new(vec![
            Ok(full_page("p1-", &[3, 1])),
            Ok(full_page("p2-", &[499])),
            Ok(page_json(
                &[user("p3-a", None), user("p3-b", Some(true)), user("p3-c", Some(false))],
                3,
            )),
        ]);
        let auditor = MemberAuditor::new(source);

        let result = auditor.fetch_all().await.unwrap();

        assert_eq!(
            handles(&result),
            vec!["p1-1", "p1-3", "p2-499", "p3-a", "p3-c"]
        );
        assert_eq!(auditor.source().requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn exact_multiple_needs_one_trailing_empty_page() {
        let source = ScriptedPages::new(vec![Ok(full_page("p1-", &[0])), Ok(page_json(&[], 0))]);
        let auditor = MemberAuditor::new(source);

        let result = auditor.fetch_all().await.unwrap();

        assert_eq!(handles(&result), vec!["p1-0"]);
        assert_eq!(auditor.source().requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn failing_page_discards_partial_results() {
        let source = ScriptedPages::new(vec![
            Ok(full_page("p1-", &[0, 1, 2])),
            Err(502),
            Ok(page_json(&[user("never", None)], 1)),
        ]);
        let auditor = MemberAuditor::new(source);

        let err = auditor.fetch_all().await.unwrap_err();

        assert!(matches!(err, AuditError::Transport { page: 2, .. }));
        assert_eq!(err.page(), Some(2));
        assert!(err.to_string().starts_with("error fetching page 2"));
        assert_eq!(auditor.source().requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn undecodable_page_is_a_decode_error() {
        let source = ScriptedPages::new(vec![Ok("<html>maintenance</html>".to_string())]);

        let err = MemberAuditor::new(source).fetch_all().await.unwrap_err();

        assert!(matches!(err, AuditError::Decode { page: 1, .. }));
    }

    #[tokio::test]
    async fn undecodable_later_page_discards_earlier_pages() {
        let source = ScriptedPages::new(vec![
            Ok(full_page("p1-", &[0, 1])),
            Ok("not json".to_string()),
            Ok(page_json(&[user("never", None)], 1)),
        ]);
        let auditor = MemberAuditor::new(source);

        let err = auditor.fetch_all().await.unwrap_err();

        assert!(matches!(err, AuditError::Decode { page: 2, .. }));
        assert_eq!(err.to_string(), "error decoding workspace members on page 2");
        assert_eq!(auditor.source().requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn runaway_pagination_hits_the_cap() {
        let auditor = MemberAuditor::new(EndlessPages).with_max_pages(5);

        let err = auditor.fetch_all().await.unwrap_err();

        assert!(matches!(
            err,
            AuditError::PaginationNonTermination { max_pages: 5 }
        ));
        assert_eq!(err.page(), None);
    }

    #[tokio::test]
    async fn repeated_audits_are_identical() {
        let source = ScriptedPages::new(vec![
            Ok(full_page("p1-", &[7, 42])),
            Ok(page_json(&[user("tail", Some(false))], 1)),
        ]);
        let auditor = MemberAuditor::new(source);

        let first = auditor.fetch_all().await.unwrap();
        let second = auditor.fetch_all().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(handles(&first), vec!["p1-7", "p1-42", "tail"]);
    }

    #[test]
    fn max_pages_is_at_least_one() {
        let auditor = MemberAuditor::new(EndlessPages).with_max_pages(0);
        assert_eq!(auditor.max_pages(), 1);
    }
}
