//! Bitbucket workspace membership listing.

use async_trait::async_trait;
use monitor_core::http::{ApiClient, HttpError, Url};

/// Sparse field selection so pages stay small at 500 entries.
pub const MEMBER_FIELDS: &str =
    "size,values.user.display_name,values.user.nickname,values.user.has_2fa_enabled";

/// Source of raw member pages, 1-based.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<u8>, HttpError>;
}

/// Fully resolved members listing URL for one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembersEndpoint {
    url: Url,
}

impl MembersEndpoint {
    /// Resolve `{base_url}/2.0/workspaces/{workspace}/members`.
    ///
    /// The workspace is inserted as a single path segment, so it is
    /// percent-encoded rather than able to alter the path.
    pub fn new(base_url: &str, workspace: &str) -> Result<Self, anyhow::Error> {
        if workspace.trim().is_empty() {
            anyhow::bail!("workspace must not be empty");
        }

        let mut url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("invalid API base URL {:?}: {}", base_url, e))?;

        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL {:?} cannot have a path", base_url))?
            .pop_if_empty()
            .extend(["2.0", "workspaces", workspace, "members"]);

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Display for MembersEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// [`PageSource`] backed by the Bitbucket REST API.
#[derive(Clone)]
pub struct MembersApi {
    client: ApiClient,
    endpoint: MembersEndpoint,
}

impl MembersApi {
    pub fn new(client: ApiClient, endpoint: MembersEndpoint) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &MembersEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl PageSource for MembersApi {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<u8>, HttpError> {
        let query = [
            ("fields", MEMBER_FIELDS.to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];

        self.client.get_bytes(self.endpoint.url(), &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_resolves_workspace_path() {
        let endpoint = MembersEndpoint::new("https://api.bitbucket.org", "acme").unwrap();
        assert_eq!(
            endpoint.url().as_str(),
            "https://api.bitbucket.org/2.0/workspaces/acme/members"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_and_prefix() {
        let endpoint = MembersEndpoint::new("http://proxy.local/bitbucket/", "acme").unwrap();
        assert_eq!(
            endpoint.to_string(),
            "http://proxy.local/bitbucket/2.0/workspaces/acme/members"
        );
    }

    #[test]
    fn endpoint_encodes_workspace_segment() {
        let endpoint = MembersEndpoint::new("https://api.bitbucket.org", "a/b").unwrap();
        assert_eq!(
            endpoint.url().path(),
            "/2.0/workspaces/a%2Fb/members"
        );
    }

    #[test]
    fn endpoint_rejects_bad_input() {
        assert!(MembersEndpoint::new("not a url", "acme").is_err());
        assert!(MembersEndpoint::new("https://api.bitbucket.org", "  ").is_err());
        assert!(MembersEndpoint::new("mailto:ops@example.com", "acme").is_err());
    }
}
