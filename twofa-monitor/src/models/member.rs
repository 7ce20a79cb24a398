use serde::Deserialize;

/// Two-step verification state of a member as reported by the API.
///
/// The API encodes this as an optional boolean; `null` and a missing field
/// both become [`TwoFactorStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoFactorStatus {
    Enabled,
    Disabled,
    Unknown,
}

impl TwoFactorStatus {
    /// Whether a member in this state belongs on the alert list.
    ///
    /// Unknown is treated like disabled: accounts that never set the flag are
    /// not assumed to be protected.
    pub fn is_at_risk(self) -> bool {
        match self {
            TwoFactorStatus::Enabled => false,
            TwoFactorStatus::Disabled | TwoFactorStatus::Unknown => true,
        }
    }
}

impl From<Option<bool>> for TwoFactorStatus {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => TwoFactorStatus::Enabled,
            Some(false) => TwoFactorStatus::Disabled,
            None => TwoFactorStatus::Unknown,
        }
    }
}

impl std::fmt::Display for TwoFactorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TwoFactorStatus::Enabled => write!(f, "enabled"),
            TwoFactorStatus::Disabled => write!(f, "disabled"),
            TwoFactorStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub display_name: String,
    /// Short account handle (the API's `nickname`).
    pub handle: String,
    pub two_factor: TwoFactorStatus,
}

/// One decoded page of the workspace member listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPage {
    pub members: Vec<Member>,
    /// Number of entries the server says are on this page.
    pub reported_size: u32,
}

#[derive(Debug, Deserialize)]
struct PageDocument {
    #[serde(default)]
    values: Option<Vec<MembershipDocument>>,
    size: u32,
}

#[derive(Debug, Deserialize)]
struct MembershipDocument {
    user: UserDocument,
}

#[derive(Debug, Deserialize)]
struct UserDocument {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    has_2fa_enabled: Option<bool>,
}

impl From<UserDocument> for Member {
    fn from(user: UserDocument) -> Self {
        Self {
            display_name: user.display_name,
            handle: user.nickname,
            two_factor: user.has_2fa_enabled.into(),
        }
    }
}

impl MemberPage {
    /// Decode a page from the raw JSON response body.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let document: PageDocument = serde_json::from_slice(body)?;

        Ok(Self {
            members: document
                .values
                .unwrap_or_default()
                .into_iter()
                .map(|membership| Member::from(membership.user))
                .collect(),
            reported_size: document.size,
        })
    }

    /// Members on this page that need to enable two-step verification, in page order.
    pub fn at_risk_members(self) -> impl Iterator<Item = Member> {
        self.members
            .into_iter()
            .filter(|member| member.two_factor.is_at_risk())
    }
}

/// Flagged members across every page, in page order then in-page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditResult {
    members: Vec<Member>,
}

impl AuditResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Member> {
        self.members.iter()
    }

    pub fn into_members(self) -> Vec<Member> {
        self.members
    }
}

impl Extend<Member> for AuditResult {
    fn extend<I: IntoIterator<Item = Member>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

impl From<Vec<Member>> for AuditResult {
    fn from(members: Vec<Member>) -> Self {
        Self { members }
    }
}

impl<'a> IntoIterator for &'a AuditResult {
    type Item = &'a Member;
    type IntoIter = std::slice::Iter<'a, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
