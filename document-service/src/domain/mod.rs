use shared::pagination::Page;
use shared::types::UserRole;

pub mod attachment;
pub mod department;
pub mod document;
pub mod signature;
pub mod user;

/// The authenticated caller, as seen by visibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i64,
    pub role: UserRole,
}

impl Viewer {
    pub fn sees_everything(&self) -> bool {
        self.role.sees_everything()
    }

    pub fn can_see_user(&self, user_id: i64) -> bool {
        self.sees_everything() || self.user_id == user_id
    }
}

/// `OFFSET` / `LIMIT` of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

impl From<&Page> for Window {
    fn from(page: &Page) -> Self {
        Self {
            offset: i64::try_from(page.offset()).unwrap_or(i64::MAX),
            limit: i64::try_from(page.limit()).unwrap_or(i64::MAX),
        }
    }
}

/// Reads a query flag the way browsers and curl send it (`true`, `1`, `yes`).
pub(crate) fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes")
    )
}

/// Reads a query id, ignoring anything that is not an integer.
pub(crate) fn parse_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}
