//! Locally cached profile records and their presentation projection.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User decision on a profile. Set only by an explicit accept/decline;
/// a remote merge never touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[repr(i32)]
pub enum MatchStatus {
    #[default]
    Undecided = 0,
    Accepted = 1,
    Declined = 2,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Undecided => write!(f, "undecided"),
            MatchStatus::Accepted => write!(f, "accepted"),
            MatchStatus::Declined => write!(f, "declined"),
        }
    }
}

/// One row of the `profiles` table. `id` is the remote feed's stable uuid.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i64,
    pub city: String,
    pub state: String,
    pub country: String,
    pub picture_url: String,
    /// Page the record was last refreshed on; drives pagination resume.
    pub fetched_page: i64,
    /// Set once at first insertion, untouched by later merges.
    pub created_at: DateTime<Utc>,
    pub status: MatchStatus,
}

/// A decision made while offline, waiting to be applied to its profile.
#[derive(Debug, Clone, FromRow)]
pub struct PendingAction {
    pub id: i64,
    pub user_id: String,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

/// Read-optimized projection entry handed to the presentation layer.
/// Disposable copy; the store stays the source of truth.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCard {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i64,
    pub city: String,
    pub state: String,
    pub country: String,
    pub picture_url: String,
    pub status: MatchStatus,
}

impl ProfileCard {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<ProfileRecord> for ProfileCard {
    fn from(record: ProfileRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            age: record.age,
            city: record.city,
            state: record.state,
            country: record.country,
            picture_url: record.picture_url,
            status: record.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_undecided() {
        assert_eq!(MatchStatus::default(), MatchStatus::Undecided);
    }

    #[test]
    fn test_card_display_name() {
        let card = ProfileCard {
            id: "x".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: String::new(),
            age: 35,
            city: String::new(),
            state: String::new(),
            country: String::new(),
            picture_url: String::new(),
            status: MatchStatus::Undecided,
        };
        assert_eq!(card.display_name(), "Ada Lovelace");
    }
}
