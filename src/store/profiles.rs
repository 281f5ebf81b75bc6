//! Profile table operations.

use chrono::Utc;
use tracing::debug;

use crate::models::{MatchStatus, ProfileRecord, RemoteProfile};

use super::{ProfileStore, StoreError};

// status and created_at are deliberately absent from the UPDATE arm:
// they belong to the local record, never to a remote merge.
const SQL_UPSERT_PROFILE: &str = r#"
INSERT INTO profiles (
  id, first_name, last_name, email, age,
  city, state, country, picture_url,
  fetched_page, created_at, status
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
ON CONFLICT(id) DO UPDATE SET
  first_name   = excluded.first_name,
  last_name    = excluded.last_name,
  email        = excluded.email,
  age          = excluded.age,
  city         = excluded.city,
  state        = excluded.state,
  country      = excluded.country,
  picture_url  = excluded.picture_url,
  fetched_page = excluded.fetched_page
"#;

// rowid tiebreak keeps insertion order stable when a whole page shares one
// created_at second.
const SQL_ALL_PROFILES: &str = r#"
SELECT
  id, first_name, last_name, email, age,
  city, state, country, picture_url,
  fetched_page, created_at, status
FROM profiles
ORDER BY created_at ASC, rowid ASC
"#;

const SQL_PROFILE_BY_ID: &str = r#"
SELECT
  id, first_name, last_name, email, age,
  city, state, country, picture_url,
  fetched_page, created_at, status
FROM profiles
WHERE id = ?1
"#;

const SQL_MAX_FETCHED_PAGE: &str = "SELECT COALESCE(MAX(fetched_page), 0) FROM profiles";

const SQL_WRITE_STATUS: &str = "UPDATE profiles SET status = ?1 WHERE id = ?2";

const SQL_CLEAR_PROFILES: &str = "DELETE FROM profiles";

impl ProfileStore {
    /// Merge one remote page into the table as a single transaction.
    ///
    /// Unseen ids are inserted with status Undecided and `created_at` set
    /// once; known ids get every non-status field and `fetched_page`
    /// refreshed. On any failure the whole page rolls back - no partial
    /// page ever persists.
    pub async fn upsert_page(
        &self,
        profiles: &[RemoteProfile],
        page: i64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool().begin().await?;
        let now = Utc::now();

        for profile in profiles {
            sqlx::query(SQL_UPSERT_PROFILE)
                .bind(&profile.login.uuid)
                .bind(&profile.name.first)
                .bind(&profile.name.last)
                .bind(&profile.email)
                .bind(profile.dob.age)
                .bind(&profile.location.city)
                .bind(&profile.location.state)
                .bind(&profile.location.country)
                .bind(&profile.picture.large)
                .bind(page)
                .bind(now)
                .bind(MatchStatus::Undecided)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(count = profiles.len(), page, "Merged profile page");
        Ok(())
    }

    /// All cached profiles, stable fetch order.
    pub async fn all_profiles(&self) -> Result<Vec<ProfileRecord>, StoreError> {
        let records = sqlx::query_as::<_, ProfileRecord>(SQL_ALL_PROFILES)
            .fetch_all(self.pool())
            .await?;
        Ok(records)
    }

    pub async fn profile(&self, id: &str) -> Result<Option<ProfileRecord>, StoreError> {
        let record = sqlx::query_as::<_, ProfileRecord>(SQL_PROFILE_BY_ID)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(record)
    }

    /// Highest page any record was refreshed on, 0 when empty. Used to
    /// resume pagination after a restart.
    pub async fn max_fetched_page(&self) -> Result<i64, StoreError> {
        let page = sqlx::query_scalar::<_, i64>(SQL_MAX_FETCHED_PAGE)
            .fetch_one(self.pool())
            .await?;
        Ok(page)
    }

    /// Record a user decision on a single profile.
    pub async fn write_status(&self, id: &str, status: MatchStatus) -> Result<(), StoreError> {
        let result = sqlx::query(SQL_WRITE_STATUS)
            .bind(status)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProfileNotFound(id.to_string()));
        }

        debug!(id, %status, "Persisted status");
        Ok(())
    }

    /// Delete every cached profile.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        sqlx::query(SQL_CLEAR_PROFILES).execute(self.pool()).await?;
        debug!("Cleared all profiles");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testutil::remote_profile;

    #[tokio::test]
    async fn test_first_upsert_defaults_to_undecided() {
        let store = ProfileStore::in_memory().await.unwrap();
        store.upsert_page(&[remote_profile("a")], 1).await.unwrap();

        let record = store.profile("a").await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Undecided);
        assert_eq!(record.fetched_page, 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_preserves_status() {
        let store = ProfileStore::in_memory().await.unwrap();
        store.upsert_page(&[remote_profile("a")], 1).await.unwrap();
        let first = store.profile("a").await.unwrap().unwrap();

        store.write_status("a", MatchStatus::Accepted).await.unwrap();

        let mut refreshed = remote_profile("a");
        refreshed.email = "new@example.com".to_string();
        refreshed.location.city = "Oslo".to_string();
        store.upsert_page(&[refreshed], 2).await.unwrap();

        let records = store.all_profiles().await.unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.email, "new@example.com");
        assert_eq!(record.city, "Oslo");
        assert_eq!(record.fetched_page, 2);
        // The decision and first-seen timestamp survive the merge.
        assert_eq!(record.status, MatchStatus::Accepted);
        assert_eq!(record.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_all_profiles_keeps_fetch_order() {
        let store = ProfileStore::in_memory().await.unwrap();
        store
            .upsert_page(&[remote_profile("a"), remote_profile("b")], 1)
            .await
            .unwrap();
        store.upsert_page(&[remote_profile("c")], 2).await.unwrap();

        let ids: Vec<String> = store
            .all_profiles()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_max_fetched_page() {
        let store = ProfileStore::in_memory().await.unwrap();
        assert_eq!(store.max_fetched_page().await.unwrap(), 0);

        store.upsert_page(&[remote_profile("a")], 1).await.unwrap();
        store.upsert_page(&[remote_profile("b")], 3).await.unwrap();
        assert_eq!(store.max_fetched_page().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_write_status_unknown_id_is_not_found() {
        let store = ProfileStore::in_memory().await.unwrap();
        let err = store
            .write_status("ghost", MatchStatus::Declined)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn test_clear_all_empties_the_table() {
        let store = ProfileStore::in_memory().await.unwrap();
        store
            .upsert_page(&[remote_profile("a"), remote_profile("b")], 2)
            .await
            .unwrap();

        store.clear_all().await.unwrap();

        assert!(store.all_profiles().await.unwrap().is_empty());
        assert_eq!(store.max_fetched_page().await.unwrap(), 0);
    }
}
