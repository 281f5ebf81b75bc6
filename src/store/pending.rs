//! Pending-action queue: decisions made while offline, kept durable until
//! a flush reconciles them with their profile rows.

use chrono::Utc;
use tracing::debug;

use crate::models::{MatchStatus, PendingAction};

use super::{ProfileStore, StoreError};

const SQL_ENQUEUE: &str = r#"
INSERT INTO pending_actions (user_id, status, created_at)
VALUES (?1, ?2, ?3)
"#;

const SQL_ALL_PENDING: &str = r#"
SELECT id, user_id, status, created_at
FROM pending_actions
ORDER BY created_at ASC, id ASC
"#;

const SQL_APPLY_STATUS: &str = "UPDATE profiles SET status = ?1 WHERE id = ?2";

const SQL_DELETE_ACTION: &str = "DELETE FROM pending_actions WHERE id = ?1";

const SQL_PENDING_COUNT: &str = "SELECT COUNT(*) FROM pending_actions";

impl ProfileStore {
    /// Queue a decision for later reconciliation. Durable immediately;
    /// rows are never updated in place.
    pub async fn enqueue(&self, user_id: &str, status: MatchStatus) -> Result<(), StoreError> {
        sqlx::query(SQL_ENQUEUE)
            .bind(user_id)
            .bind(status)
            .bind(Utc::now())
            .execute(self.pool())
            .await?;

        debug!(user_id, %status, "Queued offline decision");
        Ok(())
    }

    /// Apply every queued decision to its profile and drop the queue, all
    /// in one transaction.
    ///
    /// An action whose profile no longer exists is discarded rather than
    /// retried. If the commit fails nothing is deleted or written, so the
    /// whole batch replays on the next connectivity transition.
    ///
    /// Returns the number of decisions that reached a profile row.
    pub async fn flush_pending(&self) -> Result<u64, StoreError> {
        let mut tx = self.pool().begin().await?;

        let actions = sqlx::query_as::<_, PendingAction>(SQL_ALL_PENDING)
            .fetch_all(&mut *tx)
            .await?;

        let mut applied = 0;
        for action in &actions {
            let result = sqlx::query(SQL_APPLY_STATUS)
                .bind(action.status)
                .bind(&action.user_id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() > 0 {
                applied += 1;
            } else {
                debug!(user_id = %action.user_id, "Discarding action for missing profile");
            }

            sqlx::query(SQL_DELETE_ACTION)
                .bind(action.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(total = actions.len(), applied, "Flushed pending actions");
        Ok(applied)
    }

    pub async fn pending_actions(&self) -> Result<Vec<PendingAction>, StoreError> {
        let actions = sqlx::query_as::<_, PendingAction>(SQL_ALL_PENDING)
            .fetch_all(self.pool())
            .await?;
        Ok(actions)
    }

    pub async fn pending_count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(SQL_PENDING_COUNT)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
