use crate::database::models::LeaveRequest;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

/// Snapshot of a user's leave balance at request time.
#[derive(Debug, Clone, Copy)]
pub struct LeaveBalance {
    pub allowance_days: i32,
    pub used_days: i32,
    pub pending_days: i32,
}

impl LeaveBalance {
    pub fn remaining(&self) -> i32 {
        self.allowance_days - self.used_days - self.pending_days
    }

    /// Pending requests count against the balance too.
    pub fn can_cover(&self, days: i32) -> bool {
        days <= self.remaining()
    }
}

pub struct LeaveRepository {
    pool: PgPool,
}

impl LeaveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Allowance and used days from the user row plus the sum of still-pending
    /// request days.
    pub async fn balance_for(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LeaveBalance>, sqlx::Error> {
        let row: Option<(i32, i32, i64)> = sqlx::query_as(
            r#"SELECT u.leave_allowance_days,
                      u.leave_used_days,
                      COALESCE((SELECT SUM(day_count) FROM leave_requests
                                WHERE user_id = u.id AND status = 'pending'), 0)
               FROM users u
               WHERE u.tenant_id = $1 AND u.id = $2"#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(allowance_days, used_days, pending)| LeaveBalance {
            allowance_days,
            used_days,
            pending_days: pending as i32,
        }))
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        day_count: i32,
        reason: Option<&str>,
    ) -> Result<LeaveRequest, sqlx::Error> {
        sqlx::query_as::<_, LeaveRequest>(
            r#"INSERT INTO leave_requests
                   (id, tenant_id, user_id, start_date, end_date, day_count, reason, status, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', NOW())
               RETURNING id, tenant_id, user_id, start_date, end_date, day_count, reason,
                         status, decided_by, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(user_id)
        .bind(start_date)
        .bind(end_date)
        .bind(day_count)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<LeaveRequest>, sqlx::Error> {
        sqlx::query_as::<_, LeaveRequest>(
            r#"SELECT id, tenant_id, user_id, start_date, end_date, day_count, reason,
                      status, decided_by, created_at
               FROM leave_requests
               WHERE tenant_id = $1 AND user_id = $2
               ORDER BY created_at DESC"#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<LeaveRequest>, sqlx::Error> {
        sqlx::query_as::<_, LeaveRequest>(
            r#"SELECT id, tenant_id, user_id, start_date, end_date, day_count, reason,
                      status, decided_by, created_at
               FROM leave_requests
               WHERE tenant_id = $1 AND id = $2"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Mark approved and charge the requester's used-days counter in one
    /// transaction. Returns None if the request is not pending anymore.
    pub async fn approve(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        decided_by: Uuid,
    ) -> Result<Option<LeaveRequest>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, LeaveRequest>(
            r#"UPDATE leave_requests SET status = 'approved', decided_by = $3
               WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
               RETURNING id, tenant_id, user_id, start_date, end_date, day_count, reason,
                         status, decided_by, created_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(decided_by)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            return Ok(None);
        };

        sqlx::query("UPDATE users SET leave_used_days = leave_used_days + $2 WHERE id = $1")
            .bind(request.user_id)
            .bind(request.day_count)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(request))
    }

    pub async fn reject(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        decided_by: Uuid,
    ) -> Result<Option<LeaveRequest>, sqlx::Error> {
        sqlx::query_as::<_, LeaveRequest>(
            r#"UPDATE leave_requests SET status = 'rejected', decided_by = $3
               WHERE tenant_id = $1 AND id = $2 AND status = 'pending'
               RETURNING id, tenant_id, user_id, start_date, end_date, day_count, reason,
                         status, decided_by, created_at"#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(decided_by)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_balance() {
        let balance = LeaveBalance {
            allowance_days: 25,
            used_days: 10,
            pending_days: 3,
        };
        assert_eq!(balance.remaining(), 12);
    }

    #[test]
    fn test_over_balance_request_not_covered() {
        let balance = LeaveBalance {
            allowance_days: 25,
            used_days: 20,
            pending_days: 3,
        };
        assert!(balance.can_cover(2));
        assert!(!balance.can_cover(3));

        // Already overdrawn by pending requests
        let overdrawn = LeaveBalance {
            allowance_days: 25,
            used_days: 20,
            pending_days: 10,
        };
        assert!(!overdrawn.can_cover(1));
    }
}
