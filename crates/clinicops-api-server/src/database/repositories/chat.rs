use crate::database::models::{
    perm, ChatChannel, ChatMember, ChatMessageRow, ChatRole, ChatServer, ChatThread, DmChannel,
};
use rand::distr::{Alphanumeric, SampleString};
use sqlx::PgPool;
use uuid::Uuid;

/// Normalize a DM pair so (a, b) and (b, a) hit the same row.
pub fn dm_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn new_invite_code() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}

pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Servers

    /// Server plus built-in roles, a default `general` channel, and the
    /// owner's membership, created atomically.
    pub async fn create_server(
        &self,
        tenant_id: Uuid,
        name: &str,
        owner_id: Uuid,
    ) -> Result<(ChatServer, ChatChannel), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let server = sqlx::query_as::<_, ChatServer>(
            r#"INSERT INTO chat_servers (id, tenant_id, name, owner_id, invite_code, created_at)
               VALUES ($1, $2, $3, $4, $5, NOW())
               RETURNING id, tenant_id, name, owner_id, invite_code, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(name)
        .bind(owner_id)
        .bind(new_invite_code())
        .fetch_one(&mut *tx)
        .await?;

        let owner_role_id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO chat_roles (id, server_id, name, permissions, built_in)
               VALUES ($1, $2, 'owner', $3, TRUE), ($4, $2, 'member', $5, TRUE)"#,
        )
        .bind(owner_role_id)
        .bind(server.id)
        .bind(perm::ALL)
        .bind(Uuid::new_v4())
        .bind(perm::MEMBER_DEFAULT)
        .execute(&mut *tx)
        .await?;

        let general = sqlx::query_as::<_, ChatChannel>(
            r#"INSERT INTO chat_channels (id, server_id, name, kind, created_at)
               VALUES ($1, $2, 'general', 'text', NOW())
               RETURNING id, server_id, name, kind, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(server.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"INSERT INTO chat_members (server_id, user_id, role_id, joined_at)
               VALUES ($1, $2, $3, NOW())"#,
        )
        .bind(server.id)
        .bind(owner_id)
        .bind(owner_role_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((server, general))
    }

    pub async fn list_servers_for(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<ChatServer>, sqlx::Error> {
        sqlx::query_as::<_, ChatServer>(
            r#"SELECT s.id, s.tenant_id, s.name, s.owner_id, s.invite_code, s.created_at
               FROM chat_servers s
               JOIN chat_members m ON m.server_id = s.id
               WHERE s.tenant_id = $1 AND m.user_id = $2
               ORDER BY s.created_at"#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_server(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ChatServer>, sqlx::Error> {
        sqlx::query_as::<_, ChatServer>(
            r#"SELECT id, tenant_id, name, owner_id, invite_code, created_at
               FROM chat_servers WHERE tenant_id = $1 AND id = $2"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn server_by_invite(
        &self,
        tenant_id: Uuid,
        code: &str,
    ) -> Result<Option<ChatServer>, sqlx::Error> {
        sqlx::query_as::<_, ChatServer>(
            r#"SELECT id, tenant_id, name, owner_id, invite_code, created_at
               FROM chat_servers WHERE tenant_id = $1 AND invite_code = $2"#,
        )
        .bind(tenant_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }

    // Membership

    pub async fn membership(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ChatMember>, sqlx::Error> {
        sqlx::query_as::<_, ChatMember>(
            r#"SELECT server_id, user_id, role_id, joined_at
               FROM chat_members WHERE server_id = $1 AND user_id = $2"#,
        )
        .bind(server_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Permission bits of the member's role, None when not a member.
    pub async fn member_permissions(
        &self,
        server_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT r.permissions
               FROM chat_members m
               JOIN chat_roles r ON r.id = m.role_id
               WHERE m.server_id = $1 AND m.user_id = $2"#,
        )
        .bind(server_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn add_member(
        &self,
        server_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<ChatMember, sqlx::Error> {
        sqlx::query_as::<_, ChatMember>(
            r#"INSERT INTO chat_members (server_id, user_id, role_id, joined_at)
               VALUES ($1, $2, $3, NOW())
               RETURNING server_id, user_id, role_id, joined_at"#,
        )
        .bind(server_id)
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn assign_role(
        &self,
        server_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<Option<ChatMember>, sqlx::Error> {
        sqlx::query_as::<_, ChatMember>(
            r#"UPDATE chat_members SET role_id = $3
               WHERE server_id = $1 AND user_id = $2
               RETURNING server_id, user_id, role_id, joined_at"#,
        )
        .bind(server_id)
        .bind(user_id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
    }

    // Roles

    pub async fn list_roles(&self, server_id: Uuid) -> Result<Vec<ChatRole>, sqlx::Error> {
        sqlx::query_as::<_, ChatRole>(
            r#"SELECT id, server_id, name, permissions, built_in
               FROM chat_roles WHERE server_id = $1
               ORDER BY built_in DESC, name"#,
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_role(
        &self,
        server_id: Uuid,
        role_id: Uuid,
    ) -> Result<Option<ChatRole>, sqlx::Error> {
        sqlx::query_as::<_, ChatRole>(
            r#"SELECT id, server_id, name, permissions, built_in
               FROM chat_roles WHERE server_id = $1 AND id = $2"#,
        )
        .bind(server_id)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn role_by_name(
        &self,
        server_id: Uuid,
        name: &str,
    ) -> Result<Option<ChatRole>, sqlx::Error> {
        sqlx::query_as::<_, ChatRole>(
            r#"SELECT id, server_id, name, permissions, built_in
               FROM chat_roles WHERE server_id = $1 AND name = $2"#,
        )
        .bind(server_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create_role(
        &self,
        server_id: Uuid,
        name: &str,
        permissions: i64,
    ) -> Result<ChatRole, sqlx::Error> {
        sqlx::query_as::<_, ChatRole>(
            r#"INSERT INTO chat_roles (id, server_id, name, permissions, built_in)
               VALUES ($1, $2, $3, $4, FALSE)
               RETURNING id, server_id, name, permissions, built_in"#,
        )
        .bind(Uuid::new_v4())
        .bind(server_id)
        .bind(name)
        .bind(permissions)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_role(
        &self,
        server_id: Uuid,
        role_id: Uuid,
        name: &str,
        permissions: i64,
    ) -> Result<Option<ChatRole>, sqlx::Error> {
        sqlx::query_as::<_, ChatRole>(
            r#"UPDATE chat_roles SET name = $3, permissions = $4
               WHERE server_id = $1 AND id = $2 AND NOT built_in
               RETURNING id, server_id, name, permissions, built_in"#,
        )
        .bind(server_id)
        .bind(role_id)
        .bind(name)
        .bind(permissions)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a custom role, moving its members to the fallback role first.
    pub async fn delete_role(
        &self,
        server_id: Uuid,
        role_id: Uuid,
        fallback_role_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE chat_members SET role_id = $3 WHERE server_id = $1 AND role_id = $2")
            .bind(server_id)
            .bind(role_id)
            .bind(fallback_role_id)
            .execute(&mut *tx)
            .await?;

        let result =
            sqlx::query("DELETE FROM chat_roles WHERE server_id = $1 AND id = $2 AND NOT built_in")
                .bind(server_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // Channels

    pub async fn list_channels(&self, server_id: Uuid) -> Result<Vec<ChatChannel>, sqlx::Error> {
        sqlx::query_as::<_, ChatChannel>(
            r#"SELECT id, server_id, name, kind, created_at
               FROM chat_channels WHERE server_id = $1
               ORDER BY created_at"#,
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_channel(&self, id: Uuid) -> Result<Option<ChatChannel>, sqlx::Error> {
        sqlx::query_as::<_, ChatChannel>(
            r#"SELECT id, server_id, name, kind, created_at
               FROM chat_channels WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create_channel(
        &self,
        server_id: Uuid,
        name: &str,
    ) -> Result<ChatChannel, sqlx::Error> {
        sqlx::query_as::<_, ChatChannel>(
            r#"INSERT INTO chat_channels (id, server_id, name, kind, created_at)
               VALUES ($1, $2, $3, 'text', NOW())
               RETURNING id, server_id, name, kind, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(server_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn rename_channel(
        &self,
        server_id: Uuid,
        channel_id: Uuid,
        name: &str,
    ) -> Result<Option<ChatChannel>, sqlx::Error> {
        sqlx::query_as::<_, ChatChannel>(
            r#"UPDATE chat_channels SET name = $3
               WHERE server_id = $1 AND id = $2
               RETURNING id, server_id, name, kind, created_at"#,
        )
        .bind(server_id)
        .bind(channel_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_channel(
        &self,
        server_id: Uuid,
        channel_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chat_channels WHERE server_id = $1 AND id = $2")
            .bind(server_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Messages

    pub async fn create_message(
        &self,
        channel_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<ChatMessageRow, sqlx::Error> {
        sqlx::query_as::<_, ChatMessageRow>(
            r#"INSERT INTO chat_messages (channel_id, author_id, body)
               VALUES ($1, $2, $3)
               RETURNING id, channel_id, author_id, body, created_at"#,
        )
        .bind(channel_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
    }

    /// Poll contract: strictly newer than `after`, ascending id order.
    pub async fn list_messages(
        &self,
        channel_id: Uuid,
        after: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ChatMessageRow>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessageRow>(
            r#"SELECT id, channel_id, author_id, body, created_at
               FROM chat_messages
               WHERE channel_id = $1 AND ($2::bigint IS NULL OR id > $2)
               ORDER BY id
               LIMIT $3"#,
        )
        .bind(channel_id)
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    // Threads

    /// Thread channel, thread record, and opening message in one transaction.
    /// A failed thread insert leaves no orphan channel behind.
    pub async fn create_thread(
        &self,
        server_id: Uuid,
        parent_channel_id: Uuid,
        title: &str,
        created_by: Uuid,
        first_message: &str,
    ) -> Result<(ChatThread, ChatChannel), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let channel = sqlx::query_as::<_, ChatChannel>(
            r#"INSERT INTO chat_channels (id, server_id, name, kind, created_at)
               VALUES ($1, $2, $3, 'thread', NOW())
               RETURNING id, server_id, name, kind, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(server_id)
        .bind(title)
        .fetch_one(&mut *tx)
        .await?;

        let thread = sqlx::query_as::<_, ChatThread>(
            r#"INSERT INTO chat_threads (id, channel_id, parent_channel_id, title, created_by, created_at)
               VALUES ($1, $2, $3, $4, $5, NOW())
               RETURNING id, channel_id, parent_channel_id, title, created_by, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(channel.id)
        .bind(parent_channel_id)
        .bind(title)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO chat_messages (channel_id, author_id, body) VALUES ($1, $2, $3)")
            .bind(channel.id)
            .bind(created_by)
            .bind(first_message)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((thread, channel))
    }

    pub async fn list_threads(
        &self,
        parent_channel_id: Uuid,
    ) -> Result<Vec<ChatThread>, sqlx::Error> {
        sqlx::query_as::<_, ChatThread>(
            r#"SELECT id, channel_id, parent_channel_id, title, created_by, created_at
               FROM chat_threads WHERE parent_channel_id = $1
               ORDER BY created_at"#,
        )
        .bind(parent_channel_id)
        .fetch_all(&self.pool)
        .await
    }

    // Direct messages

    pub async fn find_dm(&self, a: Uuid, b: Uuid) -> Result<Option<DmChannel>, sqlx::Error> {
        let (user_a, user_b) = dm_pair(a, b);
        sqlx::query_as::<_, DmChannel>(
            r#"SELECT channel_id, tenant_id, user_a, user_b
               FROM chat_dm_channels WHERE user_a = $1 AND user_b = $2"#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create_dm(
        &self,
        tenant_id: Uuid,
        a: Uuid,
        b: Uuid,
    ) -> Result<DmChannel, sqlx::Error> {
        let (user_a, user_b) = dm_pair(a, b);
        let mut tx = self.pool.begin().await?;

        let channel_id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO chat_channels (id, server_id, name, kind, created_at)
               VALUES ($1, NULL, 'dm', 'dm', NOW())
               RETURNING id"#,
        )
        .bind(Uuid::new_v4())
        .fetch_one(&mut *tx)
        .await?;

        let dm = sqlx::query_as::<_, DmChannel>(
            r#"INSERT INTO chat_dm_channels (channel_id, tenant_id, user_a, user_b)
               VALUES ($1, $2, $3, $4)
               RETURNING channel_id, tenant_id, user_a, user_b"#,
        )
        .bind(channel_id)
        .bind(tenant_id)
        .bind(user_a)
        .bind(user_b)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(dm)
    }

    /// Idempotent open: returns the existing channel when the pair already
    /// has one, including when a concurrent insert wins the race and this
    /// one dies on the pair's unique constraint. The bool is `created`.
    pub async fn open_dm(
        &self,
        tenant_id: Uuid,
        a: Uuid,
        b: Uuid,
    ) -> Result<(DmChannel, bool), sqlx::Error> {
        if let Some(existing) = self.find_dm(a, b).await? {
            return Ok((existing, false));
        }

        match self.create_dm(tenant_id, a, b).await {
            Ok(dm) => Ok((dm, true)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => self
                .find_dm(a, b)
                .await?
                .map(|dm| (dm, false))
                .ok_or(sqlx::Error::RowNotFound),
            Err(e) => Err(e),
        }
    }

    pub async fn list_dms_for(&self, user_id: Uuid) -> Result<Vec<DmChannel>, sqlx::Error> {
        sqlx::query_as::<_, DmChannel>(
            r#"SELECT channel_id, tenant_id, user_a, user_b
               FROM chat_dm_channels
               WHERE user_a = $1 OR user_b = $1"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// DM membership check for message routes on DM channels.
    pub async fn dm_for_channel(
        &self,
        channel_id: Uuid,
    ) -> Result<Option<DmChannel>, sqlx::Error> {
        sqlx::query_as::<_, DmChannel>(
            r#"SELECT channel_id, tenant_id, user_a, user_b
               FROM chat_dm_channels WHERE channel_id = $1"#,
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dm_pair_is_order_insensitive() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dm_pair(a, b), dm_pair(b, a));
        let (lo, hi) = dm_pair(a, b);
        assert!(lo < hi);
    }

    #[test]
    fn test_invite_code_shape() {
        let code = new_invite_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
