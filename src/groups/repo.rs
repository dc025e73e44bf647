use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "group_status", rename_all = "lowercase")]
pub enum GroupStatus {
    Active,
    Archived,
}

/// A study group. `members` and `requests` are kept disjoint by the
/// update statements below: every mutation that adds to one side removes
/// from the other in the same statement, so the invariant holds without
/// application-level locking.
#[derive(Debug, Clone, FromRow)]
pub struct StudyGroup {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub members: Vec<String>,
    pub requests: Vec<String>,
    pub status: GroupStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupMessage {
    pub id: i64,
    pub group_id: Uuid,
    pub sender: String,
    pub body: String,
    pub sent_at: OffsetDateTime,
}

/// A group where a given user has a pending join request.
#[derive(Debug, Clone, FromRow)]
pub struct PendingRequest {
    pub group_id: Uuid,
    pub group_name: String,
    pub updated_at: OffsetDateTime,
}

const GROUP_COLUMNS: &str =
    "id, name, description, created_by, members, requests, status, created_at, updated_at";

impl StudyGroup {
    pub async fn create(
        db: &PgPool,
        name: &str,
        description: Option<&str>,
        created_by: &str,
    ) -> anyhow::Result<StudyGroup> {
        let group = sqlx::query_as::<_, StudyGroup>(&format!(
            r#"
            INSERT INTO study_groups (name, description, created_by, members)
            VALUES ($1, $2, $3, ARRAY[$3])
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(description)
        .bind(created_by)
        .fetch_one(db)
        .await?;
        Ok(group)
    }

    /// Only active groups, newest first.
    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<StudyGroup>> {
        let groups = sqlx::query_as::<_, StudyGroup>(&format!(
            "SELECT {GROUP_COLUMNS} FROM study_groups WHERE status = 'active' ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(groups)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<StudyGroup>> {
        let group = sqlx::query_as::<_, StudyGroup>(&format!(
            "SELECT {GROUP_COLUMNS} FROM study_groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(group)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        status: Option<GroupStatus>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE study_groups
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(status)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard delete, unlike items. Messages go with the group (FK cascade).
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM study_groups WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add to `members` and pull from `requests` in one statement; this
    /// is both the accept transition and the standalone add.
    pub async fn add_member(db: &PgPool, id: Uuid, username: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE study_groups
            SET members = CASE WHEN $2 = ANY(members) THEN members ELSE array_append(members, $2) END,
                requests = array_remove(requests, $2),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(username)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Pulls from both sides so the disjointness invariant survives
    /// out-of-band calls.
    pub async fn remove_member(db: &PgPool, id: Uuid, username: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE study_groups
            SET members = array_remove(members, $2),
                requests = array_remove(requests, $2),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(username)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Conditional insert: the WHERE clause only matches when the user is
    /// in neither set, so concurrent duplicate requests collapse to one
    /// row change and the loser sees `false`.
    pub async fn add_join_request(db: &PgPool, id: Uuid, username: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE study_groups
            SET requests = array_append(requests, $2),
                updated_at = now()
            WHERE id = $1
              AND NOT ($2 = ANY(requests))
              AND NOT ($2 = ANY(members))
            "#,
        )
        .bind(id)
        .bind(username)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_join_request(db: &PgPool, id: Uuid, username: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE study_groups
            SET requests = array_remove(requests, $2),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(username)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Groups where the user has a pending request. The group-wide
    /// `updated_at` stands in for the request time; there is no
    /// per-request timestamp column.
    pub async fn pending_for_user(db: &PgPool, username: &str) -> anyhow::Result<Vec<PendingRequest>> {
        let rows = sqlx::query_as::<_, PendingRequest>(
            r#"
            SELECT id AS group_id, name AS group_name, updated_at
            FROM study_groups
            WHERE $1 = ANY(requests)
            ORDER BY updated_at DESC
            "#,
        )
        .bind(username)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

impl GroupMessage {
    /// Append-only; ordering is the insertion order of the serial key.
    /// The insert and the `updated_at` bump happen in one statement, so
    /// the timestamp can never drift from the message list. Returns
    /// false when the group does not exist.
    pub async fn append(
        db: &PgPool,
        group_id: Uuid,
        sender: &str,
        body: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            WITH touched AS (
                UPDATE study_groups SET updated_at = now() WHERE id = $1 RETURNING id
            )
            INSERT INTO group_messages (group_id, sender, body)
            SELECT id, $2, $3 FROM touched
            "#,
        )
        .bind(group_id)
        .bind(sender)
        .bind(body)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_group(db: &PgPool, group_id: Uuid) -> anyhow::Result<Vec<GroupMessage>> {
        let rows = sqlx::query_as::<_, GroupMessage>(
            "SELECT id, group_id, sender, body, sent_at FROM group_messages WHERE group_id = $1 ORDER BY id",
        )
        .bind(group_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod membership_tests {
    use super::*;

    async fn algo_group(db: &PgPool) -> StudyGroup {
        StudyGroup::create(db, "Algo Study", Some("weekly problems"), "alice")
            .await
            .expect("create group")
    }

    fn assert_disjoint(group: &StudyGroup) {
        for member in &group.members {
            assert!(
                !group.requests.contains(member),
                "{member} is in both members and requests"
            );
        }
    }

    #[sqlx::test]
    async fn create_starts_with_creator_as_sole_member(pool: PgPool) {
        let group = algo_group(&pool).await;
        assert_eq!(group.members, vec!["alice"]);
        assert!(group.requests.is_empty());
        assert_eq!(group.status, GroupStatus::Active);
    }

    #[sqlx::test]
    async fn double_join_request_keeps_one_entry(pool: PgPool) {
        let group = algo_group(&pool).await;

        assert!(StudyGroup::add_join_request(&pool, group.id, "bob")
            .await
            .unwrap());
        // Second identical request hits the conditional predicate and
        // changes nothing.
        assert!(!StudyGroup::add_join_request(&pool, group.id, "bob")
            .await
            .unwrap());

        let group = StudyGroup::find(&pool, group.id).await.unwrap().unwrap();
        assert_eq!(group.requests, vec!["bob"]);
        assert_disjoint(&group);
    }

    #[sqlx::test]
    async fn member_cannot_also_hold_a_request(pool: PgPool) {
        let group = algo_group(&pool).await;

        assert!(!StudyGroup::add_join_request(&pool, group.id, "alice")
            .await
            .unwrap());

        let group = StudyGroup::find(&pool, group.id).await.unwrap().unwrap();
        assert!(group.requests.is_empty());
    }

    #[sqlx::test]
    async fn accept_moves_request_to_members(pool: PgPool) {
        let group = algo_group(&pool).await;
        StudyGroup::add_join_request(&pool, group.id, "bob")
            .await
            .unwrap();

        assert!(StudyGroup::add_member(&pool, group.id, "bob").await.unwrap());

        let group = StudyGroup::find(&pool, group.id).await.unwrap().unwrap();
        assert_eq!(group.members, vec!["alice", "bob"]);
        assert!(group.requests.is_empty());
        assert_disjoint(&group);
    }

    #[sqlx::test]
    async fn remove_member_pulls_from_both_sides(pool: PgPool) {
        let group = algo_group(&pool).await;
        StudyGroup::add_member(&pool, group.id, "bob").await.unwrap();
        StudyGroup::add_join_request(&pool, group.id, "carol")
            .await
            .unwrap();

        assert!(StudyGroup::remove_member(&pool, group.id, "bob").await.unwrap());
        assert!(StudyGroup::remove_member(&pool, group.id, "carol")
            .await
            .unwrap());

        let group = StudyGroup::find(&pool, group.id).await.unwrap().unwrap();
        assert_eq!(group.members, vec!["alice"]);
        assert!(group.requests.is_empty());
        assert_disjoint(&group);
    }

    #[sqlx::test]
    async fn request_accept_reject_sequence_preserves_disjointness(pool: PgPool) {
        let group = algo_group(&pool).await;

        StudyGroup::add_join_request(&pool, group.id, "bob")
            .await
            .unwrap();
        StudyGroup::add_join_request(&pool, group.id, "carol")
            .await
            .unwrap();
        StudyGroup::add_member(&pool, group.id, "bob").await.unwrap();
        StudyGroup::remove_join_request(&pool, group.id, "carol")
            .await
            .unwrap();

        let group = StudyGroup::find(&pool, group.id).await.unwrap().unwrap();
        assert_eq!(group.members, vec!["alice", "bob"]);
        assert!(group.requests.is_empty());
        assert_disjoint(&group);

        let pending = StudyGroup::pending_for_user(&pool, "carol").await.unwrap();
        assert!(pending.is_empty());
    }

    #[sqlx::test]
    async fn append_message_bumps_timestamp_in_the_same_statement(pool: PgPool) {
        let group = algo_group(&pool).await;
        let before = group.updated_at;

        assert!(GroupMessage::append(&pool, group.id, "bob", "meet at 6?")
            .await
            .unwrap());

        let group = StudyGroup::find(&pool, group.id).await.unwrap().unwrap();
        assert!(group.updated_at >= before);

        let messages = GroupMessage::list_for_group(&pool, group.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, "bob");
        assert_eq!(messages[0].body, "meet at 6?");
    }

    #[sqlx::test]
    async fn append_to_missing_group_reports_false(pool: PgPool) {
        assert!(!GroupMessage::append(&pool, Uuid::new_v4(), "bob", "hello")
            .await
            .unwrap());
    }
}
