//! Database repository for conferences and conference membership.

use crate::{
    db::{
        errors::Result,
        models::conferences::{ConferenceCreateDBRequest, ConferenceDBResponse},
    },
    types::{ConferenceId, UserId},
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Conferences<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Conferences<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name, created_by = request.created_by), err)]
    pub async fn create(&mut self, request: &ConferenceCreateDBRequest) -> Result<ConferenceDBResponse> {
        let conference = sqlx::query_as::<_, ConferenceDBResponse>(
            r#"
            INSERT INTO conferences (name, created_by, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, name, created_by, created_at, last_message
            "#,
        )
        .bind(&request.name)
        .bind(request.created_by)
        .bind(request.created_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(conference)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: ConferenceId) -> Result<Option<ConferenceDBResponse>> {
        let conference = sqlx::query_as::<_, ConferenceDBResponse>(
            "SELECT id, name, created_by, created_at, last_message FROM conferences WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(conference)
    }

    #[instrument(skip(self), err)]
    pub async fn add_member(&mut self, conference_id: ConferenceId, user_id: UserId, joined_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT INTO conference_members (conference_id, user_id, joined_at) VALUES ($1, $2, $3)")
            .bind(conference_id)
            .bind(user_id)
            .bind(joined_at)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn get_user_conferences(&mut self, user_id: UserId) -> Result<Vec<ConferenceDBResponse>> {
        let conferences = sqlx::query_as::<_, ConferenceDBResponse>(
            r#"
            SELECT c.id, c.name, c.created_by, c.created_at, c.last_message
            FROM conferences c
            INNER JOIN conference_members cm ON c.id = cm.conference_id
            WHERE cm.user_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(conferences)
    }

    #[instrument(skip(self), err)]
    pub async fn set_last_message(&mut self, conference_id: ConferenceId, message_id: i64) -> Result<()> {
        sqlx::query("UPDATE conferences SET last_message = $2 WHERE id = $1")
            .bind(conference_id)
            .bind(message_id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{errors::DbError, handlers::Users, models::users::UserCreateDBRequest};
    use sqlx::PgPool;

    async fn create_user(conn: &mut PgConnection, username: &str) -> UserId {
        Users::new(conn)
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                email: format!("{username}@x.com"),
                password_hash: "digest".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
    async fn test_membership_lookup(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let alice = create_user(&mut conn, "alice").await;
        let bob = create_user(&mut conn, "bob").await;

        let mut repo = Conferences::new(&mut conn);
        let conference = repo
            .create(&ConferenceCreateDBRequest {
                name: "G1".to_string(),
                created_by: alice,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        repo.add_member(conference.id, alice, conference.created_at).await.unwrap();

        let alice_confs = repo.get_user_conferences(alice).await.unwrap();
        assert_eq!(alice_confs.len(), 1);
        assert_eq!(alice_confs[0].id, conference.id);
        assert!(repo.get_user_conferences(bob).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
    async fn test_duplicate_membership_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let alice = create_user(&mut conn, "alice").await;

        let mut repo = Conferences::new(&mut conn);
        let conference = repo
            .create(&ConferenceCreateDBRequest {
                name: "G1".to_string(),
                created_by: alice,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        repo.add_member(conference.id, alice, Utc::now()).await.unwrap();

        let err = repo.add_member(conference.id, alice, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let err = repo.add_member(conference.id, alice + 1000, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
