use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use sqlx::{FromRow, MySqlPool};

use super::PersonDirectory;
use crate::model::person::{Person, PersonKind, PersonRef};
use crate::store::{StoreError, StoreResult};

const PERSON_COLUMNS: &str =
    "SELECT id, kind, display_name, badge_code, is_active, group_id FROM persons";

#[derive(FromRow)]
struct PersonRow {
    id: u64,
    kind: String,
    display_name: String,
    badge_code: String,
    is_active: bool,
    group_id: Option<u64>,
}

impl TryFrom<PersonRow> for Person {
    type Error = StoreError;

    fn try_from(row: PersonRow) -> Result<Self, Self::Error> {
        let kind: PersonKind = row.kind.parse().map_err(|_| StoreError::Corrupt {
            id: row.id.to_string(),
            reason: format!("unknown person kind {}", row.kind),
        })?;

        Ok(Person {
            id: row.id,
            kind,
            display_name: row.display_name,
            badge_code: row.badge_code,
            is_active: row.is_active,
            group_id: row.group_id,
        })
    }
}

/// Reads the `persons` table maintained by the user service. Badge lookups
/// sit on the scan hot path and are cached for a short TTL.
pub struct MySqlPersonDirectory {
    pool: MySqlPool,
    badges: Cache<String, Person>,
}

impl MySqlPersonDirectory {
    pub fn new(pool: MySqlPool, cache_ttl: Duration) -> Self {
        Self {
            pool,
            badges: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(cache_ttl)
                .build(),
        }
    }

    async fn fetch_all(
        &self,
        sql: &str,
        kind: PersonKind,
        group_id: Option<u64>,
    ) -> StoreResult<Vec<Person>> {
        let mut query = sqlx::query_as::<_, PersonRow>(sql).bind(kind.as_ref());
        if let Some(group_id) = group_id {
            query = query.bind(group_id);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Person::try_from)
            .collect()
    }
}

#[async_trait]
impl PersonDirectory for MySqlPersonDirectory {
    async fn resolve(&self, identifier: &str) -> StoreResult<Option<Person>> {
        if let Some(hit) = self.badges.get(identifier).await {
            return Ok(Some(hit));
        }

        let sql = format!("{} WHERE badge_code = ?", PERSON_COLUMNS);
        let person = sqlx::query_as::<_, PersonRow>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?
            .map(Person::try_from)
            .transpose()?;

        // unknown badges are not cached so a freshly enrolled badge works at once
        if let Some(p) = &person {
            self.badges.insert(identifier.to_string(), p.clone()).await;
        }
        Ok(person)
    }

    async fn find(&self, person: PersonRef) -> StoreResult<Option<Person>> {
        let sql = format!("{} WHERE kind = ? AND id = ?", PERSON_COLUMNS);
        sqlx::query_as::<_, PersonRow>(&sql)
            .bind(person.kind.as_ref())
            .bind(person.id)
            .fetch_optional(&self.pool)
            .await?
            .map(Person::try_from)
            .transpose()
    }

    async fn list(&self, kind: PersonKind, active_only: bool) -> StoreResult<Vec<Person>> {
        let sql = if active_only {
            format!("{} WHERE kind = ? AND is_active = TRUE ORDER BY id", PERSON_COLUMNS)
        } else {
            format!("{} WHERE kind = ? ORDER BY id", PERSON_COLUMNS)
        };
        self.fetch_all(&sql, kind, None).await
    }

    async fn group_members(&self, kind: PersonKind, group_id: u64) -> StoreResult<Vec<Person>> {
        let sql = format!("{} WHERE kind = ? AND group_id = ? ORDER BY id", PERSON_COLUMNS);
        self.fetch_all(&sql, kind, Some(group_id)).await
    }
}
