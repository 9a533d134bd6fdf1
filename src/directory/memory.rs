use std::sync::RwLock;

use async_trait::async_trait;

use super::PersonDirectory;
use crate::model::person::{Person, PersonKind, PersonRef};
use crate::store::{StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryPersonDirectory {
    people: RwLock<Vec<Person>>,
}

impl MemoryPersonDirectory {
    pub fn new(people: Vec<Person>) -> Self {
        Self {
            people: RwLock::new(people),
        }
    }

    /// Adds or replaces a person.
    pub fn upsert(&self, person: Person) -> StoreResult<()> {
        let mut people = self.people.write().map_err(poisoned)?;
        people.retain(|p| p.person_ref() != person.person_ref());
        people.push(person);
        Ok(())
    }

    fn select(&self, pred: impl Fn(&Person) -> bool) -> StoreResult<Vec<Person>> {
        let people = self.people.read().map_err(poisoned)?;
        Ok(people.iter().filter(|p| pred(p)).cloned().collect())
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("person directory lock poisoned".into())
}

#[async_trait]
impl PersonDirectory for MemoryPersonDirectory {
    async fn resolve(&self, identifier: &str) -> StoreResult<Option<Person>> {
        Ok(self
            .select(|p| p.badge_code == identifier)?
            .into_iter()
            .next())
    }

    async fn find(&self, person: PersonRef) -> StoreResult<Option<Person>> {
        Ok(self
            .select(|p| p.person_ref() == person)?
            .into_iter()
            .next())
    }

    async fn list(&self, kind: PersonKind, active_only: bool) -> StoreResult<Vec<Person>> {
        self.select(|p| p.kind == kind && (p.is_active || !active_only))
    }

    async fn group_members(&self, kind: PersonKind, group_id: u64) -> StoreResult<Vec<Person>> {
        self.select(|p| p.kind == kind && p.group_id == Some(group_id))
    }
}
