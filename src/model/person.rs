use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonKind {
    Learner,
    Coach,
}

/// Identifies the subject of an attendance record. Learner and coach ids live
/// in separate id spaces, so the kind is part of the key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    pub kind: PersonKind,
    pub id: u64,
}

impl PersonRef {
    pub fn learner(id: u64) -> Self {
        Self { kind: PersonKind::Learner, id }
    }

    pub fn coach(id: u64) -> Self {
        Self { kind: PersonKind::Coach, id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[schema(example = 42)]
    pub id: u64,
    pub kind: PersonKind,
    #[schema(example = "Awa Diop")]
    pub display_name: String,
    #[schema(example = "LRN-0042")]
    pub badge_code: String,
    pub is_active: bool,
    /// Promotion / cohort the person belongs to
    #[schema(example = 3, nullable = true)]
    pub group_id: Option<u64>,
}

impl Person {
    pub fn person_ref(&self) -> PersonRef {
        PersonRef {
            kind: self.kind,
            id: self.id,
        }
    }
}
