use crate::model::person::PersonKind;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Staff = 2,
    Learner = 3,
    Coach = 4,
    Device = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Staff),
            3 => Some(Role::Learner),
            4 => Some(Role::Coach),
            5 => Some(Role::Device),
            _ => None,
        }
    }

    /// Kind of person record a token with this role is linked to, if any.
    pub fn person_kind(&self) -> Option<PersonKind> {
        match self {
            Role::Learner => Some(PersonKind::Learner),
            Role::Coach => Some(PersonKind::Coach),
            _ => None,
        }
    }
}
