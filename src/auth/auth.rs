use crate::config::Config;
use crate::error::AttendanceError;
use crate::model::{person::PersonRef, role::Role};
use crate::models::{Claims, TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

use super::jwt::verify_token;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to a learner or coach record
    pub person_id: Option<u64>,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Result<Self, &'static str> {
        if claims.token_type != TokenType::Access {
            return Err("Access token required");
        }
        let role = Role::from_id(claims.role).ok_or("Invalid role")?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            person_id: claims.person_id,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(AuthUser::from_claims(claims).map_err(ErrorUnauthorized))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AttendanceError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AttendanceError::Forbidden("Admin only".into()))
        }
    }

    pub fn require_staff_or_admin(&self) -> Result<(), AttendanceError> {
        if matches!(self.role, Role::Admin | Role::Staff) {
            Ok(())
        } else {
            Err(AttendanceError::Forbidden("Staff/Admin only".into()))
        }
    }

    /// Badge readers and front-desk staff may submit scans.
    pub fn require_scanner(&self) -> Result<(), AttendanceError> {
        if matches!(self.role, Role::Device | Role::Admin | Role::Staff) {
            Ok(())
        } else {
            Err(AttendanceError::Forbidden("Scanner device or staff only".into()))
        }
    }

    /// The learner or coach record this user is linked to.
    pub fn person(&self) -> Option<PersonRef> {
        Some(PersonRef {
            kind: self.role.person_kind()?,
            id: self.person_id?,
        })
    }

    /// Staff see every record; learners and coaches only their own.
    pub fn require_access_to(&self, owner: PersonRef) -> Result<(), AttendanceError> {
        if matches!(self.role, Role::Admin | Role::Staff) || self.person() == Some(owner) {
            Ok(())
        } else {
            Err(AttendanceError::Forbidden(
                "You can only access your own attendance".into(),
            ))
        }
    }
}
