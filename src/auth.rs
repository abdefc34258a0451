//! Request actors.
//!
//! Authentication lives in the upstream gateway; by the time a request
//! reaches this service the gateway has already validated the bearer token
//! and injected `x-actor-id` and `x-actor-role` headers. The extractor below
//! turns those into an [`Actor`], and every capability decision (owner vs.
//! administrator) is made against it at the service boundary.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

#[derive(Clone, Copy, Debug)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden("administrator role required".into()))
        }
    }

    /// Owner-or-admin check used by order reads, cancellation and
    /// payment-proof attachment.
    pub fn ensure_can_manage(&self, order_customer_id: Uuid) -> Result<()> {
        if self.is_admin() || self.id == order_customer_id {
            Ok(())
        } else {
            Err(Error::Forbidden("order belongs to another customer".into()))
        }
    }

    /// Label recorded in the order audit trail.
    pub fn audit_label(&self) -> String {
        match self.role {
            Role::Admin => format!("admin:{}", self.id),
            Role::Customer => format!("customer:{}", self.id),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or(Error::Unauthorized)?;

        let role = match parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some("admin") => Role::Admin,
            Some("customer") => Role::Customer,
            _ => return Err(Error::Unauthorized),
        };

        Ok(Actor { id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor { id: Uuid::now_v7(), role }
    }

    #[test]
    fn admin_may_manage_any_order() {
        let admin = actor(Role::Admin);
        assert!(admin.require_admin().is_ok());
        assert!(admin.ensure_can_manage(Uuid::now_v7()).is_ok());
    }

    #[test]
    fn customer_may_only_manage_own_orders() {
        let customer = actor(Role::Customer);
        assert!(customer.require_admin().is_err());
        assert!(customer.ensure_can_manage(customer.id).is_ok());
        assert!(customer.ensure_can_manage(Uuid::now_v7()).is_err());
    }

    #[test]
    fn audit_labels_name_the_role() {
        let a = actor(Role::Admin);
        assert_eq!(a.audit_label(), format!("admin:{}", a.id));
    }
}
