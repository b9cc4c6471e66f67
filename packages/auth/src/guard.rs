// ABOUTME: Authorization guard applied before handler bodies run
// ABOUTME: A guard names the roles it admits; a scope decides whether the session may touch the target

use rfpdesk_core::Role;

use crate::error::{AuthError, AuthResult};
use crate::types::Session;

/// What a request is about to touch
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// Not tied to a company, e.g. the caller's own inbox
    Unscoped,
    /// Records owned by one company
    Company(&'a str),
    /// An RFP: its owning buyer company, plus the supplier companies invited to it
    Rfp {
        company_id: &'a str,
        invited_companies: &'a [String],
    },
}

impl Scope<'_> {
    pub fn permits(&self, session: &Session) -> bool {
        match self {
            Scope::Unscoped => true,
            Scope::Company(company_id) => session.company_id == *company_id,
            Scope::Rfp {
                company_id,
                invited_companies,
            } => match session.role {
                Role::Buyer => session.company_id == *company_id,
                Role::Supplier => invited_companies.iter().any(|c| *c == session.company_id),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Guard {
    pub name: &'static str,
    pub roles: &'static [Role],
}

impl Guard {
    pub const BUYER: Guard = Guard {
        name: "buyer",
        roles: &[Role::Buyer],
    };

    pub const SUPPLIER: Guard = Guard {
        name: "supplier",
        roles: &[Role::Supplier],
    };

    pub const MEMBER: Guard = Guard {
        name: "member",
        roles: &[Role::Buyer, Role::Supplier],
    };

    pub fn authorize(&self, session: &Session, scope: Scope<'_>) -> AuthResult<()> {
        if !self.roles.contains(&session.role) {
            return Err(AuthError::Forbidden(format!(
                "role {} cannot perform this action",
                session.role
            )));
        }
        if !scope.permits(session) {
            return Err(AuthError::Forbidden(
                "resource belongs to another company".to_string(),
            ));
        }
        Ok(())
    }
}
