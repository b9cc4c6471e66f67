// ABOUTME: RFP Desk authentication library
// ABOUTME: Bearer sessions stored by token hash, plus the role and company-scope authorization guard

pub mod error;
pub mod guard;
pub mod storage;
pub mod token;
pub mod types;

pub use error::{AuthError, AuthResult};
pub use guard::{Guard, Scope};
pub use storage::{SessionStorage, UserStorage};
pub use token::{generate_token, hash_token};
pub use types::{Company, IssuedSession, NewUser, Session, User};
