//! Authentication: signed session cookie and the OIDC login flow

pub mod oidc;
pub mod routes;
pub mod session;

pub use oidc::OidcProvider;
pub use routes::auth_router;
pub use session::{Session, UserClaims};
