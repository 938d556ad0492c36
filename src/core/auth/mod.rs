//! Authentication: session tokens, social token validation and the auth
//! service orchestrating signup/signin/social sign-in.

pub mod jwt;
pub mod service;
pub mod social;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use service::{AuthError, AuthService};
pub use social::{FacebookTokenValidator, GoogleTokenValidator, SocialIdentity, TokenValidator};
