//! Services layer for the magic-link auth service.
//!
//! Token codec, link composition, email delivery, and the gateway that ties
//! them together.

pub mod email;
pub mod error;
pub mod link;
pub mod magic_link;
pub mod metrics;
pub mod token;

pub use email::{EmailMessage, EmailProvider, MockEmailProvider, ProviderError};
pub use error::AuthError;
pub use link::LinkBuilder;
pub use magic_link::MagicLinkService;
pub use token::{MagicLinkClaims, MagicToken, Rejection, TokenCodec, Verification};
