pub mod claims;
pub mod errors;
pub mod lifetime;
pub mod signer;

pub use claims::SessionClaims;
pub use errors::JwtError;
pub use lifetime::TokenLifetime;
pub use signer::TokenSigner;
