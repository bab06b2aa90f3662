pub mod claims;
pub mod errors;
pub mod handler;

pub use claims::RegisteredClaims;
pub use errors::JwtError;
pub use handler::JwtHandler;
