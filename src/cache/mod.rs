pub mod credential;
pub mod token;
pub mod token_cache;

pub use credential::CachedCredential;
pub use token::AccessToken;
pub use token_cache::{CacheSettings, TokenCache};
