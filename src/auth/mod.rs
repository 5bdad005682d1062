/// Authentication module
///
/// Token signing and validation, password hashing, refresh-token records,
/// the `refreshToken` cookie, the bearer-token extractor and the session
/// service that ties them to the stores.

mod claims;
mod cookie;
mod extractor;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::{Claims, RefreshClaims};
pub use cookie::{presented_refresh_token, refresh_cookie, removal_cookie, REFRESH_COOKIE_NAME};
pub use extractor::AuthenticatedUser;
pub use jwt::{
    decode_refresh_token, encode_access_claims, generate_access_token, generate_refresh_token,
    validate_access_token,
};
pub use password::{hash_password, verify_password};
pub use refresh_token::hash_token;
pub use session::{IssuedCredentials, RefreshedCredentials, SessionService};
