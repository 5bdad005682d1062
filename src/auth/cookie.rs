//! The `refreshToken` cookie contract.
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

use crate::configuration::AuthSettings;

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Cookie delivering a refresh token: http-only, same-site strict,
/// secure in production, lives as long as the token.
pub fn refresh_cookie(token: String, config: &AuthSettings) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE_NAME, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.secure_cookies)
        .max_age(Duration::seconds(config.refresh_token_expiry))
        .finish()
}

/// Cookie that tells the browser to drop the refresh token
pub fn removal_cookie(config: &AuthSettings) -> Cookie<'static> {
    let mut cookie = Cookie::build(REFRESH_COOKIE_NAME, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.secure_cookies)
        .finish();
    cookie.make_removal();
    cookie
}

/// Refresh token presented by the client, if any. Empty values count as absent.
pub fn presented_refresh_token(req: &HttpRequest) -> Option<String> {
    req.cookie(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::test_settings;
    use actix_web::test::TestRequest;

    #[test]
    fn test_refresh_cookie_attributes() {
        let config = test_settings();
        let cookie = refresh_cookie("tok".to_string(), &config);

        assert_eq!(cookie.name(), "refreshToken");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn test_cookie_is_secure_in_production() {
        let mut config = test_settings();
        config.secure_cookies = true;

        assert_eq!(refresh_cookie("tok".to_string(), &config).secure(), Some(true));
        assert_eq!(removal_cookie(&config).secure(), Some(true));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie(&test_settings());

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn test_presented_refresh_token() {
        let req = TestRequest::default()
            .cookie(Cookie::new(REFRESH_COOKIE_NAME, "abc"))
            .to_http_request();
        assert_eq!(presented_refresh_token(&req), Some("abc".to_string()));

        let empty = TestRequest::default()
            .cookie(Cookie::new(REFRESH_COOKIE_NAME, ""))
            .to_http_request();
        assert_eq!(presented_refresh_token(&empty), None);

        let none = TestRequest::default().to_http_request();
        assert_eq!(presented_refresh_token(&none), None);
    }
}
