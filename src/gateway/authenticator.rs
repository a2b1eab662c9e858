//! Attaches the bearer credential to outgoing requests.

use super::pipeline::RequestMiddleware;
use super::request::RetryContext;
use crate::auth::Session;
use crate::traits::{HttpRequest, AUTHORIZATION};

/// Sets `Authorization: Bearer <access token>` from the current session.
///
/// Runs on every attempt, so a replay after a refresh carries the new token.
/// With no access token the request goes out unauthenticated.
#[derive(Debug, Clone)]
pub struct Authenticator {
    session: Session,
}

impl Authenticator {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl RequestMiddleware for Authenticator {
    fn name(&self) -> &'static str {
        "authenticator"
    }

    fn apply(&self, request: &mut HttpRequest, _ctx: &RetryContext) {
        match self.session.access_token() {
            Some(token) => {
                request
                    .headers
                    .insert(AUTHORIZATION.to_string(), format!("Bearer {}", token));
            }
            None => {
                request.headers.remove(AUTHORIZATION);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::traits::Method;

    #[tokio::test]
    async fn test_attaches_current_token() {
        let session = Session::in_memory();
        session.sign_in(Credentials::new("a1", "r1")).await.unwrap();
        let authenticator = Authenticator::new(session.clone());

        let mut request = HttpRequest::new(Method::Get, "http://h/x");
        authenticator.apply(&mut request, &RetryContext::initial());
        assert_eq!(request.bearer_token(), Some("a1"));

        session
            .store_refreshed(crate::auth::RefreshedTokens {
                access_token: "a2".to_string(),
                refresh_token: None,
            })
            .await;
        authenticator.apply(&mut request, &RetryContext::initial().after_auth_replay());
        assert_eq!(request.bearer_token(), Some("a2"));
    }

    #[test]
    fn test_no_token_no_header() {
        let authenticator = Authenticator::new(Session::in_memory());
        let mut request =
            HttpRequest::new(Method::Get, "http://h/x").with_header(AUTHORIZATION, "Bearer stale");

        authenticator.apply(&mut request, &RetryContext::initial());

        assert!(!request.headers.contains_key(AUTHORIZATION));
    }
}
