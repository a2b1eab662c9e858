//! Authentication endpoints.
//!
//! All of them answer with raw bodies. Login and register opt out of
//! refresh-on-401: a 401 there means bad credentials, not an expired token.

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::credentials::Credentials;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{ApiClient, ApiRequest};
use crate::models::{
    AuthProfile, LoginResponse, LogoutResponse, RegisterResponse, SwitchOrganizationResponse,
};

/// Borrowed view of an [`ApiClient`] exposing `/auth/*`.
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Create an account and sign in with the issued pair.
    ///
    /// POST /auth/register
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> GatewayResult<RegisterResponse> {
        let request = ApiRequest::post("/auth/register")
            .with_json(&json!({ "email": email, "password": password, "name": name }))?
            .without_auth_refresh();
        let response: RegisterResponse = self.client.raw(&request).await?;
        self.client.session().sign_in(response.credentials()).await?;
        Ok(response)
    }

    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> GatewayResult<LoginResponse> {
        let request = ApiRequest::post("/auth/login")
            .with_json(&json!({ "email": email, "password": password }))?
            .without_auth_refresh();
        let response: LoginResponse = self.client.raw(&request).await?;
        self.client.session().sign_in(response.credentials()).await?;
        Ok(response)
    }

    /// Rotate the pair now instead of waiting for a 401.
    ///
    /// Shares an in-flight refresh if one is running and escalates on
    /// failure, exactly like a refresh triggered by a rejected request.
    ///
    /// POST /auth/refresh
    pub async fn refresh(&self) -> GatewayResult<Credentials> {
        self.client
            .refresh_coordinator()
            .refresh()
            .await
            .map_err(GatewayError::Unauthorized)
    }

    /// Revoke the refresh token and sign out locally.
    ///
    /// The local session is cleared whatever the backend answers.
    ///
    /// POST /auth/logout
    pub async fn logout(&self) -> GatewayResult<LogoutResponse> {
        let session = self.client.session();
        let request = ApiRequest::post("/auth/logout")
            .with_json(&json!({ "refreshToken": session.refresh_token() }))?
            .without_auth_refresh();

        let response = match self.client.raw::<Option<LogoutResponse>>(&request).await {
            Ok(body) => body.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "logout request failed, signing out locally");
                LogoutResponse::default()
            }
        };

        session.sign_out().await?;
        info!("logged out");
        Ok(response)
    }

    /// GET /auth/me
    pub async fn me(&self) -> GatewayResult<AuthProfile> {
        self.client.raw(&ApiRequest::get("/auth/me")).await
    }

    /// Switch the organization context and store the pair scoped to it.
    ///
    /// POST /auth/switch-organization
    pub async fn switch_organization<I>(
        &self,
        organization_id: I,
    ) -> GatewayResult<SwitchOrganizationResponse>
    where
        I: Serialize,
    {
        let request = ApiRequest::post("/auth/switch-organization")
            .with_json(&json!({ "organizationId": organization_id }))?;
        let response: SwitchOrganizationResponse = self.client.raw(&request).await?;
        self.client.session().sign_in(response.credentials()).await?;
        info!(organization = %response.organization.id, "switched organization");
        Ok(response)
    }
}
