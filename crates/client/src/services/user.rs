//! User service: registration, login, and profile.
//!
//! Passwords and tokens travel as [`SecretString`] and are only exposed
//! while the request body is being serialized.

use std::fmt;

use emporium_core::{Email, ProfileUpdate, User};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::call;
use crate::api::{ApiRequest, Transport};
use crate::error::ApiError;

/// Login credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: Email, password: impl Into<String>) -> Self {
        Self {
            email,
            password: SecretString::from(password.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// New account details for `POST /users/register`.
#[derive(Clone)]
pub struct Registration {
    pub email: Email,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .field("address", &self.address)
            .finish()
    }
}

/// Successful register or login: the profile plus its bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: SecretString,
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationBody<'a> {
    email: &'a str,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
}

#[derive(Deserialize)]
struct AuthResponse {
    user: User,
    #[serde(alias = "accessToken")]
    token: String,
}

impl From<AuthResponse> for AuthSession {
    fn from(response: AuthResponse) -> Self {
        Self {
            user: response.user,
            token: SecretString::from(response.token),
        }
    }
}

/// Create an account. `POST /users/register`
///
/// # Errors
///
/// Returns an error if the request fails or the response lacks a user and token.
#[instrument(skip(api, registration), fields(email = %registration.email))]
pub async fn register<T: Transport>(
    api: &T,
    registration: &Registration,
) -> Result<AuthSession, ApiError> {
    let body = RegistrationBody {
        email: registration.email.as_str(),
        password: registration.password.expose_secret(),
        first_name: &registration.first_name,
        last_name: &registration.last_name,
        phone: registration.phone.as_deref(),
        address: registration.address.as_deref(),
    };
    let response: AuthResponse = call(api, ApiRequest::post("/users/register", &body)?).await?;
    Ok(response.into())
}

/// Exchange credentials for a session. `POST /users/login`
///
/// # Errors
///
/// Returns an error if the request fails or the response lacks a user and token.
#[instrument(skip(api, credentials), fields(email = %credentials.email))]
pub async fn login<T: Transport>(
    api: &T,
    credentials: &Credentials,
) -> Result<AuthSession, ApiError> {
    let body = CredentialsBody {
        email: credentials.email.as_str(),
        password: credentials.password.expose_secret(),
    };
    let response: AuthResponse = call(api, ApiRequest::post("/users/login", &body)?).await?;
    Ok(response.into())
}

/// Profile of the token holder. `GET /users/profile`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a user.
#[instrument(skip(api))]
pub async fn get_profile<T: Transport>(api: &T) -> Result<User, ApiError> {
    call(api, ApiRequest::get("/users/profile")).await
}

/// Change profile fields. `PUT /users/profile`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a user.
#[instrument(skip(api, update))]
pub async fn update_profile<T: Transport>(api: &T, update: &ProfileUpdate) -> Result<User, ApiError> {
    call(api, ApiRequest::put("/users/profile", update)?).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;

    fn user_json() -> serde_json::Value {
        json!({"id": 5, "email": "ada@example.com", "firstName": "Ada", "lastName": "Lovelace"})
    }

    #[tokio::test]
    async fn test_login_sends_credentials_and_decodes_session() {
        let api = FakeTransport::new();
        api.respond(json!({"user": user_json(), "token": "jwt-1"}));

        let credentials = Credentials::new(Email::parse("ada@example.com").unwrap(), "hunter2");
        let session = login(&api, &credentials).await.unwrap();

        assert_eq!(session.user.first_name, "Ada");
        assert_eq!(session.token.expose_secret(), "jwt-1");
        let sent = api.requests();
        assert_eq!(sent[0].path, "/users/login");
        assert_eq!(
            sent[0].body,
            Some(json!({"email": "ada@example.com", "password": "hunter2"}))
        );
    }

    #[tokio::test]
    async fn test_register_omits_missing_optionals() {
        let api = FakeTransport::new();
        api.respond(json!({"user": user_json(), "accessToken": "jwt-2"}));

        let registration = Registration {
            email: Email::parse("ada@example.com").unwrap(),
            password: SecretString::from("hunter2"),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            address: None,
        };
        let session = register(&api, &registration).await.unwrap();

        assert_eq!(session.token.expose_secret(), "jwt-2");
        let body = api.requests()[0].body.clone().unwrap();
        assert_eq!(body["firstName"], "Ada");
        assert!(body.get("phone").is_none());
    }

    #[tokio::test]
    async fn test_login_response_without_token_is_parse_error() {
        let api = FakeTransport::new();
        api.respond(json!({"user": user_json()}));

        let credentials = Credentials::new(Email::parse("ada@example.com").unwrap(), "pw");
        let err = login(&api, &credentials).await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let credentials = Credentials::new(Email::parse("ada@example.com").unwrap(), "hunter2");
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }
}
