//! Authentication for the Twitter API.
//!
//! All tracked operations use application-only auth: a bearer token sent in
//! the `Authorization` header. Obtaining the token (the OAuth dance) is out
//! of scope; the credential types here only hold and redact it.

mod credentials;

pub use credentials::{BearerToken, CredentialsProvider, EnvCredentials, StaticCredentials};
