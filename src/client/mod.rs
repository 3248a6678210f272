//! Client for the account endpoints.
//!
//! The transport (`AuthApi`), loading notifications (`RequestNotifier`) and
//! token storage (`CredentialStore`) are independent pieces; wrap any
//! `AuthApi` in `Notifying` to observe its requests.

pub mod credentials;
pub mod http;
pub mod notifier;

pub use credentials::{
    login_with_form, logout, register_with_form, restore_session, CredentialStore, MemoryCredentialStore,
};
pub use http::{AuthApi, ClientError, HttpAuthClient};
pub use notifier::{Notifying, Operation, RequestEvent, RequestNotifier};
