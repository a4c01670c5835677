//! Zeebe REST gateway integration

mod auth;
mod client;
mod dto;

pub use auth::{OAuthCredentials, TokenProvider};
pub use client::{ZeebeClient, ZeebeClientConfig, RESPONSE_VARIABLE};
