//! OKX module - REST trading client and public WebSocket transport for the v5 API

pub mod auth;
pub mod messages;
pub mod rest;
pub mod websocket;

pub use rest::OkxRestClient;
pub use websocket::OkxWebSocketTransport;
