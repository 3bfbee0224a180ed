//! passfill: a credential autofill client for a local password manager.
//!
//! The background relay fetches credentials over HTTP or native messaging,
//! a content script fills them into the page, and the popup drives the flow.
//! This library crate exposes all modules for the binaries and integration tests.

pub mod app;
pub mod database;
pub mod logging;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
