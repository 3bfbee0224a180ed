// passfill shared type definitions
// Each submodule defines types used across the client.

pub mod credential;
pub mod dom;
pub mod errors;
pub mod message;
pub mod settings;
pub mod tab;
