//! Bridgeway - Q&A backend connecting seniors who ask with youth who answer
//!
//! Seniors post questions; youth browse pending questions and answer them;
//! the senior accepts one answer with a satisfaction rating, which credits
//! points to the youth's ledger and closes the question.
//!
//! ## Services
//!
//! - **Auth**: account registration and JWT sessions (argon2 + HS256)
//! - **Directory**: lazy role-tagged profile creation from the login surface
//! - **Questions/Answers**: the Q&A lifecycle stores
//! - **Acceptance**: the state machine selecting a winning answer
//! - **Points**: append-only EARN/USE ledger with fold-based balances
//! - **Events**: WebSocket change feed driving client re-fetches
//! - **Sweep**: periodic repair of two-row-write residue

pub mod acceptance;
pub mod answers;
pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod events;
pub mod points;
pub mod questions;
pub mod routes;
pub mod server;
pub mod sweep;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{BridgewayError, Result};
