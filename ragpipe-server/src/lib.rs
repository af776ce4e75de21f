//! # ragpipe-server
//!
//! JSON-over-HTTP surface for a [`ragpipe_rag::RagPipeline`] and a
//! [`ragpipe_eval::Evaluator`]. Every route answers with an
//! [`ApiResponse`] envelope.

pub mod protocol;
pub mod server;

pub use protocol::{ApiResponse, AskRequest};
pub use server::{AppState, ServerConfig, app_router, run_server};
