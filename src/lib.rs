//! RAG Questions · question generation and grading backend
//!
//! An axum service that asks a retrieval-augmented agent for MCQ, subjective
//! and coding questions grounded in a course PDF, grades answers, and checks
//! (and minimally repairs) every agent reply before it reaches the caller.

pub mod agent;
pub mod config;
pub mod error;
pub mod index;
pub mod logic;
pub mod openai;
pub mod policy;
pub mod prompts;
pub mod protocol;
pub mod routes;
pub mod schema;
pub mod state;
pub mod telemetry;
pub mod util;
pub mod validate;
