//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep request boundaries decoupled from storage details.

pub mod roster_service;
