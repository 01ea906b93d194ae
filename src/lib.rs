//! Task Chat Bot Library
//!
//! This module exports the core components for testing and integration.

pub mod bot;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod interpreter;
pub mod llm;
pub mod logging;
pub mod service;
pub mod types;
