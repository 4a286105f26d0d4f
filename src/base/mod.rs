//! Core components, types, and utilities for the postmaster bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Draft directives and canned replies.
//! - Day boundary computation.
//! - Common types and result handling.

pub mod config;
pub mod day;
pub mod prompts;
pub mod types;
