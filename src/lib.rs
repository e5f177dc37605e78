//! # SocialHive Server Library
//!
//! This crate provides the SocialHive backend core: a real-time chat
//! relay with:
//! - A WebSocket endpoint that binds each connection to an authenticated
//!   identity and fans chat events out to the right peers
//! - Durable message records in PostgreSQL
//! - REST access to conversation history
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core entities and store traits
//! - **Infrastructure Layer**: Database and metrics implementations
//! - **Presentation Layer**: HTTP handlers, middleware, and the relay
//!
//! ## Module Structure
//!
//! ```text
//! socialhive/
//! +-- config/        Configuration management
//! +-- domain/        Domain entities and store traits
//! +-- infrastructure/ Database repositories and metrics
//! +-- presentation/  HTTP routes, middleware, and the chat relay
//! +-- shared/        Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business types
pub mod domain;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and the chat relay
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
