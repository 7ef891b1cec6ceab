//! Sitecraft CMS - ordered collections and bulk table management for the
//! site admin.
//!
//! # Architecture
//!
//! This crate follows hexagonal architecture:
//! - `domain` - Entities, ordering rules, selection state, drag gestures
//! - `ports` - Interfaces to the content database, change feed, and notifications
//! - `application` - The collection Store and the controllers driving it
//! - `adapters` - In-memory and PostgreSQL implementations of the ports
//! - `config` - Environment-driven configuration
//! - `telemetry` - Tracing subscriber setup

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
