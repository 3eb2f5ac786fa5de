//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - health check, analysis endpoint and static vocabulary/schema
//!   documents
//! - `plugins` - plugin listing, detail and lifecycle endpoints

pub mod api;
pub mod plugins;
