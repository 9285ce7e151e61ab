//! HTTP API: dashboard serializers, view-sets, routing and configuration.

pub mod app;
pub mod config;
