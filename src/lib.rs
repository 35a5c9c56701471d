/// Database layer: open, migrate, CRUD, tag lifecycle.
pub mod db;
/// Data types: Post, Tag, Section, request payloads, filters.
pub mod models;
/// Axum-based JSON API server and router.
pub mod web;
