//! AnimeKompi API Library
//!
//! Slug classification, incremental feed collection and the REST surface of
//! the AnimeKompi streaming portal, backed by an upstream catalog API.

pub mod auth;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod seo;
pub mod slug;
pub mod upstream;
