// Library exports for nurture
// Integration tests build the router through these modules

pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod extractors;
pub mod messaging;
pub mod moderation;
pub mod notifications;
pub mod routes;
pub mod seed;
pub mod state;
