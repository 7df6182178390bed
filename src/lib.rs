pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod events;
pub mod repository;
pub mod service;
pub mod uploads;
