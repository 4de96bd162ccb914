//! Library crate for match-scoring-back: the round-scoring engine, its
//! persistence and backend adapters, and the HTTP layer exposing them.

pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod routes;
pub mod scoring;
pub mod services;
pub mod state;
