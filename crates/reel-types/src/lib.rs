//! Wire types shared by the reel HTTP API, its persistence layer and clients.

pub mod api;
pub mod models;
