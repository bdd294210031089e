//! API Module
//!
//! HTTP handlers and routing for the snapshot service.
//!
//! # Endpoints
//! - `GET /snapshot` - Last-known keyspace snapshot
//! - `POST /refresh` - Take a snapshot now
//! - `GET /settings` / `PUT /settings` - Auto-refresh toggle and interval
//! - `GET /stats` - Poll statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
