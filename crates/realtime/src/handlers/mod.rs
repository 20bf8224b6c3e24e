//! HTTP-adjacent handlers `quizbattle-api` mounts alongside its own routes.

pub mod ws;

pub use ws::router;
