//! # Route Modules
//!
//! Each module defines an Axum router for one component. Routers are
//! merged in [`crate::app`].

pub mod credentials;
pub mod dids;
pub mod holder;
pub mod presentations;
pub mod verify;
