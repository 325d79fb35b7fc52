//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a store.
//!
//! # Tasks
//! - Expiration janitor: reclaims expired entries at configured intervals

pub(crate) mod janitor;
