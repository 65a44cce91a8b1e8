//! Postcache: a read-through caching proxy for the Ghost content API.
//!
//! Listing, search, single-post and tag requests are answered from memory
//! whenever possible. A signed webhook from Ghost clears everything and
//! rebuilds the post snapshot used for local search.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
