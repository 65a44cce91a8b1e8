pub mod error;
pub mod filter;
pub mod projection;
pub mod upstream;
pub mod webhook;
