pub mod error;
pub mod paging;
pub mod posts;
pub mod search;
