pub mod error;
pub mod history;
pub mod query;
pub mod request;
pub mod service;
pub mod store;
pub mod utils;
