pub mod aggregate;
pub mod error;
pub mod fetch;
pub mod local_day;
pub mod window;
