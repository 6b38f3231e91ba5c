pub mod aviation_weather;
pub mod error;
pub mod source;
