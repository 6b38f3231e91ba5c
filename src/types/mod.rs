pub mod categories;
pub mod circle;
pub mod geo;
pub mod observation;
pub mod report;
pub mod station;
