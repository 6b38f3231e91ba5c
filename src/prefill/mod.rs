pub mod canonical;
pub mod merge;
