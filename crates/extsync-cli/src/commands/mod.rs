pub mod deploy;
pub mod plan;
pub mod types;
