pub mod status;
pub mod user;
pub mod workflow;
