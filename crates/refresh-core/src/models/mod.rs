pub mod account;
pub mod api_target;
pub mod manifest;
pub mod project;
pub mod target;
