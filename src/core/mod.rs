pub mod config;
pub mod constants;
pub mod dashboard;
pub mod geo;
pub mod html;
pub mod viewport;
