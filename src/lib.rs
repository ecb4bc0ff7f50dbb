pub mod error;
pub mod gadget;
pub mod logging;
pub mod profile;
pub mod service;
pub mod sink;
