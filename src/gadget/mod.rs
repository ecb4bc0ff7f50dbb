mod controller;
pub mod tree;

pub use controller::{Controller, DEFAULT_SEQUENCE, Phase};
