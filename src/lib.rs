pub mod components;
pub mod config;
pub mod error;
pub mod startup;

pub use components::flyer::{convert, FlyerPipeline, Session, SessionState, Upload};
