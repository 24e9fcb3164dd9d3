// Export components
pub mod flyer;

// Re-export the pipeline facade
pub use flyer::FlyerPipeline;
