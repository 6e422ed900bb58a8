pub mod disclosure_pipeline;

pub use disclosure_pipeline::{DisclosurePipeline, RunReport};
