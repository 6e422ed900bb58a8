pub mod amounts;
pub mod career;
pub mod etl;
pub mod executives;
pub mod export;
pub mod summary;

pub use crate::domain::model::{ExtractResult, TransformResult};
pub use crate::domain::ports::{ConfigProvider, DisclosureApi, Pipeline, Storage};
pub use crate::utils::error::Result;
