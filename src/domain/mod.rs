// Domain layer: disclosure models and ports (interfaces) shared by adapters and pipelines.

pub mod disclosure;
pub mod model;
pub mod ports;
