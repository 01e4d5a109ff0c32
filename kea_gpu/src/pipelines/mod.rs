mod pipeline;
mod pipeline_layout;

pub use pipeline::Pipeline;
pub use pipeline_layout::PipelineLayout;
