pub use self::{
    extract::extract,
    load::load,
    pipeline::{run_pipeline, with_retry, PipelineReport, PipelineState, RetryPolicy},
};

mod extract;
mod load;
mod pipeline;
