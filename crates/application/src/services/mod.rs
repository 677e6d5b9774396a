//! Application services

mod speech_pipeline;

pub use speech_pipeline::{
    BlockReceiver, BlockSender, CancellationFlag, HandoffClosed, PipelineConfig, PipelineMode,
    PipelineReport, PipelineResult, PipelineState, SpeechPipeline, handoff_queue,
};
