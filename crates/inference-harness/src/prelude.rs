//! Common imports for typical harness usage.
pub use crate::{
    Harness, HarnessBuilder, HarnessError, ImageInput, InputPart, ModelRef, ProviderId,
    RunBuilder, RunOutput, RunStream, StreamEvent, UsageRecord,
};
