//! Vendor-specific provider adapters and their `RunBuilder` extensions.
pub mod azure_inference;
