//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use super::types::DocumentFormat;

/// An external tool that can convert documents between formats.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Returns the name of this backend implementation.
    fn name(&self) -> &str;

    /// Returns the tool's version string.
    ///
    /// Fails with [`ConverterError::PandocNotFound`] when the binary is missing.
    async fn version(&self) -> Result<String, ConverterError>;

    /// Converts a file and returns the converted text.
    async fn convert_to_string(
        &self,
        input: &Path,
        from: &DocumentFormat,
        to: &DocumentFormat,
        args: &[String],
    ) -> Result<String, ConverterError>;

    /// Converts a file, writing the result to `output`.
    async fn convert_to_file(
        &self,
        input: &Path,
        from: &DocumentFormat,
        to: &DocumentFormat,
        output: &Path,
        args: &[String],
    ) -> Result<(), ConverterError>;
}
