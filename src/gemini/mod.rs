//! Gemini transport: wire types, SSE decoding and the HTTP client.

pub mod client;
pub mod sse;
pub mod types;

use std::future::Future;

use futures::stream::BoxStream;

use crate::error::GemimgError;
use crate::request::GenerationRequest;

pub use client::{ClientSettings, GeminiClient};

/// Response units of a streamed call, in arrival order.
pub type UnitStream = BoxStream<'static, Result<types::GenerateContentResponse, GemimgError>>;

/// What came back from one call, shaped by the request's [`crate::request::CallShape`].
pub enum ResponseBody {
    /// A single composite result
    Composite(types::GenerateContentResponse),
    /// Incremental units, consumed one at a time
    Streamed(UnitStream),
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Composite(unit) => f.debug_tuple("Composite").field(unit).finish(),
            Self::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

/// Anything that can carry an assembled request to the model.
pub trait GenerationBackend {
    /// Issues one call for `request`.
    fn send(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<ResponseBody, GemimgError>> + Send;
}
