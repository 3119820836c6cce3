//! Narrative-generation collaborator seam
//!
//! The engine never generates prose itself; it hands the rendered summary
//! block to a backend behind this trait and takes back either narrative
//! text with a usage metric or a failure. Real backends (hosted
//! text-generation services) live outside this crate; the mock here keeps
//! tests hermetic.

use crate::error::{Error, Result};

/// A generated narrative and how much it cost to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub text: String,
    /// Token usage reported by the backend, 0 when it reports none
    pub tokens_used: u32,
}

/// Interface to a narrative-generation backend.
///
/// The summary payload is opaque to the backend and the narrative is
/// opaque to the engine; neither side parses the other's text. Backends
/// should be Send + Sync so callers can fan analysis out across records.
pub trait NarrativeBackend: Send + Sync {
    /// Human-readable backend name, for logs
    fn name(&self) -> &str;

    /// Turn a rendered summary block into narrative text.
    fn generate(&self, summary: &str) -> Result<Narrative>;
}

/// Mock narrative backend for testing
///
/// Returns a canned narrative, or a configured failure, without calling
/// any external service.
#[derive(Debug, Clone)]
pub struct MockBackend {
    response: String,
    fail: bool,
}

impl MockBackend {
    /// Create a mock that echoes a fixed narrative
    pub fn new() -> Self {
        Self::with_response("This person is spending within their budget.")
    }

    /// Create a mock with a custom canned narrative
    pub fn with_response(response: &str) -> Self {
        Self {
            response: response.to_string(),
            fail: false,
        }
    }

    /// Create a mock whose `generate` always fails
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            fail: true,
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrativeBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn generate(&self, summary: &str) -> Result<Narrative> {
        if self.fail {
            return Err(Error::Narrative("mock backend configured to fail".to_string()));
        }
        // A rough stand-in for prompt-token accounting
        let tokens_used = summary.split_whitespace().count() as u32;
        Ok(Narrative {
            text: self.response.clone(),
            tokens_used,
        })
    }
}
