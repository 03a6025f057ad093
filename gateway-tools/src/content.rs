//! Typed content blocks returned by tool invocations.

use serde::{Deserialize, Serialize};

use crate::registry::{ToolError, ToolResult};

/// One block of tool output, tagged with its own discriminant.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text payload.
    Text {
        /// The text content.
        text: String,
    },

    /// Encoded image payload with its MIME type.
    Image {
        /// Base64-encoded image data.
        data: String,
        /// MIME type of the payload.
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentBlock {
    /// Creates a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an image block from base64 data and a MIME type.
    #[must_use]
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Image {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Outcome of one successful tool invocation.
///
/// Produced and consumed within a single request/response cycle; a
/// successful handler yields at least one block.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    content: Vec<ContentBlock>,
}

impl ToolOutput {
    /// Builds an output from the supplied blocks.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Execution`] when the block list is empty.
    pub fn from_blocks(content: Vec<ContentBlock>) -> ToolResult<Self> {
        if content.is_empty() {
            return Err(ToolError::execution("tool produced no content blocks"));
        }
        Ok(Self { content })
    }

    /// Single text block convenience constructor.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Single image block convenience constructor.
    #[must_use]
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::image(data, mime_type)],
        }
    }

    /// Returns the content blocks.
    #[must_use]
    pub fn content(&self) -> &[ContentBlock] {
        &self.content
    }
}
