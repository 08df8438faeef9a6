//! Gemini `generateContent` wire types.
//!
//! Docs: https://ai.google.dev/api/generate-content

use serde::{Deserialize, Serialize};

use crate::constants::{RESPONSE_MODALITIES, STREAMING_IMAGE_SIZE};
use crate::request::{CallShape, GenerationRequest};

/// Untagged union of text and inline media request parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Prompt text
    Text {
        /// The text itself
        text: String,
    },
    /// Base64 image payload
    InlineData {
        /// Media type and data
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// e.g. `image/png`
    #[serde(default)]
    pub mime_type: String,
    /// Standard base64 without line breaks
    #[serde(default)]
    pub data: String,
}

/// Request body for `generateContent` and `streamGenerateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: &'a [Part],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
    image_size: &'static str,
}

impl<'a> From<&'a GenerationRequest> for GenerateContentRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        let image_config = match request.shape {
            CallShape::Composite => None,
            CallShape::Streaming { aspect_ratio } => Some(ImageConfig {
                aspect_ratio: aspect_ratio.as_str(),
                image_size: STREAMING_IMAGE_SIZE,
            }),
        };
        Self {
            contents: [Content {
                role: "user",
                parts: &request.parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: RESPONSE_MODALITIES,
                image_config,
            },
        }
    }
}

/// One response unit: the whole result, or one chunk of a stream.
///
/// Every level is optional; stream chunks regularly omit them.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate completions; only the first is used
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

/// Candidate completion item returned by Gemini.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content
    #[serde(default)]
    pub content: Option<ResponseContent>,
    /// Why generation stopped, e.g. `STOP` or `SAFETY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Content container on the response side.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResponseContent {
    /// Parts in model order
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

/// A response part; any field may be missing.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    /// Commentary text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl ResponsePart {
    /// A text-only part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// An image part carrying already-encoded base64 data.
    pub fn image(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

impl GenerateContentResponse {
    /// A unit whose first candidate carries `parts`.
    pub fn with_parts(parts: Vec<ResponsePart>) -> Self {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(ResponseContent { parts: Some(parts) }),
                finish_reason: None,
            }]),
        }
    }

    /// Parts of the first candidate, empty when any level is missing.
    pub fn parts(&self) -> &[ResponsePart] {
        self.candidates
            .as_deref()
            .and_then(<[Candidate]>::first)
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.as_deref())
            .unwrap_or_default()
    }

    /// Finish reason of the first candidate, if reported.
    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .as_deref()
            .and_then(<[Candidate]>::first)
            .and_then(|candidate| candidate.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::request::AspectRatio;

    fn request(shape: CallShape) -> GenerationRequest {
        GenerationRequest {
            parts: vec![
                Part::Text {
                    text: "a cube".to_string(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: "image/png".to_string(),
                        data: "AAAA".to_string(),
                    },
                },
            ],
            shape,
            references: Vec::new(),
        }
    }

    #[test]
    fn streaming_body_carries_image_config() {
        let request = request(CallShape::Streaming {
            aspect_ratio: AspectRatio::Wide16x9,
        });
        let body = serde_json::to_value(GenerateContentRequest::from(&request)).expect("json");
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "a cube"},
                        {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}
                    ]
                }],
                "generationConfig": {
                    "responseModalities": ["IMAGE", "TEXT"],
                    "imageConfig": {"aspectRatio": "16:9", "imageSize": "1K"}
                }
            })
        );
    }

    #[test]
    fn composite_body_has_no_image_config() {
        let request = request(CallShape::Composite);
        let body = serde_json::to_value(GenerateContentRequest::from(&request)).expect("json");
        assert!(body["generationConfig"].get("imageConfig").is_none());
    }

    #[test]
    fn null_fields_decode_to_empty_parts() {
        for raw in [
            r#"{}"#,
            r#"{"candidates": null}"#,
            r#"{"candidates": [{"content": null}]}"#,
            r#"{"candidates": [{"content": {"parts": null}, "finishReason": "STOP"}]}"#,
            r#"{"candidates": [], "usageMetadata": {"totalTokenCount": 3}}"#,
        ] {
            let unit: GenerateContentResponse = serde_json::from_str(raw).expect("decode");
            assert!(unit.parts().is_empty(), "{raw}");
        }
    }

    #[test]
    fn decodes_mixed_parts() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[
            {"text":"Here you go"},
            {"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}}
        ]},"finishReason":"STOP"}]}"#;
        let unit: GenerateContentResponse = serde_json::from_str(raw).expect("decode");
        let parts = unit.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text.as_deref(), Some("Here you go"));
        assert_eq!(
            parts[1].inline_data.as_ref().map(|d| d.mime_type.as_str()),
            Some("image/png")
        );
        assert_eq!(unit.finish_reason(), Some("STOP"));
    }
}
