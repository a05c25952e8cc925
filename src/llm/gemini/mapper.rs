//! Mapping between abstraction types and Gemini types

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::llm::core::{
    config::GenerationConfig,
    types::{
        ContentBlock, FinishReason, GenerateRequest, GenerateResponse, Message, MessageRole,
        StreamEvent, UsageMetadata,
    },
};

use super::types::{
    Blob, Content, GeminiGenerationConfig, GenerateContentRequest, GenerateContentResponse, Part,
    SystemInstruction, UsageMetadata as GeminiUsage,
};

/// Convert our abstraction request to Gemini's request format
pub fn to_gemini_request(request: GenerateRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request.messages.into_iter().map(to_gemini_content).collect(),
        system_instruction: request.system.map(|s| SystemInstruction {
            parts: vec![Part::Text { text: s }],
        }),
        generation_config: to_gemini_generation_config(request.config),
    }
}

/// Convert a message to Gemini's content format
fn to_gemini_content(message: Message) -> Content {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
    };

    Content {
        role: role.to_string(),
        parts: message.content.into_iter().map(to_gemini_part).collect(),
    }
}

/// Convert a content block to a Gemini part
fn to_gemini_part(block: ContentBlock) -> Part {
    match block {
        ContentBlock::Text { text } => Part::Text { text },
        ContentBlock::Image { mime_type, data } => Part::InlineData {
            inline_data: Blob {
                mime_type,
                data: STANDARD.encode(&data),
            },
        },
    }
}

/// Convert generation config to Gemini's format; `None` when nothing is set
fn to_gemini_generation_config(config: GenerationConfig) -> Option<GeminiGenerationConfig> {
    if config.max_tokens.is_none() && config.temperature.is_none() {
        return None;
    }
    Some(GeminiGenerationConfig {
        max_output_tokens: config.max_tokens,
        temperature: config.temperature,
    })
}

/// Convert one Gemini response chunk into stream events
///
/// Text parts become `TextDelta`s; a finish reason on the first candidate
/// closes the message.
pub fn from_gemini_response(response: GenerateContentResponse) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    let Some(candidate) = response.candidates.first() else {
        return events;
    };

    for part in &candidate.content.parts {
        if let Part::Text { text } = part {
            events.push(StreamEvent::TextDelta { text: text.clone() });
        }
    }

    if let Some(finish_reason) = &candidate.finish_reason {
        events.push(StreamEvent::MessageEnd {
            finish_reason: map_finish_reason(finish_reason),
            usage: map_usage(response.usage_metadata.as_ref()),
        });
    }

    events
}

/// Convert a complete (non-streamed) Gemini response
pub fn to_generate_response(response: GenerateContentResponse) -> GenerateResponse {
    GenerateResponse {
        text: response.text(),
        finish_reason: response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .map(map_finish_reason),
        usage: response.usage_metadata.as_ref().map(|u| map_usage(Some(u))),
    }
}

fn map_usage(usage: Option<&GeminiUsage>) -> UsageMetadata {
    match usage {
        Some(usage) => UsageMetadata {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        },
        None => UsageMetadata::default(),
    }
}

/// Map Gemini's finish reason to our abstraction
fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" => FinishReason::Safety,
        other => FinishReason::Other(other.to_string()),
    }
}
