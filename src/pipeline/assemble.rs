//! Request assembly: instruction + admitted text + optional image.
//!
//! The assembled [`BackendRequest`] is provider-neutral. Each
//! [`crate::pipeline::llm::SummaryBackend`] maps it onto its own wire format
//! as two roles: a system message carrying the instruction and a user message
//! carrying the text plus at most one inlined image.

use crate::config::TokenBudget;
use crate::pipeline::merge::{Attachment, SummaryRequest};

/// Sampling temperature for every summary. Generation is fully deterministic.
pub const TEMPERATURE: f32 = 0.0;

/// A provider-neutral summarization request.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    /// System role content.
    pub instruction: String,
    /// User role text.
    pub user_text: String,
    /// User role image, at most one.
    pub image: Option<Attachment>,
    pub max_output_tokens: usize,
    pub temperature: f32,
}

/// Build the backend request for an admitted [`SummaryRequest`].
pub fn assemble(
    instruction: String,
    request: &SummaryRequest,
    budget: &TokenBudget,
) -> BackendRequest {
    BackendRequest {
        instruction,
        user_text: request.merged_text.clone(),
        image: request.attachment.clone(),
        max_output_tokens: budget.max_output_tokens,
        temperature: TEMPERATURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(attachment: Option<Attachment>) -> SummaryRequest {
        SummaryRequest {
            merged_text: "Order #1 $9.99".into(),
            source_url: "amazon.com/your-orders".into(),
            attachment,
            additional_instructions: None,
        }
    }

    #[test]
    fn carries_budget_cap_and_zero_temperature() {
        let budget = TokenBudget {
            max_output_tokens: 321,
            ..TokenBudget::default()
        };
        let r = assemble("sys".into(), &request(None), &budget);
        assert_eq!(r.instruction, "sys");
        assert_eq!(r.user_text, "Order #1 $9.99");
        assert_eq!(r.max_output_tokens, 321);
        assert_eq!(r.temperature, 0.0);
        assert!(r.image.is_none());
    }

    #[test]
    fn carries_single_image() {
        let img = Attachment::from_bytes(b"\x89PNG\r\n\x1a\nxx".to_vec());
        let r = assemble("sys".into(), &request(Some(img.clone())), &TokenBudget::default());
        assert_eq!(r.image, Some(img));
    }
}
