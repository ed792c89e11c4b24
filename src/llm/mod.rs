//! Language model collaborators.
//!
//! - [`provider`]: the [`ReplyGenerator`] and [`LabelGenerator`] traits.
//! - [`openai`] / [`gemini`]: hosted model adapters implementing both.
//! - [`generator`]: the generation stage (timeout, cleaning, fallback).

pub mod gemini;
pub mod generator;
pub mod message;
pub mod openai;
pub mod provider;

pub use gemini::{GeminiClient, GeminiConfig};
pub use generator::{GeneratedReply, ResponseGenerator, clean_reply, fallback_reply};
pub use message::{Message, Role};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use provider::{LabelGenerator, ReplyGenerator};
