//! Text-generation model client for the Postforge pipeline.
//!
//! The pipeline treats the model as a black box: a prompt goes in, free-form
//! text comes out. [`TextModel`] is that boundary; [`GeminiModel`] speaks the
//! Google Generative Language HTTP API, and [`ScriptedModel`] replays canned
//! responses for offline runs and tests.

pub mod gemini;
pub mod model;
pub mod scripted;

pub use gemini::GeminiModel;
pub use model::{DynModel, TextModel};
pub use scripted::ScriptedModel;
