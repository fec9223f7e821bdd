//! HTTP client for the Herald synthesis service.
//!
//! Implements [`herald_core::TtsClient`] against the remote TTS endpoint:
//! `POST {base}/synthesize` with `{ text, voice_id, language }`, answered by
//! `{ "audio_url": "..." }`.

#![forbid(unsafe_code)]

mod client;

pub use client::SynthesisClient;
