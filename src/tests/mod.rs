//! Consolidated test modules.
//!
//! End-to-end tests that exercise the engine against a mocked Gemini
//! endpoint.
