//! Mock-interview client library.
//!
//! A candidate answers AI-generated interview questions by voice (and
//! optionally by code) while a synthetic interviewer reads each question
//! aloud.  All turn-taking logic lives in this client; the remote question
//! service only exchanges an answer for the next question.
//!
//! Subsystems:
//! * [`session`]  — the [`SessionController`](session::SessionController)
//!   state machine that sequences capture, playback, and service calls.
//! * [`capture`]  — continuous voice-to-text capture behind a backend trait.
//! * [`playback`] — one-utterance-at-a-time text-to-speech behind a backend
//!   trait.
//! * [`service`]  — the remote question-generation boundary (HTTP).
//! * [`config`]   — TOML settings and platform paths.

pub mod capture;
pub mod config;
pub mod playback;
pub mod service;
pub mod session;
