//! External collaborators behind trait seams: the inference backend and the
//! raw video source. Each has one HTTP-backed implementation and one fake
//! for offline use and tests.

pub mod llm;
pub mod source;
