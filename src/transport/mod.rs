//! Connection plumbing: the peer/data-channel seams and the HTTP adapters used to
//! bootstrap a session.

pub mod backend;
pub mod peer;
pub mod rest;
