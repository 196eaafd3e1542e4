//! The tool catalogue exposed to the model and the collaborators it drives.

pub mod chart;
pub mod finance;
pub mod hand;
pub mod page;
pub mod presentation;
