//! The posting workflow: a strict linear pipeline with early-exit branches.
//!
//! `FilterRows` runs once per run; each row then flows through
//! `GenerateCaption → PostInstagram → PostFacebook → ClearRow` and loops back
//! for the next row. A failed publish ends the run without clearing, so the
//! row is re-picked-up unchanged next time.

pub mod engine;

pub use engine::{transition, RunReport, Step, Workflow, DEFAULT_MAX_STEPS};
