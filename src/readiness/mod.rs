// src/readiness/mod.rs

//! Readiness decisions for a run.
//!
//! - `resolver`: which steps of a run can be processed now.
//! - `eligible`: the resolution result types.
//! - `window`: which downstream launch windows are complete.

pub mod eligible;
pub mod resolver;
pub mod window;

pub use eligible::{BootstrapState, Deferral, DeferralReason, EligibleSet, Resolution};
pub use resolver::{Resolver, TimeSettings};
pub use window::{LaunchSettings, LaunchWindow, SourceStep, WindowStatus};
