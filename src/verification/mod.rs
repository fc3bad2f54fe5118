// file: src/verification/mod.rs
// version: 1.0.0
// guid: 42bea002-f657-49d1-a2ce-bfebf2d8e60f

//! Verification engine: samples live state and classifies it PASS/FAIL

pub mod engine;
pub mod report;

pub use engine::VerificationEngine;
pub use report::{
    CheckResult, CheckStatus, CheckTier, JournalSummary, OverallStatus, VerificationReport,
};
