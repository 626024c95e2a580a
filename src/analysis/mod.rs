//! Read-only taps on the mixed output.
//!
//! The render thread writes the latest mono mix into a [`scope`] window;
//! the control thread snapshots that window and turns it into a byte
//! magnitude spectrum with [`spectrum::SpectrumAnalyzer`]. Nothing here
//! feeds back into synthesis.

pub mod scope;
pub mod spectrum;

pub use scope::{scope, ScopeReader, ScopeWriter};
pub use spectrum::SpectrumAnalyzer;
