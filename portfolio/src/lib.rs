//! portfolio - chapter outline editor and exporter for portfolio documents
//!
//! A portfolio is a title page plus an ordered list of chapters. Each
//! chapter carries a dash-separated hierarchy number ("1", "1-2", "1-2-1")
//! and the outline keeps those numbers gap-free across every add, delete,
//! move, indent, outdent and clone. Chosen chapters can be exported as a
//! ZIP of images, a PDF or a DOCX file.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::enum_variant_names)]

pub mod announcer;
pub mod config;
pub mod dictionary;
pub mod document;
pub mod export;
pub mod outline;
pub mod portfolio;

pub use announcer::Announcer;
pub use config::{ConfigError, PortfolioConfig};
pub use dictionary::Dictionary;
pub use document::{DocumentError, PortfolioDocument};
pub use outline::{HeaderFooter, HierarchyPath, Outline, Rejection};
pub use portfolio::{ConfirmDialog, Portfolio};
