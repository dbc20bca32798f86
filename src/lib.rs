//! # lexalign
//!
//! Semantic cross-referencing of draft legislation against current law.
//!
//! Given two versions of a legal text — a draft (anteproyecto) and the law
//! in force — each decomposed into structural units (articles, provisions)
//! over a flat paragraph store, lexalign computes a best-effort alignment
//! between corresponding units at two granularities: article level and
//! paragraph level. Similarity comes from embedding vectors obtained from
//! an OpenAI-compatible endpoint; candidates are filtered by threshold,
//! with a fallback-to-best policy so every draft unit reaches human review
//! with at least one candidate correspondence.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐   ┌───────────┐
//! │ JSON corpora │──▶│ Reconstructor │──▶│ Matcher        │──▶│ mappings/ │
//! │ units+paras  │   │ range joins  │   │ embed+compare │   │ *.json    │
//! └──────────────┘   └──────────────┘   └───────────────┘   └───────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | Tolerant JSON loading and saving |
//! | [`reconstruct`] | Hierarchical text reconstruction |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`similarity`] | Cosine similarity |
//! | [`matcher`] | Unit and paragraph cross-reference matching |
//! | [`transform`] | Output Mapping reshaping |
//! | [`tasks`] | Mapping task list and batch driver |
//! | [`progress`] | Stderr progress reporting |

pub mod config;
pub mod embedding;
pub mod loader;
pub mod matcher;
pub mod models;
pub mod progress;
pub mod reconstruct;
pub mod similarity;
pub mod tasks;
pub mod transform;
