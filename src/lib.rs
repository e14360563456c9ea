//! # qagen
//!
//! Batch question/answer generation from PDF documents.
//!
//! Every PDF in an input directory goes through the same pipeline: the
//! leading pages are extracted, the text is upserted into a shared
//! similarity index, the most similar stored texts are pulled back as
//! context, a prompt is sent to a local chat model, and the model's
//! answer is written to `<output_dir>/<file>.pdf.json`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────── task (per file) ───────────────────────┐
//! │  batch   │──▶│ extract ─▶ index upsert/query ─▶ prompt ─▶ generate ─▶ artifact │
//! │ (pool)   │   └──────────────┬──────────────────────────────┬──────────────────┘
//! └──────────┘                  ▼                              ▼
//!                        ┌─────────────┐                ┌────────────┐
//!                        │ memory or   │                │ /api/chat  │
//!                        │ SQLite store│                │  (Ollama)  │
//!                        └─────────────┘                └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! qagen init                         # create/open the index collection
//! qagen run ./data/pdf               # generate Q&A for every PDF
//! qagen query "connective tissue"    # inspect the index
//! qagen prompt ./data/pdf/paper.pdf  # show the prompt for one file
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF text extraction with a page cap |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Similarity index over memory or SQLite stores |
//! | [`prompt`] | Question-generation prompt |
//! | [`generate`] | Chat model client |
//! | [`artifact`] | Output file rendering and writing |
//! | [`task`] | The per-file state machine |
//! | [`batch`] | Discovery and the bounded worker pool |
//! | [`progress`] | Progress reporting on stderr |
//! | [`logging`] | Log file subscriber |

pub mod artifact;
pub mod batch;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generate;
pub mod index;
pub mod logging;
pub mod models;
pub mod progress;
pub mod prompt;
pub mod task;
