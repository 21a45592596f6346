//! Finance Dialog Orchestrator
//!
//! A turn-based dialog engine for a personal finance assistant:
//! - Intent-driven finite-state machine with conditional transitions
//! - Slot extraction, validation, and enrichment pipeline
//! - Chained action execution with result-code routing
//! - Multi-strategy response generation with fallback handling
//!
//! TURN PIPELINE:
//! UTTERANCE → NLU → SLOT PIPELINE → TRANSITION → (ACTION CHAIN) → RESPONSE

pub mod api;
pub mod config;
pub mod context;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod finance;
pub mod nlu;
pub mod registry;

pub use error::{DialogError, Result};

// Re-export common types
pub use config::{FallbackBehavior, FlowConfig, StateDefinition, StateKind, TransitionRule};
pub use context::{DialogContext, SlotValue, TurnRecord};
pub use engine::DialogEngine;
pub use nlu::{NluClient, NluPrediction};
pub use registry::Registries;
