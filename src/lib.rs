//! A combinational logic-synthesis engine over And-Inverter Graphs: AIGER
//! in/out, structural hashing, level balancing, DAG-aware rewriting,
//! refactoring and resubstitution.

#![allow(clippy::many_single_char_names)]

#[macro_use] extern crate log;

/// Error taxonomy (malformed input, integrity violations, resource
/// exhaustion).
pub mod error;

/// Literals and node ids.
pub mod literal;
/// Node representation.
pub mod node;
/// The strashed AIG store: arena, hash-cons, fanout index.
pub mod store;

/// Truth-table packing and simulation.
pub mod truth;
/// DFS / cone walks.
pub mod dfs;
/// Maximum fanout-free cone labelling.
pub mod mffc;
/// Cut engines (reconvergence-driven, K-feasible).
pub mod cut;

/// NPN canonicalisation of 4-input Boolean functions.
pub mod npn;
/// Irredundant sum-of-products and Boolean factoring.
pub mod isop;

/// Level-balancing pass.
pub mod balance;
/// DAG-aware rewriter.
pub mod rewrite;
/// Cut-based refactoring via ISOP/factored forms.
pub mod refactor;
/// Truth-table-based resubstitution.
pub mod resub;
/// Pass driver: orchestration, finalisation, `zero`.
pub mod driver;

/// AIGER binary/ASCII codec.
pub mod aiger;

/// Shared CLI flag parsing used by the `aiglet`/`aiglet-shell` binaries.
pub mod cliflags;

pub use error::{AigError, AigResult};
pub use literal::{Lit, Var};
pub use store::AigStore;
