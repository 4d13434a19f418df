//! Interactive console.
//!
//! Organized along FP/Unix boundaries:
//! - `state`: pure data types (Menu, NavigationState, App, Action)
//! - `update`: pure transitions, (App, Action) → Transition
//! - `view`: pure rendering, App → frame
//! - `registry`: item id → handler dispatch
//! - `input`, `terminal`, `run`: effects (keys, terminal mode, main loop)

pub mod input;
pub mod registry;
pub mod run;
pub mod state;
pub mod terminal;
pub mod theme;
pub mod update;
pub mod view;
