//! LSP protocol feature implementations.
//!
//! The whole command/UI surface of the engine goes through
//! workspace/executeCommand; this module holds argument parsing and result
//! shaping for those commands.

mod commands;

pub use commands::{
    all_commands, list_result, toggle_all_result, toggle_at_point_result, CommandArgs, LIST,
    TOGGLE_ALL, TOGGLE_AT_POINT,
};
