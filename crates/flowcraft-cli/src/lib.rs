//! ABOUTME: Operator CLI (`flowcraft`) — argument parsing plus command
//! ABOUTME: implementations, both exposed for the binary and for CLI tests

pub mod cli;
pub mod commands;
