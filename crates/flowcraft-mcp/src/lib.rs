//! ABOUTME: MCP Client (C1) — typed transport to the Modular Connector Platform

pub mod client;
pub mod config;

pub use client::HttpMcpClient;
pub use config::McpClientConfig;
