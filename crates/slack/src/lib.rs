//! Slack integration for shotbot
//!
//! This crate provides everything that speaks Slack:
//! - **Events** (`events`) - Events API payload decoding and message handling
//! - **Commands** (`commands`) - `shot`, `score`, `limit`, `limit <N>`, `leaderboard`, `reset`
//! - **Block Kit** (`blocks`) - reply templates and the leaderboard table
//! - **Web API** (`web`) - `users.info` / `conversations.info` lookups
//! - **Webhooks** (`webhook`) - reply delivery through incoming webhooks
//!
//! # Architecture
//!
//! ```text
//! Events API POST → parse_payload → MessageEventHandler → CommandRouter → ShotCommandService
//!                                              ↓
//!                      MessageSink (prod/dev incoming webhook) ← Block Kit replies
//! ```

pub mod blocks;
pub mod commands;
pub mod events;
pub mod web;
pub mod webhook;
