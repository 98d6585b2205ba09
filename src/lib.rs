// Library root
// -----------
// This crate exposes the pieces of the disposal batch job. The binary
// (`main.rs`) only parses arguments and calls `ui::run`.
//
// Module responsibilities:
// - `config`: environment variables, `.env` loading and run options.
// - `input`: reads the CSV asset export into asset records.
// - `payload`: loads the status and comment templates, builds JSON Patch
//   documents.
// - `api`: HTTP interactions with the asset-management API (auth, patch,
//   feed) behind the `AssetService` trait.
// - `disposer`: the per-asset update-then-comment workflow and its pacing.
// - `logging`: `[LEVEL]` console lines on top of `tracing`.
// - `cli` / `ui`: command-line arguments and the terminal flow.
//
// Keeping the workflow generic over `AssetService` and `Pacer` lets the
// tests drive it without a network or real delays.
pub mod api;
pub mod cli;
pub mod config;
pub mod disposer;
pub mod input;
pub mod logging;
pub mod payload;
pub mod ui;
