// Library root
// -----------
// This crate exposes the pieces of the graphmas console client. The binary
// (`main.rs`) wires them together: load the config, connect, run the menu.
//
// Module responsibilities:
// - `config`: Environment-sourced connection settings, validated once.
// - `catalog`: The fixed, ordered list of holiday graph queries.
// - `api`: The `GraphClient` seam plus the Gremlin WebSocket client
//   (GraphSON framing, authentication, connection pool).
// - `report`: Submits one query and prints records and status attributes.
// - `ui`: The numbered menu loop that drives `report`.
// - `error`: Error types shared by all of the above.
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod report;
pub mod ui;
