//! Workspace-level integration tests driving the campaign scheduler end to
//! end with scripted probes and in-memory sinks.

#![cfg(test)]
