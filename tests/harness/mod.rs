//! Test peers for end-to-end runs of the load harness.

mod server;

pub use server::{Script, ScriptedPeer, Transcript, serve_file};
