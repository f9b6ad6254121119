//! Courier: fetches attachment pointers recorded in the local store, verifies
//! and decrypts the downloaded blobs and files the plaintext away.

pub mod bootstrap;
pub mod cli;
