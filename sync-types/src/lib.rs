//! # sync-types
//!
//! Data and wire types for the Vigil shared-document sync engine.
//!
//! This crate provides the foundational types used across all Vigil crates:
//! - [`Item`], [`ItemId`], [`Collection`] - The shared state and its identity
//! - [`Revision`] - Opaque "last modified" marker of the remote document
//! - [`RemoteDocument`], [`DocumentPatch`] - The document store's JSON envelope
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod document;
mod error;
mod ids;
mod item;

pub use document::{DocumentFile, DocumentPatch, FilePatch, RemoteDocument};
pub use error::TypesError;
pub use ids::{ItemId, Revision};
pub use item::{Collection, Item};
