//! # Discovery
//!
//! Turns a seed playlist into a playlist of tracks the seed does not contain
//! yet, drawn from the seed's own artists and, through spillover, from their
//! related artists.
//!
//! ## Pipeline
//!
//! 1. Seed tracks are deduplicated and attributed to albums and artists.
//! 2. Album statistics give each album a priority ([`album`]).
//! 3. Each artist's catalog is loaded, fully or top tracks only, and its
//!    undiscovered tracks are queued by popularity times album priority
//!    ([`artist`]).
//! 4. Each artist is allocated a share of the result; the part its catalog
//!    should not carry spills over to related artists ([`related`]).
//! 5. The per-artist queues are interleaved into the result ([`interleave`]).
//!
//! [`Discover`] drives the whole run and returns a [`DiscoveryReport`].

pub mod album;
pub mod artist;
mod discover;
pub mod interleave;
pub mod related;
pub mod report;
pub mod source;

#[cfg(test)]
pub(crate) mod fixtures;

pub use discover::{Discover, Extension};
pub use report::{AlbumSummary, ArtistSummary, DiscoveryReport};
