// src/github/mod.rs
// =============================================================================
// This module talks to GitHub.
//
// Submodules:
// - resolve: browsable URL -> contents API endpoint (no network)
// - listing: the contents API's JSON shapes and TreeEntry
// - client: HTTP requests, rate-limit detection and the retry policy
// =============================================================================

mod client;
mod listing;
mod resolve;

pub use client::{ApiClient, RetryPolicy};
pub use listing::{Listing, RawEntry, TreeEntry};
pub use resolve::{resolve_with_api, ListingEndpoint};
