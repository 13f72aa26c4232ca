//! Alias routing.
//!
//! ```text
//! editor saves alias ─▶ AliasRouter::register_alias
//!                          → ResourceStore::set_alias_field
//!                          → rebuild: list entries → compile → publish (ArcSwap) → flush RouteCache
//!
//! request path ─▶ ResolutionCache ─▶ AliasRouter::resolve ─▶ Some(Resolution) | None (default routing)
//! ```
//!
//! Tables are immutable; a rebuild swaps in a fresh one, so readers never
//! see a partial table. Patterns are evaluated in registration order and the
//! first match wins.

pub mod cache;
pub mod pattern;
pub mod router;
pub mod store;
pub mod table;

pub use cache::{ResolutionCache, RouteCache};
pub use pattern::{AliasPattern, PatternError};
pub use router::{AliasRouter, Resolver, RouterError, RouterState};
pub use store::{ResourceStore, StoreError};
pub use table::{Captures, Resolution, RouteTable};
