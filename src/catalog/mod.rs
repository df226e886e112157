//! Pure recipe-list logic shared by the server and the client SDK.

pub mod filter;
pub mod reorder;
pub mod suggest;

pub use filter::{RecipeFilter, SortKey, SortOrder};
pub use reorder::{move_item, OutOfRange};
pub use suggest::{suggested, suggestion_set, Season, SuggestionSet, DEFAULT_SUGGESTED_LIMIT};
