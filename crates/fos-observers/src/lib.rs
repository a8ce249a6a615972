//! fOS Observers
//!
//! Incremental matching of elements in a live DOM tree.
//!
//! The observers form a delegation chain, each layer owning the one below:
//! - `ElementObserver` tracks the elements satisfying a predicate
//! - `AttributeObserver` specializes it to attribute presence
//! - `TokenListObserver` diffs whitespace-separated tokens of one attribute
//! - `ValueListObserver` maps each token to a parsed value

mod token;
mod multimap;
mod element_observer;
mod attribute_observer;
mod token_list_observer;
mod value_list_observer;

pub use token::{Token, parse_token_string, tokenize};
pub use multimap::Multimap;
pub use element_observer::{ElementObserver, ElementObserverDelegate};
pub use attribute_observer::{AttributeObserver, AttributeObserverDelegate};
pub use token_list_observer::{TokenListObserver, TokenListObserverDelegate};
pub use value_list_observer::{ValueListObserver, ValueListObserverDelegate};

/// Observer construction error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObserverError {
    #[error("Invalid attribute name: {0:?}")]
    InvalidAttributeName(String),
}
