//! Listkit Core
//!
//! This crate provides the data layer behind sectioned list screens.
//! It implements:
//!
//! - A reactive, sectioned collection with index-based editing
//! - Change-sets describing each edit for incremental view updates
//! - An adapter that applies change-sets to a platform list view
//! - A list view-model owning the collection and the selection
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `observe`: relays, event streams, subscriptions and dispatch targets
//! - `collection`: sections, identities and the reactive collection
//! - `change`: the change-set taxonomy and the list adapter
//! - `view_model`: the owning list view-model
//! - `config` / `error`: settings and the crate's error type
//!
//! # Example
//!
//! ```rust,ignore
//! use listkit_core::collection::{ReactiveCollection, Section};
//!
//! let list = ReactiveCollection::new();
//! let _changes = list.changes().subscribe(|change| {
//!     println!("{:?}", change);
//! });
//!
//! list.append_section(Section::new("A", vec![1u32, 2]), None);
//! list.insert_one(3, 0, 0, None);
//! // prints InsertSection { section: 0, .. } then InsertElements { [0, 0] }
//! ```

pub mod change;
pub mod collection;
pub mod config;
pub mod error;
pub mod observe;
pub mod view_model;

pub use change::{ChangeSet, ListAdapter, ListView};
pub use collection::{Element, Identify, IndexPath, ReactiveCollection, Section, SectionKey};
pub use config::CollectionConfig;
pub use error::{CollectionError, Result};
pub use view_model::ListViewModel;
