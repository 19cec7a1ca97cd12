//! # Repository Module
//!
//! Database repository implementations for the bundle catalog.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                                 │
//! │       │  db.bundles().list_active(now)                                  │
//! │       ▼                                                                 │
//! │  BundleRepository                                                       │
//! │  ├── list_active(&self, now)                                            │
//! │  ├── get_by_id(&self, id)                                               │
//! │  ├── insert(&self, bundle)                                              │
//! │  ├── set_active(&self, id, active)                                      │
//! │  └── delete(&self, id)                                                  │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite (bundles, bundle_members)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod bundle;
