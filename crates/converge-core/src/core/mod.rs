// converge-core/src/core/mod.rs
// ============================================================================
// Module: Converge Core Types
// Description: Canonical data model for the apply/prune engine.
// Purpose: Provide stable, serializable types shared across the workspace.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types define object identity, set algebra, manifests, the inventory
//! record, run options, statuses, and the event bus. These types are the
//! canonical source of truth for any derived surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod errors;
pub mod events;
pub mod hashing;
pub mod identifiers;
pub mod inventory;
pub mod manifest;
pub mod options;
pub mod sets;
pub mod status;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use errors::ActuationError;
pub use errors::GraphError;
pub use errors::InventoryError;
pub use errors::PendingObject;
pub use errors::RunError;
pub use errors::TimeoutError;
pub use errors::ValidationError;
pub use errors::ValidationFailure;
pub use events::ActionGroup;
pub use events::ApplyEvent;
pub use events::ApplyOperation;
pub use events::ApplySkipReason;
pub use events::DeleteEvent;
pub use events::DeleteOperation;
pub use events::ErrorEvent;
pub use events::Event;
pub use events::InitEvent;
pub use events::PruneEvent;
pub use events::PruneOperation;
pub use events::PruneSkipReason;
pub use events::TaskAction;
pub use events::WaitCondition;
pub use events::WaitEvent;
pub use events::WaitOperation;
pub use hashing::EMPTY_SET_HASH;
pub use hashing::inventory_hash;
pub use identifiers::InventoryId;
pub use identifiers::ObjectId;
pub use identifiers::ObjectIdError;
pub use identifiers::ObjectUid;
pub use identifiers::is_cluster_scoped;
pub use inventory::InventoryDocument;
pub use inventory::InventoryIdStrategy;
pub use inventory::InventoryInfo;
pub use manifest::DEPENDS_ON_ANNOTATION;
pub use manifest::INVENTORY_HASH_ANNOTATION;
pub use manifest::INVENTORY_ID_LABEL;
pub use manifest::ManifestError;
pub use manifest::ON_REMOVE_ANNOTATION;
pub use manifest::ON_REMOVE_KEEP;
pub use manifest::OWNING_INVENTORY_ANNOTATION;
pub use manifest::ResourceManifest;
pub use options::ApplierOptions;
pub use options::DEFAULT_POLL_INTERVAL;
pub use options::DestroyerOptions;
pub use options::DryRunStrategy;
pub use options::InventoryPolicy;
pub use options::PropagationPolicy;
pub use options::ValidationPolicy;
pub use sets::ObjectSet;
pub use status::ResourceStatus;
pub use status::ResourceStatusUpdate;
pub use status::StatusEvent;
pub use status::WatcherError;
