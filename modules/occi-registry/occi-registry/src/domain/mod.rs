//! Domain layer: registries, snapshots and the category router.

pub mod action;
pub mod category;
pub mod entity;
pub mod error;
pub mod joker;
pub mod kind;
pub mod merge;
pub mod mixin;
pub mod repo;
pub mod router;
pub mod snapshot;
