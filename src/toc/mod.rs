//! Table-of-contents tree and narrative classification

mod arena;
mod classify;

pub use arena::{HierarchyError, HierarchyResult, PartArena, Preorder};
pub use classify::{
    ClassifyError, Classifier, PreviewCache, ToggleOutcome, ToggleState, DEFAULT_PREVIEW_LEN,
};
