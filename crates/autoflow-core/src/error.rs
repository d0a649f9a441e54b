use crate::id::{ItemTypeId, ObjectId};

/// A failure inside a wrapped machine or container call.
///
/// Rejections (a full chest, nothing to consume) are not errors; they are
/// reported through `Ok(false)` / `Ok(None)`. These variants cover the
/// unexpected cases the scheduler isolates per machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectError {
    /// The machine reported `Done` but had no product to hand out.
    #[error("machine is done but has no output")]
    MissingOutput,
    /// A container yielded a different amount than it was asked for.
    #[error("container {container:?} yielded {taken} of {expected} {item_type:?}")]
    TakeMismatch {
        container: ObjectId,
        item_type: ItemTypeId,
        expected: u32,
        taken: u32,
    },
    /// The wrapped object is in a state it cannot operate from.
    #[error("invalid object state: {0}")]
    InvalidState(String),
    /// Any other failure reported by the wrapped object.
    #[error("{0}")]
    Failed(String),
}
