//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values, e.g. a
/// `Price` of 250 cents equals any other `Price` of 250 cents. An entity such
/// as a `SweetItem` is instead identified by its id.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
