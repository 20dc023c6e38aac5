/// Something stored and looked up by a stable identifier.
///
/// Identifiers are small `Copy` values with a total order so stores can key
/// ordered maps on them.
pub trait Entity {
    type Id: Copy + Ord + core::fmt::Display + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}
