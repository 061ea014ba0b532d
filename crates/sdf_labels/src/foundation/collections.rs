//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable key of a registered event listener
    pub struct ListenerKey;
}

/// Handle-based map of listeners
pub type ListenerMap<T> = SlotMap<ListenerKey, T>;
