/// Where a variable lives once the front end has resolved it.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Local,
    Attribute,
    Global,
}

/// `(depth, position)` pair naming a slot relative to the top activation record.
///
/// `depth` counts static-chain hops, `position` indexes the slot found there.
/// Globals ignore `depth` and index the bottom record of the stack.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LexicalAddress {
    depth: usize,
    position: usize,
    storage: StorageClass,
}

impl LexicalAddress {
    /// Marker for nodes that own no temporary (identifiers, unassigned nodes).
    pub const NO_TEMPORARY: Self = Self {
        depth: usize::MAX,
        position: usize::MAX,
        storage: StorageClass::Local,
    };

    pub const fn new(depth: usize, position: usize, storage: StorageClass) -> Self {
        Self {
            depth,
            position,
            storage,
        }
    }

    pub const fn local(depth: usize, position: usize) -> Self {
        Self::new(depth, position, StorageClass::Local)
    }

    pub const fn attribute(depth: usize, position: usize) -> Self {
        Self::new(depth, position, StorageClass::Attribute)
    }

    pub const fn global(position: usize) -> Self {
        Self::new(0, position, StorageClass::Global)
    }

    /// Temporaries always live in the current record.
    pub const fn temporary(position: usize) -> Self {
        Self::local(0, position)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn storage(&self) -> StorageClass {
        self.storage
    }

    #[inline]
    pub fn is_temporary(&self) -> bool {
        *self != Self::NO_TEMPORARY
    }
}

impl Default for LexicalAddress {
    fn default() -> Self {
        Self::NO_TEMPORARY
    }
}
