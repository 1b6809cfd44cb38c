use std::fmt;
use std::marker::PhantomData;

/// An independently updatable group of fields on a scene object.
///
/// Each variant owns one bit in the object's [`DirtyFlags`].
pub trait FieldGroup: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every group, in declaration order.
    const ALL: &'static [Self];

    /// Bit position of this group. Must be unique and below 32.
    fn index(self) -> u32;

    fn bit(self) -> u32 {
        1 << self.index()
    }
}

/// One dirty bit per field group.
///
/// Bits are set by setters and cleared only by the consumer (or an explicit
/// clear). Writing equal values still sets the bit.
pub struct DirtyFlags<F> {
    bits: u32,
    _group: PhantomData<F>,
}

impl<F: FieldGroup> DirtyFlags<F> {
    /// All groups clean.
    pub fn clean() -> Self {
        Self {
            bits: 0,
            _group: PhantomData,
        }
    }

    /// Only the listed groups dirty.
    pub fn with(fields: &[F]) -> Self {
        let mut flags = Self::clean();
        for f in fields {
            flags.mark(*f);
        }
        flags
    }

    pub fn mark(&mut self, field: F) {
        self.bits |= field.bit();
    }

    pub fn contains(&self, field: F) -> bool {
        self.bits & field.bit() != 0
    }

    /// Clear one group, returning whether it was dirty.
    pub fn take(&mut self, field: F) -> bool {
        let was = self.contains(field);
        self.bits &= !field.bit();
        was
    }

    pub fn clear(&mut self) {
        self.bits = 0;
    }

    pub fn any(&self) -> bool {
        self.bits != 0
    }

    /// Union with another set of flags.
    pub fn merge(&mut self, other: &Self) {
        self.bits |= other.bits;
    }

    /// Dirty groups in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        F::ALL.iter().copied().filter(|f| self.contains(*f))
    }
}

impl<F: FieldGroup> Default for DirtyFlags<F> {
    fn default() -> Self {
        Self::clean()
    }
}

impl<F> Clone for DirtyFlags<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for DirtyFlags<F> {}

impl<F> PartialEq for DirtyFlags<F> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<F> Eq for DirtyFlags<F> {}

impl<F: FieldGroup> fmt::Debug for DirtyFlags<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Field {
        A,
        B,
        C,
    }

    impl FieldGroup for Field {
        const ALL: &'static [Self] = &[Self::A, Self::B, Self::C];

        fn index(self) -> u32 {
            self as u32
        }
    }

    #[test]
    fn mark_and_take() {
        let mut flags = DirtyFlags::<Field>::clean();
        assert!(!flags.any());
        flags.mark(Field::B);
        assert!(flags.contains(Field::B));
        assert!(!flags.contains(Field::A));
        assert!(flags.take(Field::B));
        assert!(!flags.take(Field::B));
        assert!(!flags.any());
    }

    #[test]
    fn merge_is_union() {
        let mut a = DirtyFlags::with(&[Field::A]);
        let b = DirtyFlags::with(&[Field::C]);
        a.merge(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![Field::A, Field::C]);
    }

    #[test]
    fn clear_twice_equals_clear_once() {
        let mut once = DirtyFlags::with(Field::ALL);
        once.clear();
        let mut twice = DirtyFlags::with(Field::ALL);
        twice.clear();
        twice.clear();
        assert_eq!(once, twice);
    }

    #[test]
    fn debug_lists_dirty_groups() {
        let flags = DirtyFlags::with(&[Field::A, Field::C]);
        assert_eq!(format!("{flags:?}"), "{A, C}");
    }
}
