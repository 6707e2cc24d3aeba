//! Change policies decide whether a write counts as a change.

/// How a cell decides whether a write should notify subscribers.
pub enum ChangePolicy<T> {
    /// Every write notifies, even if the value is unchanged.
    Always,

    /// A write notifies only when the comparator reports the old and new
    /// values as different. The comparator returns `true` for "equal".
    Compare(fn(&T, &T) -> bool),
}

impl<T> ChangePolicy<T> {
    /// Whether writing `new` over `old` is a qualifying write.
    pub fn is_changed(&self, old: &T, new: &T) -> bool {
        match self {
            ChangePolicy::Always => true,
            ChangePolicy::Compare(eq) => !eq(old, new),
        }
    }

    /// Whether this policy ever suppresses writes.
    pub fn is_gated(&self) -> bool {
        matches!(self, ChangePolicy::Compare(_))
    }
}

impl<T: PartialEq> ChangePolicy<T> {
    /// Gate writes on `PartialEq`.
    pub fn equality() -> Self {
        ChangePolicy::Compare(<T as PartialEq>::eq)
    }
}

// Manual impls: the derives would needlessly require `T: Clone` etc.
impl<T> Clone for ChangePolicy<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ChangePolicy<T> {}

impl<T> std::fmt::Debug for ChangePolicy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangePolicy::Always => f.write_str("Always"),
            ChangePolicy::Compare(_) => f.write_str("Compare"),
        }
    }
}
