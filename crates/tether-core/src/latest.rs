use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A cloneable handle to a single mutable slot that always holds the most
/// recently written value.
///
/// Callbacks that capture a `LatestRef` read the value current at call time,
/// not the one current when the callback was created. Writing never requests
/// a re-render.
pub struct LatestRef<T: 'static>(Rc<RefCell<T>>);

impl<T> Clone for LatestRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> LatestRef<T> {
    pub fn new(initial: T) -> Self {
        Self(Rc::new(RefCell::new(initial)))
    }

    /// Overwrites the slot. No history is kept.
    pub fn update(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }

    pub fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    pub fn take(&self) -> T
    where
        T: Default,
    {
        self.0.take()
    }

    /// True when both handles point at the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: fmt::Debug> fmt::Debug for LatestRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LatestRef").field(&*self.0.borrow()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_overwrites() {
        let r = LatestRef::new(1);
        r.update(2);
        r.update(3);
        assert_eq!(r.get(), 3);
    }

    #[test]
    fn test_clone_shares_slot() {
        let r = LatestRef::new(String::from("a"));
        let captured = r.clone();
        let read_later = move || captured.get();

        r.update("b".into());
        assert_eq!(read_later(), "b");
        assert!(r.ptr_eq(&r.clone()));
    }

    #[test]
    fn test_take_and_replace() {
        let r = LatestRef::new(Some(5));
        assert_eq!(r.replace(Some(6)), Some(5));
        assert_eq!(r.take(), Some(6));
        assert_eq!(r.get(), None);
    }
}
