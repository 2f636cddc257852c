//! Change-notification lists shared by `Drawing` and `Log`.

/// Handle returned by `add_observer`, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Callbacks invoked with the observed value after every mutation.
pub struct Observers<T: ?Sized> {
    list: Vec<(ObserverId, Box<dyn FnMut(&T)>)>,
    next: u64,
}

impl<T: ?Sized> Observers<T> {
    pub fn add(&mut self, observer: impl FnMut(&T) + 'static) -> ObserverId {
        let id = ObserverId(self.next);
        self.next += 1;
        self.list.push((id, Box::new(observer)));
        id
    }

    /// Returns whether the observer was registered. Unknown ids are ignored.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.list.len();
        self.list.retain(|(oid, _)| *oid != id);
        self.list.len() != before
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Call every observer in registration order.
    ///
    /// Owners hold their list inline, so they `mem::take` it, call this with
    /// `&self`, and put it back.
    pub fn notify(&mut self, subject: &T) {
        for (_, observer) in &mut self.list {
            observer(subject);
        }
    }
}

impl<T: ?Sized> Default for Observers<T> {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            next: 0,
        }
    }
}
