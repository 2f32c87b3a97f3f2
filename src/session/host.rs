/// Handle for a registered host listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Host environment that delivers viewport resize notifications.
///
/// Every listener added by a component is removed exactly once on teardown.
pub trait ViewportHost {
    /// Register interest in resize notifications.
    fn add_resize_listener(&mut self) -> ListenerId;
    /// Deregister a listener returned by [`ViewportHost::add_resize_listener`].
    fn remove_resize_listener(&mut self, id: ListenerId);
}

/// Host without a window, used for offline rendering. Tracks active listeners.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    next_id: u64,
    active: Vec<ListenerId>,
}

impl HeadlessHost {
    /// Host with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners currently registered.
    pub fn active_listeners(&self) -> &[ListenerId] {
        &self.active
    }
}

impl ViewportHost for HeadlessHost {
    fn add_resize_listener(&mut self) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.active.push(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.active.retain(|&l| l != id);
    }
}
