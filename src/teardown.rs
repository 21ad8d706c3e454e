// Teardown stack for the explicit variant
//
// Every handle the explicit run creates registers its release action here
// right after creation. Unwinding runs the actions newest-first, so a handle
// is always released before the handle it was created from.

/// LIFO list of named release actions.
///
/// `unwind` runs them explicitly; dropping the stack unwinds whatever is left,
/// which covers early returns through `?`.
#[derive(Default)]
pub struct TeardownStack {
    actions: Vec<(&'static str, Box<dyn FnOnce()>)>,
}

impl TeardownStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the release action for a freshly created handle
    pub fn push(&mut self, name: &'static str, release: impl FnOnce() + 'static) {
        log::debug!("Acquired {}", name);
        self.actions.push((name, Box::new(release)));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every pending release action, newest first
    pub fn unwind(&mut self) {
        while let Some((name, release)) = self.actions.pop() {
            log::debug!("Releasing {}", name);
            release();
        }
    }
}

impl Drop for TeardownStack {
    fn drop(&mut self) {
        if !self.actions.is_empty() {
            log::warn!(
                "Teardown stack dropped with {} pending handles, releasing",
                self.actions.len()
            );
            self.unwind();
        }
    }
}
