//! Leaf states: the callbacks behind a state identifier.

use std::fmt;

type PhaseFn<C> = Box<dyn FnMut(&mut C) -> bool + Send>;
type UpdateFn<C> = Box<dyn FnMut(&mut C) + Send>;

/// A named unit of behavior with optional enter/update/exit callbacks.
///
/// `enter` and `exit` follow a busy-until-true protocol: returning `false`
/// means "still working", and the machine calls the same callback again on
/// the next tick. A missing callback completes immediately.
///
/// The owning agent is not stored in the leaf; it is handed to every
/// callback as the context `C` at tick time.
///
/// # Example
///
/// ```rust
/// use utility_hsm::machine::LeafState;
///
/// struct Agent {
///     steps: u32,
/// }
///
/// let mut walk = LeafState::new("walk").on_update(|agent: &mut Agent| agent.steps += 1);
///
/// let mut agent = Agent { steps: 0 };
/// assert!(walk.enter(&mut agent));
/// walk.update(&mut agent);
/// assert_eq!(agent.steps, 1);
/// ```
pub struct LeafState<C> {
    name: String,
    enter: Option<PhaseFn<C>>,
    update: Option<UpdateFn<C>>,
    exit: Option<PhaseFn<C>>,
}

impl<C> LeafState<C> {
    /// Create a leaf with no callbacks; `name` shows up in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enter: None,
            update: None,
            exit: None,
        }
    }

    /// Set the enter callback. Return `false` to be called again next tick.
    pub fn on_enter<F>(mut self, enter: F) -> Self
    where
        F: FnMut(&mut C) -> bool + Send + 'static,
    {
        self.enter = Some(Box::new(enter));
        self
    }

    /// Set the per-tick update callback.
    pub fn on_update<F>(mut self, update: F) -> Self
    where
        F: FnMut(&mut C) + Send + 'static,
    {
        self.update = Some(Box::new(update));
        self
    }

    /// Set the exit callback. Return `false` to be called again next tick.
    pub fn on_exit<F>(mut self, exit: F) -> Self
    where
        F: FnMut(&mut C) -> bool + Send + 'static,
    {
        self.exit = Some(Box::new(exit));
        self
    }

    /// Name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one enter step; `true` once entering has completed.
    pub fn enter(&mut self, ctx: &mut C) -> bool {
        self.enter.as_mut().map_or(true, |enter| enter(ctx))
    }

    /// Run the update callback once, if any.
    pub fn update(&mut self, ctx: &mut C) {
        if let Some(update) = self.update.as_mut() {
            update(ctx);
        }
    }

    /// Run one exit step; `true` once exiting has completed.
    pub fn exit(&mut self, ctx: &mut C) -> bool {
        self.exit.as_mut().map_or(true, |exit| exit(ctx))
    }
}

impl<C> fmt::Debug for LeafState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafState")
            .field("name", &self.name)
            .field("enter", &self.enter.is_some())
            .field("update", &self.update.is_some())
            .field("exit", &self.exit.is_some())
            .finish()
    }
}
