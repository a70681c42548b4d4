//! Signals read by the engine every tick.
//!
//! A [`Trigger`] is a boolean predicate over the agent context; when it
//! becomes true it overrides scored evaluation. A [`Utility`] turns the
//! context into a scalar used to rank competing transitions. Both are
//! read-only: they observe the agent, they never mutate it.

use std::fmt;

/// Boolean predicate over the agent context.
///
/// # Example
///
/// ```rust
/// use utility_hsm::core::Trigger;
///
/// struct Agent {
///     health: u32,
/// }
///
/// let low_health = Trigger::new(|agent: &Agent| agent.health < 20);
///
/// assert!(low_health.check(&Agent { health: 5 }));
/// assert!(!low_health.check(&Agent { health: 80 }));
/// ```
pub struct Trigger<C> {
    predicate: Box<dyn Fn(&C) -> bool + Send + Sync>,
}

impl<C> Trigger<C> {
    /// Create a trigger from a predicate.
    ///
    /// The predicate should be deterministic for a given context; it may
    /// be called several times per tick.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
        }
    }

    pub fn check(&self, ctx: &C) -> bool {
        (self.predicate)(ctx)
    }
}

impl<C> fmt::Debug for Trigger<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Trigger")
    }
}

/// Scoring function producing the utility of entering a state.
///
/// Higher is better. A NaN score is treated as "no usable score".
pub struct Utility<C> {
    scorer: Box<dyn Fn(&C) -> f32 + Send + Sync>,
}

impl<C> Utility<C> {
    pub fn new<F>(scorer: F) -> Self
    where
        F: Fn(&C) -> f32 + Send + Sync + 'static,
    {
        Self {
            scorer: Box::new(scorer),
        }
    }

    pub fn score(&self, ctx: &C) -> f32 {
        (self.scorer)(ctx)
    }
}

impl<C> fmt::Debug for Utility<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Utility")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Agent {
        health: u32,
        hunger: f32,
    }

    #[test]
    fn trigger_reads_context() {
        let trigger = Trigger::new(|a: &Agent| a.health < 10);

        assert!(trigger.check(&Agent {
            health: 3,
            hunger: 0.0
        }));
        assert!(!trigger.check(&Agent {
            health: 50,
            hunger: 0.0
        }));
    }

    #[test]
    fn trigger_is_deterministic() {
        let agent = Agent {
            health: 9,
            hunger: 0.0,
        };
        let trigger = Trigger::new(|a: &Agent| a.health < 10);

        assert_eq!(trigger.check(&agent), trigger.check(&agent));
    }

    #[test]
    fn utility_scores_context() {
        let utility = Utility::new(|a: &Agent| a.hunger * 2.0);
        let agent = Agent {
            health: 100,
            hunger: 0.25,
        };

        assert_eq!(utility.score(&agent), 0.5);
    }
}
