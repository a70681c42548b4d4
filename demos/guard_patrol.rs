//! A guard that idles, patrols, chases intruders and gets stunned.
//!
//! Run with `RUST_LOG=utility_hsm=debug cargo run --example guard_patrol`
//! to see the engine's own decisions.

use utility_hsm::blackboard::{Blackboard, KeyKind, KeyStore};
use utility_hsm::builder::GraphBuilder;
use utility_hsm::machine::LeafState;
use utility_hsm::state_enum;

state_enum! {
    enum GuardState {
        Idle,
        Patrol,
        Chase,
        Search,
        Engage,
    }
}

#[derive(Default)]
struct Guard {
    board: Blackboard,
    stamina: f32,
    stunned: bool,
    waypoint: usize,
}

impl KeyStore for Guard {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.board.get_bool(key)
    }

    fn get_f32(&self, key: &str) -> Option<f32> {
        self.board.get_f32(key)
    }

    fn declare(&mut self, key: &str, kind: KeyKind) {
        self.board.declare(key, kind);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut graph = GraphBuilder::<GuardState, Guard>::new()
        .state(
            GuardState::Idle,
            LeafState::new("idle").on_update(|guard: &mut Guard| {
                guard.stamina = (guard.stamina + 0.2).min(1.0);
            }),
        )
        .state(
            GuardState::Patrol,
            LeafState::new("patrol").on_update(|guard: &mut Guard| {
                guard.waypoint = (guard.waypoint + 1) % 4;
                guard.stamina = (guard.stamina - 0.15).max(0.0);
            }),
        )
        .state(GuardState::Chase, LeafState::new("chase"))
        .state(GuardState::Search, LeafState::new("search"))
        .state(GuardState::Engage, LeafState::new("engage"))
        .global_state(|guard: &Guard| guard.stunned, LeafState::new("stunned"))
        .trigger_key(GuardState::Chase, "intruder_spotted")
        .from(GuardState::Idle)
            .to(GuardState::Patrol).conditions(["rested"]).evaluations(["stamina"])
        .from(GuardState::Patrol)
            .to(GuardState::Idle).conditions(["tired"]).evaluations(["fatigue"])
        .from(GuardState::Chase)
            .to(GuardState::Search).conditions(["intruder_lost"])
            .to(GuardState::Engage).conditions(["intruder_in_reach"])
        .from(GuardState::Search)
            .to(GuardState::Patrol).conditions(["search_done"])
        .initial(GuardState::Idle)
        .build()?;

    let mut guard = Guard::default();
    graph.declare_keys(&mut guard);

    for tick in 0..24 {
        script(tick, &mut guard);
        graph.update(&mut guard)?;
        tracing::info!(
            tick,
            state = %graph.active_state(),
            stamina = guard.stamina,
            waypoint = guard.waypoint,
            "guard ticked"
        );
    }

    let path: Vec<String> = graph
        .machine()
        .history()
        .get_path()
        .iter()
        .map(ToString::to_string)
        .collect();
    tracing::info!(path = %path.join(" -> "), "visited states");
    Ok(())
}

/// Scripted world events for the demo run.
fn script(tick: u32, guard: &mut Guard) {
    guard.board.set_f32("stamina", guard.stamina);
    guard.board.set_f32("fatigue", 1.0 - guard.stamina);
    guard.board.set_bool("rested", guard.stamina >= 0.8);
    guard.board.set_bool("tired", guard.stamina <= 0.2);

    match tick {
        8 => guard.board.set_bool("intruder_spotted", true),
        10 => guard.board.set_bool("intruder_lost", true),
        12 => {
            guard.board.set_bool("intruder_spotted", false);
            guard.board.set_bool("search_done", true);
        }
        15 => guard.stunned = true,
        18 => guard.stunned = false,
        _ => {}
    }
}
