//! Tick-by-tick scenarios driving a decision graph with a host agent type.

use utility_hsm::blackboard::{Blackboard, KeyKind, KeyStore};
use utility_hsm::builder::GraphBuilder;
use utility_hsm::core::StateId;
use utility_hsm::decision::{NodeId, Scoring};
use utility_hsm::machine::LeafState;
use utility_hsm::state_enum;

state_enum! {
    enum Guard {
        Idle,
        Patrol,
        Combat,
        Melee,
        Ranged,
        Lunge,
    }
}

#[derive(Default)]
struct Agent {
    board: Blackboard,
    stunned: bool,
    log: Vec<String>,
    declared: Vec<(String, KeyKind)>,
}

impl KeyStore for Agent {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.board.get_bool(key)
    }

    fn get_f32(&self, key: &str) -> Option<f32> {
        self.board.get_f32(key)
    }

    fn declare(&mut self, key: &str, kind: KeyKind) {
        self.declared.push((key.to_string(), kind));
    }
}

fn logged(name: &'static str) -> LeafState<Agent> {
    LeafState::new(name)
        .on_enter(move |agent: &mut Agent| {
            agent.log.push(format!("enter {name}"));
            true
        })
        .on_exit(move |agent: &mut Agent| {
            agent.log.push(format!("exit {name}"));
            true
        })
}

fn guard_builder() -> GraphBuilder<Guard, Agent> {
    GraphBuilder::new()
        .state(Guard::Idle, logged("idle"))
        .state(Guard::Patrol, logged("patrol"))
        .state(Guard::Combat, logged("combat"))
        .state(Guard::Melee, logged("melee"))
        .state(Guard::Ranged, logged("ranged"))
        .state(Guard::Lunge, logged("lunge"))
}

#[test]
fn nested_sub_graphs_resolve_to_the_deepest_target() {
    let mut graph = guard_builder()
        .from(Guard::Idle)
        .to(Guard::Combat)
        .conditions(["enemy_visible"])
        .sub_transitions()
        .to(Guard::Melee)
        .conditions(["in_reach"])
        .sub_transitions()
        .to(Guard::Lunge)
        .end()
        .to(Guard::Ranged)
        .end()
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let mut agent = Agent::default();
    agent.board.set_bool("enemy_visible", true);
    agent.board.set_bool("in_reach", true);

    assert_eq!(graph.evaluate(Guard::Idle, &agent).unwrap(), Guard::Lunge);

    graph.update(&mut agent).unwrap();
    assert_eq!(
        graph.pending_states().collect::<Vec<_>>(),
        vec![Guard::Combat, Guard::Melee, Guard::Lunge]
    );

    for _ in 0..3 {
        graph.update(&mut agent).unwrap();
    }
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Lunge));
    assert_eq!(
        agent.log,
        vec![
            "enter idle",
            "exit idle",
            "enter combat",
            "exit combat",
            "enter melee",
            "exit melee",
            "enter lunge",
        ]
    );
}

#[test]
fn nested_sub_graph_stays_live_after_entering_its_state() {
    let mut graph = guard_builder()
        .from(Guard::Idle)
        .to(Guard::Combat)
        .conditions(["enemy_visible"])
        .sub_transitions()
        .to(Guard::Melee)
        .sub_transitions()
        .to(Guard::Lunge)
        .conditions(["in_reach"])
        .end()
        .end()
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let combat = graph
        .node(NodeId::ROOT)
        .and_then(|root| root.sub_node(Guard::Combat))
        .unwrap();
    let melee = graph
        .node(combat)
        .and_then(|node| node.sub_node(Guard::Melee))
        .unwrap();
    let mut agent = Agent::default();
    agent.board.set_bool("enemy_visible", true);

    for _ in 0..4 {
        graph.update(&mut agent).unwrap();
    }
    assert_eq!(graph.active_state(), StateId::State(Guard::Melee));
    assert_eq!(graph.active_node(), combat);
    assert_eq!(graph.pending_states().len(), 0);

    agent.board.set_bool("in_reach", true);
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.active_state(), StateId::State(Guard::Lunge));
    assert_eq!(graph.active_node(), melee);
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Lunge));
}

#[test]
fn deep_states_fall_back_to_enclosing_transitions() {
    let mut graph = guard_builder()
        .from(Guard::Idle)
        .to(Guard::Combat)
        .conditions(["enemy_visible"])
        .sub_transitions()
        .to(Guard::Melee)
        .end()
        .from(Guard::Melee)
        .to(Guard::Idle)
        .conditions(["enemy_gone"])
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let mut agent = Agent::default();
    agent.board.set_bool("enemy_visible", true);

    for _ in 0..4 {
        graph.update(&mut agent).unwrap();
    }
    assert_eq!(graph.active_state(), StateId::State(Guard::Melee));

    agent.board.set_bool("enemy_visible", false);
    agent.board.set_bool("enemy_gone", true);
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.active_state(), StateId::State(Guard::Idle));
    assert_eq!(graph.active_node(), NodeId::ROOT);
}

#[test]
fn same_state_nesting_runs_the_innermost_level() {
    let mut graph = guard_builder()
        .from(Guard::Idle)
        .to(Guard::Combat)
        .conditions(["enemy_visible"])
        .sub_transitions()
        .sub_transitions()
        .to(Guard::Lunge)
        .conditions(["in_reach"])
        .end()
        .to(Guard::Ranged)
        .end()
        .from(Guard::Combat)
        .to(Guard::Idle)
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let mut agent = Agent::default();
    agent.board.set_bool("enemy_visible", true);

    for _ in 0..3 {
        graph.update(&mut agent).unwrap();
    }
    assert_eq!(graph.active_state(), StateId::State(Guard::Combat));
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Combat));
    assert_eq!(graph.pending_states().len(), 0);

    agent.board.set_bool("in_reach", true);
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Lunge));
    assert_eq!(
        agent.log,
        vec![
            "enter idle",
            "exit idle",
            "enter combat",
            "exit combat",
            "enter lunge",
        ]
    );
}

#[test]
fn slow_exit_holds_the_planned_chain() {
    let mut exits = 0;
    let mut graph = GraphBuilder::<Guard, Agent>::new()
        .state(
            Guard::Idle,
            LeafState::new("idle").on_exit(move |_| {
                exits += 1;
                exits >= 3
            }),
        )
        .state(Guard::Patrol, logged("patrol"))
        .state(Guard::Combat, logged("combat"))
        .from(Guard::Idle)
        .to(Guard::Patrol)
        .from(Guard::Patrol)
        .to(Guard::Combat)
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let mut agent = Agent::default();

    graph.update(&mut agent).unwrap();
    graph.update(&mut agent).unwrap();
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Idle));
    assert_eq!(graph.machine().next_state(), StateId::State(Guard::Patrol));
    assert_eq!(
        graph.pending_states().collect::<Vec<_>>(),
        vec![Guard::Combat]
    );

    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Patrol));

    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Combat));
    assert_eq!(agent.log, vec!["enter patrol", "exit patrol", "enter combat"]);
}

#[test]
fn global_override_pauses_evaluation_and_resumes() {
    let mut graph = guard_builder()
        .global_state(|agent: &Agent| agent.stunned, logged("stunned"))
        .from(Guard::Idle)
        .to(Guard::Patrol)
        .evaluations(["boredom"])
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let mut agent = Agent::default();
    agent.board.set_f32("boredom", 0.4);

    graph.update(&mut agent).unwrap();
    assert_eq!(graph.pending_states().collect::<Vec<_>>(), vec![Guard::Patrol]);

    agent.stunned = true;
    graph.update(&mut agent).unwrap();
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.active_state(), StateId::GlobalOverride);
    assert_eq!(graph.machine().current_state(), StateId::GlobalOverride);
    assert_eq!(graph.pending_states().len(), 1);

    agent.stunned = false;
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Idle));

    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Patrol));
    assert_eq!(
        agent.log,
        vec![
            "enter idle",
            "exit idle",
            "enter stunned",
            "exit stunned",
            "enter idle",
            "exit idle",
            "enter patrol",
        ]
    );
}

#[test]
fn override_during_slow_exit_resumes_from_the_running_state() {
    let mut exits = 0;
    let mut graph = GraphBuilder::<Guard, Agent>::new()
        .state(
            Guard::Idle,
            LeafState::new("idle").on_exit(move |_| {
                exits += 1;
                exits >= 2
            }),
        )
        .state(Guard::Patrol, logged("patrol"))
        .global_state(|agent: &Agent| agent.stunned, logged("stunned"))
        .from(Guard::Idle)
        .to(Guard::Patrol)
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let mut agent = Agent::default();

    graph.update(&mut agent).unwrap();
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().next_state(), StateId::State(Guard::Patrol));

    agent.stunned = true;
    graph.update(&mut agent).unwrap();
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().current_state(), StateId::GlobalOverride);

    agent.stunned = false;
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Idle));
    assert_eq!(graph.active_state(), graph.machine().current_state());
    assert_eq!(graph.pending_states().collect::<Vec<_>>(), vec![Guard::Patrol]);

    graph.update(&mut agent).unwrap();
    assert_eq!(graph.machine().current_state(), StateId::State(Guard::Patrol));
    assert_eq!(graph.active_state(), StateId::State(Guard::Patrol));
    assert_eq!(agent.log, vec!["enter stunned", "exit stunned", "enter patrol"]);
}

#[test]
fn utility_sub_graph_picks_by_target_utility() {
    let graph = guard_builder()
        .utility(Guard::Melee, |agent: &Agent| {
            1.0 - agent.board.get_f32("distance").unwrap_or(1.0)
        })
        .utility(Guard::Ranged, |agent: &Agent| {
            agent.board.get_f32("distance").unwrap_or(0.0)
        })
        .from(Guard::Idle)
        .to(Guard::Combat)
        .sub_transitions()
        .scoring(Scoring::Utility)
        .to(Guard::Melee)
        .to(Guard::Ranged)
        .end()
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let mut agent = Agent::default();

    agent.board.set_f32("distance", 0.9);
    assert_eq!(graph.evaluate(Guard::Idle, &agent).unwrap(), Guard::Ranged);

    agent.board.set_f32("distance", 0.2);
    assert_eq!(graph.evaluate(Guard::Idle, &agent).unwrap(), Guard::Melee);
}

#[test]
fn wildcard_transition_applies_from_every_state() {
    let mut graph = guard_builder()
        .from(Guard::Idle)
        .to(Guard::Patrol)
        .conditions(["bored"])
        .from(StateId::AnyState)
        .to(Guard::Idle)
        .conditions(["alarm_over"])
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let mut agent = Agent::default();
    agent.board.set_bool("bored", true);

    graph.update(&mut agent).unwrap();
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.active_state(), StateId::State(Guard::Patrol));

    agent.board.set_bool("bored", false);
    agent.board.set_bool("alarm_over", true);
    graph.update(&mut agent).unwrap();
    assert_eq!(graph.active_state(), StateId::State(Guard::Idle));
}

#[test]
fn graph_declares_every_key_it_reads() {
    let graph = guard_builder()
        .trigger_key(Guard::Combat, "enemy_visible")
        .from(Guard::Idle)
        .to(Guard::Patrol)
        .conditions(["rested"])
        .evaluations(["boredom"])
        .initial(Guard::Idle)
        .build()
        .unwrap();
    let mut agent = Agent::default();

    graph.declare_keys(&mut agent);
    assert_eq!(
        agent.declared,
        vec![
            ("enemy_visible".to_string(), KeyKind::Trigger),
            ("rested".to_string(), KeyKind::Condition),
            ("boredom".to_string(), KeyKind::Evaluation),
        ]
    );
}
