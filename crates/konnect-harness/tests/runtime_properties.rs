//! Property tests: random user operations and network schedules across two
//! clients, with every invariant checked after every step.

use konnect_core::{ConnectionState, GroupDirectory};
use konnect_harness::{
    InvariantRegistry, SimDirectory, SimNetwork, SimRuntime, SystemSnapshot, sim_runtime,
};
use proptest::prelude::*;
use tokio::runtime::Runtime as TokioRuntime;

const NAMES: [&str; 3] = ["alice", "bob", "carol"];
const GROUPS: [&str; 2] = ["team", "ops"];

#[derive(Debug, Clone)]
enum Step {
    Register(usize, usize),
    Create(usize, usize),
    Join(usize, usize),
    Leave(usize),
    Forget(usize),
    Send(usize),
    Rejoin(usize),
    Pump(usize),
    Deliver,
    DeliverFor(usize),
    Drop(usize),
}

fn step() -> impl Strategy<Value = Step> {
    let client = 0..2usize;
    prop_oneof![
        2 => (client.clone(), 0..NAMES.len()).prop_map(|(c, n)| Step::Register(c, n)),
        2 => (client.clone(), 0..GROUPS.len()).prop_map(|(c, g)| Step::Create(c, g)),
        2 => (client.clone(), 0..4usize).prop_map(|(c, g)| Step::Join(c, g)),
        1 => client.clone().prop_map(Step::Leave),
        1 => client.clone().prop_map(Step::Forget),
        3 => client.clone().prop_map(Step::Send),
        1 => client.clone().prop_map(Step::Rejoin),
        4 => client.clone().prop_map(Step::Pump),
        3 => Just(Step::Deliver),
        2 => client.clone().prop_map(Step::DeliverFor),
        1 => client.prop_map(Step::Drop),
    ]
}

struct Sim {
    tokio: TokioRuntime,
    network: SimNetwork,
    directory: SimDirectory,
    clients: Vec<SimRuntime>,
    invariants: InvariantRegistry,
}

impl Sim {
    fn new() -> Self {
        let network = SimNetwork::new();
        let directory = SimDirectory::new();
        let clients = (0..2).map(|_| sim_runtime(&network, &directory).unwrap()).collect();
        Self {
            tokio: tokio::runtime::Builder::new_current_thread().build().unwrap(),
            network,
            directory,
            clients,
            invariants: InvariantRegistry::standard(),
        }
    }

    fn apply(&mut self, step: &Step) {
        match *step {
            Step::Register(c, n) => {
                let client = &mut self.clients[c];
                let _ = self.tokio.block_on(client.register(NAMES[n]));
            },
            Step::Create(c, g) => {
                let client = &mut self.clients[c];
                let _ = self.tokio.block_on(client.create_group(GROUPS[g]));
            },
            Step::Join(c, g) => {
                let groups = self.tokio.block_on(self.directory.list_groups()).unwrap();
                if let Some(group) = groups.get(g) {
                    let client = &mut self.clients[c];
                    let _ = self.tokio.block_on(client.join_group(&group.group_id));
                }
            },
            Step::Leave(c) => self.clients[c].leave_group(),
            Step::Forget(c) => {
                let _ = self.clients[c].forget_identity();
            },
            Step::Send(c) => {
                let _ = self.clients[c].send("ping");
            },
            Step::Rejoin(c) => {
                self.clients[c].rejoin();
            },
            Step::Pump(c) => {
                self.clients[c].pump();
            },
            Step::Deliver => {
                self.network.deliver();
            },
            Step::DeliverFor(c) => {
                self.network.deliver_for(self.clients[c].connector().client());
            },
            Step::Drop(c) => {
                self.network.drop_client(self.clients[c].connector().client());
            },
        }
    }

    fn check(&self, context: &str) {
        let snapshot = SystemSnapshot::capture(&self.network, self.clients.iter());
        self.invariants.assert_all(&snapshot, context);
    }

    /// Deliver and pump until nothing moves.
    fn settle(&mut self) {
        loop {
            let delivered = self.network.deliver();
            for client in &mut self.clients {
                client.pump();
            }
            if delivered == 0 && self.network.queued() == 0 {
                break;
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_invariants_hold_at_every_step(steps in prop::collection::vec(step(), 1..60)) {
        let mut sim = Sim::new();
        for (i, step) in steps.iter().enumerate() {
            sim.apply(step);
            sim.check(&format!("step {i}: {step:?}"));
        }
        sim.settle();
        sim.check("settled");
    }

    #[test]
    fn prop_settled_clients_with_target_are_open_or_lost(
        steps in prop::collection::vec(step(), 1..60)
    ) {
        let mut sim = Sim::new();
        for step in &steps {
            sim.apply(step);
        }
        sim.settle();

        for client in &sim.clients {
            let manager = client.manager();
            if manager.target().is_complete() {
                let state = manager.state();
                let open = state == ConnectionState::Open;
                let lost = state == ConnectionState::Closed
                    && manager.session().is_errored();
                prop_assert!(open || lost, "settled in {state:?} with complete target");
            } else {
                prop_assert_eq!(manager.session().transport(), None);
            }
        }
    }

    #[test]
    fn prop_settled_logs_are_shared_within_a_group(
        steps in prop::collection::vec(step(), 1..40)
    ) {
        let mut sim = Sim::new();
        for step in &steps {
            sim.apply(step);
        }
        sim.settle();

        // Whatever anyone says now reaches every open member of the group.
        for c in 0..sim.clients.len() {
            if sim.clients[c].send("marker").is_ok() {
                sim.settle();
                let Some(group) = sim.clients[c].manager().group().cloned() else {
                    continue;
                };
                for other in &sim.clients {
                    let manager = other.manager();
                    let in_group = manager.group().is_some_and(|g| g.id == group.id);
                    if in_group && manager.state() == ConnectionState::Open {
                        let last = other.manager().log().last().map(|e| e.message.as_str());
                        prop_assert_eq!(last, Some("marker"));
                    }
                }
            }
        }
    }
}
