//! Several clients sharing one simulated server.

use konnect_client::Notice;
use konnect_core::{ConnectionState, EventKind};
use konnect_harness::{
    InvariantRegistry, SimDirectory, SimNetwork, SimRuntime, SystemSnapshot, sim_runtime,
};

fn quiesce(network: &SimNetwork, clients: &mut [&mut SimRuntime]) {
    loop {
        let delivered = network.deliver();
        for client in clients.iter_mut() {
            client.pump();
        }
        if delivered == 0 && network.queued() == 0 {
            break;
        }
    }
}

fn check(network: &SimNetwork, clients: &[&SimRuntime], context: &str) {
    let snapshot = SystemSnapshot::capture(network, clients.iter().copied());
    InvariantRegistry::standard().assert_all(&snapshot, context);
}

fn texts(runtime: &SimRuntime) -> Vec<String> {
    runtime.manager().log().all().iter().map(|e| format!("{}: {}", e.sender, e.message)).collect()
}

/// alice creates "team", bob joins it; both end up connected.
async fn team_of_two(
    network: &SimNetwork,
    directory: &SimDirectory,
) -> (SimRuntime, SimRuntime, String) {
    let mut alice = sim_runtime(network, directory).unwrap();
    let mut bob = sim_runtime(network, directory).unwrap();

    alice.register("alice").await.unwrap();
    let group = alice.create_group("team").await.unwrap();
    quiesce(network, &mut [&mut alice, &mut bob]);

    bob.register("bob").await.unwrap();
    bob.join_group(&group.id).await.unwrap();
    quiesce(network, &mut [&mut alice, &mut bob]);

    (alice, bob, group.id)
}

#[tokio::test]
async fn messages_reach_every_member() {
    let network = SimNetwork::new();
    let directory = SimDirectory::new();
    let (mut alice, mut bob, group_id) = team_of_two(&network, &directory).await;
    assert_eq!(network.members(&group_id), vec!["alice".to_string(), "bob".to_string()]);
    assert_eq!(bob.manager().group().map(|g| g.name.as_str()), Some("team"));

    bob.send("hi").unwrap();
    quiesce(&network, &mut [&mut alice, &mut bob]);

    assert_eq!(texts(&alice).last().map(String::as_str), Some("bob: hi"));
    assert_eq!(texts(&bob).last().map(String::as_str), Some("bob: hi"));
    check(&network, &[&alice, &bob], "after broadcast");
}

#[tokio::test]
async fn members_see_joins_and_leaves() {
    let network = SimNetwork::new();
    let directory = SimDirectory::new();
    let (mut alice, mut bob, _) = team_of_two(&network, &directory).await;

    assert_eq!(texts(&alice), vec![
        "system: User 'alice' joined the chat.".to_string(),
        "system: User 'bob' joined the chat.".to_string(),
    ]);
    assert_eq!(texts(&bob), vec!["system: User 'bob' joined the chat.".to_string()]);

    bob.leave_group();
    assert!(bob.manager().log().is_empty());
    assert_eq!(bob.manager().state(), ConnectionState::Closing);
    quiesce(&network, &mut [&mut alice, &mut bob]);

    assert_eq!(bob.manager().state(), ConnectionState::Closed);
    assert!(!bob.manager().session().is_errored());
    assert_eq!(texts(&alice).last().map(String::as_str), Some("system: User 'bob' left the chat."));
    check(&network, &[&alice, &bob], "after leave");
}

#[tokio::test]
async fn switching_groups_never_leaks_old_traffic() {
    let network = SimNetwork::new();
    let directory = SimDirectory::new();
    let (mut alice, mut bob, _) = team_of_two(&network, &directory).await;

    // bob's message is already on its way when alice switches away.
    bob.send("still there?").unwrap();
    alice.create_group("ops").await.unwrap();
    assert_eq!(alice.manager().state(), ConnectionState::Closing);
    assert!(alice.manager().log().is_empty());
    check(&network, &[&alice, &bob], "switch requested");

    quiesce(&network, &mut [&mut alice, &mut bob]);

    assert_eq!(alice.manager().state(), ConnectionState::Open);
    assert_eq!(texts(&alice), vec!["system: User 'alice' joined the chat.".to_string()]);
    assert!(alice.manager().log().all().iter().all(|e| e.kind == EventKind::System));
    assert_eq!(texts(&bob)[texts(&bob).len() - 2..], [
        "bob: still there?".to_string(),
        "system: User 'alice' left the chat.".to_string(),
    ]);
    check(&network, &[&alice, &bob], "switched");
}

#[tokio::test]
async fn close_and_send_race_is_ordered() {
    let network = SimNetwork::new();
    let directory = SimDirectory::new();
    let (mut alice, mut bob, _) = team_of_two(&network, &directory).await;

    // alice's last message is queued ahead of her close.
    alice.send("bye").unwrap();
    alice.leave_group();
    quiesce(&network, &mut [&mut alice, &mut bob]);

    let bob_log = texts(&bob);
    assert_eq!(bob_log[bob_log.len() - 2..], [
        "alice: bye".to_string(),
        "system: User 'alice' left the chat.".to_string(),
    ]);
    assert!(alice.manager().log().is_empty());
}

#[tokio::test]
async fn renaming_reconnects_under_new_name() {
    let network = SimNetwork::new();
    let directory = SimDirectory::new();
    let (mut alice, mut bob, group_id) = team_of_two(&network, &directory).await;

    alice.register("alicia").await.unwrap();
    quiesce(&network, &mut [&mut alice, &mut bob]);

    assert_eq!(network.members(&group_id), vec!["alicia".to_string(), "bob".to_string()]);
    let bob_log = texts(&bob);
    assert_eq!(bob_log[bob_log.len() - 2..], [
        "system: User 'alice' left the chat.".to_string(),
        "system: User 'alicia' joined the chat.".to_string(),
    ]);
    check(&network, &[&alice, &bob], "renamed");
}

#[tokio::test]
async fn forgetting_identity_disconnects() {
    let network = SimNetwork::new();
    let directory = SimDirectory::new();
    let (mut alice, mut bob, group_id) = team_of_two(&network, &directory).await;

    alice.forget_identity().unwrap();
    quiesce(&network, &mut [&mut alice, &mut bob]);

    assert!(alice.manager().identity().is_none());
    assert_eq!(alice.manager().target().user_name, "");
    assert_eq!(network.members(&group_id), vec!["bob".to_string()]);
    assert!(alice.send("anyone?").is_err());
    check(&network, &[&alice, &bob], "forgotten");
}

#[tokio::test]
async fn one_client_dropping_leaves_others_connected() {
    let network = SimNetwork::new();
    let directory = SimDirectory::new();
    let (mut alice, mut bob, _) = team_of_two(&network, &directory).await;

    network.drop_client(bob.connector().client());
    let mut bob_notices = Vec::new();
    network.deliver();
    alice.pump();
    bob_notices.extend(bob.pump());

    assert!(matches!(bob_notices.as_slice(), [Notice::Advisory(err)] if err.requires_rejoin()));
    assert_eq!(alice.manager().state(), ConnectionState::Open);
    assert!(!alice.manager().session().is_errored());
    assert_eq!(texts(&alice).last().map(String::as_str), Some("system: User 'bob' left the chat."));

    assert!(bob.rejoin());
    quiesce(&network, &mut [&mut alice, &mut bob]);
    assert_eq!(bob.manager().state(), ConnectionState::Open);
    check(&network, &[&alice, &bob], "bob rejoined");
}

#[tokio::test]
async fn delivery_for_one_client_holds_back_others() {
    let network = SimNetwork::new();
    let directory = SimDirectory::new();
    let mut alice = sim_runtime(&network, &directory).unwrap();
    let mut bob = sim_runtime(&network, &directory).unwrap();

    alice.register("alice").await.unwrap();
    bob.register("bob").await.unwrap();
    let team = alice.create_group("team").await.unwrap();
    bob.join_group(&team.id).await.unwrap();

    assert_eq!(network.deliver_for(bob.connector().client()), 1);
    bob.pump();
    assert_eq!(bob.manager().state(), ConnectionState::Open);
    assert_eq!(alice.manager().state(), ConnectionState::Connecting);
    assert_eq!(network.queued(), 1);
    check(&network, &[&alice, &bob], "partial delivery");

    quiesce(&network, &mut [&mut alice, &mut bob]);
    assert_eq!(alice.manager().state(), ConnectionState::Open);
}
