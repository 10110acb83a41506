/// Tests that both sides drop nodes once nothing references them
use diffgraph_shared::OperationCode;
use diffgraph_test::{assert_mirrored, Entity, GameState, Item, TestSession};

#[test]
fn delete_of_shared_node_keeps_it_registered() {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let player = session.node(Entity::with("pikachu", 100, 20));
    {
        let mut state = state.borrow_mut();
        state.player.set(Some(&player));
        state.same_player.set(Some(&player));
    }
    session.sync(&state);

    assert_eq!(
        state.borrow_mut().same_player.set(None),
        Some(OperationCode::Delete)
    );
    let remote = session.sync(&state);

    let remote_player = session
        .receiver
        .registry()
        .get::<Entity>(player.ref_id())
        .expect("player is still referenced");
    assert_eq!(remote_player.ref_count(), 1);
    assert!(remote.borrow().same_player.is_none());
    assert_mirrored!(state, remote);
}

#[test]
fn delete_of_last_reference_evicts() {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let player = session.node(Entity::with("pikachu", 100, 20));
    state.borrow_mut().player.set(Some(&player));
    session.sync(&state);

    state.borrow_mut().player.set(None);
    assert_eq!(player.ref_count(), 0);
    let remote = session.sync(&state);

    assert!(remote.borrow().player.is_none());
    assert!(session.receiver.registry().try_get(player.ref_id()).is_none());
    assert!(!session.sender.ledger().is_known(player.ref_id()));
    assert_eq!(session.receiver.registry().len(), 1);
}

#[test]
fn eviction_cascades_to_orphaned_children() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();

    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let player = session.node(Entity::with("pikachu", 100, 20));
    let item = session.node(Item::with("potion", 30));
    player.borrow_mut().item.set(Some(&item));
    state.borrow_mut().player.set(Some(&player));
    session.sync(&state);
    assert_eq!(session.receiver.registry().len(), 3);

    state.borrow_mut().player.set(None);
    session.sync(&state);

    assert_eq!(session.receiver.registry().ref_ids(), vec![state.ref_id()]);
    assert_eq!(session.sender.ledger().ref_ids(), vec![state.ref_id()]);
}

#[test]
fn evicted_node_held_by_receiver_still_lets_go_of_children() {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let ash = session.node(Entity::with("ash", 100, 20));
    let misty = session.node(Entity::with("misty", 90, 30));
    let potion = session.node(Item::with("potion", 30));
    ash.borrow_mut().item.set(Some(&potion));
    {
        let mut state = state.borrow_mut();
        state.player.set(Some(&ash));
        state.same_player.set(Some(&misty));
    }
    session.sync(&state);
    let remote_ash = session
        .receiver
        .registry()
        .get::<Entity>(ash.ref_id())
        .expect("ash should be registered");

    state.borrow_mut().player.set(None);
    session.sync(&state);

    assert!(!session.sender.ledger().is_known(potion.ref_id()));
    assert!(!session.receiver.registry().contains(potion.ref_id()));
    assert!(remote_ash.borrow().item.is_none());
    assert_eq!(
        session.receiver.registry().ref_ids(),
        session.sender.ledger().ref_ids()
    );

    // linked again elsewhere, then dropped for good
    misty.borrow_mut().item.set(Some(&potion));
    let remote = session.sync(&state);
    let remote_potion = session
        .receiver
        .registry()
        .get::<Item>(potion.ref_id())
        .expect("potion should be resent");
    assert_eq!(remote_potion.ref_count(), 1);
    assert_mirrored!(state, remote);
    drop(remote_potion);

    misty.borrow_mut().item.set(None);
    session.sync(&state);

    assert!(!session.receiver.registry().contains(potion.ref_id()));
    assert_eq!(
        session.receiver.registry().ref_ids(),
        session.sender.ledger().ref_ids()
    );
}

#[test]
fn replace_moves_one_reference() {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let ash = session.node(Entity::with("ash", 50, 50));
    let misty = session.node(Entity::with("misty", 60, 40));
    {
        let mut state = state.borrow_mut();
        state.player.set(Some(&ash));
        state.same_player.set(Some(&misty));
    }
    session.sync(&state);

    assert_eq!(
        state.borrow_mut().player.set(Some(&misty)),
        Some(OperationCode::Replace)
    );
    assert_eq!(ash.ref_count(), 0);
    assert_eq!(misty.ref_count(), 2);
    let bytes = session.send(&state);
    assert_eq!(bytes[8], OperationCode::Replace.to_byte());
    let remote = session.receive::<GameState>(&bytes);

    assert!(session.receiver.registry().try_get(ash.ref_id()).is_none());
    let remote_misty = session
        .receiver
        .registry()
        .get::<Entity>(misty.ref_id())
        .expect("misty should be registered");
    assert_eq!(remote_misty.ref_count(), 2);
    assert_mirrored!(state, remote);
}

#[test]
fn evicted_node_is_resent_in_full() {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let player = session.node(Entity::with("pikachu", 100, 20));
    state.borrow_mut().player.set(Some(&player));
    session.sync(&state);

    state.borrow_mut().player.set(None);
    session.sync(&state);

    // changed while detached, then linked again
    player.borrow_mut().health.set(40);
    assert_eq!(
        state.borrow_mut().player.set(Some(&player)),
        Some(OperationCode::Add)
    );
    let remote = session.sync(&state);

    let remote_player = remote.borrow().player.get().expect("player should be attached");
    assert_eq!(*remote_player.borrow().id, "pikachu");
    assert_eq!(*remote_player.borrow().mana, 20);
    assert_eq!(*remote_player.borrow().health, 40);
    assert_mirrored!(state, remote);
}

#[test]
fn child_of_evicted_node_is_resent_when_linked_again() {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let ash = session.node(Entity::with("ash", 50, 50));
    let misty = session.node(Entity::with("misty", 60, 40));
    let item = session.node(Item::with("potion", 30));
    ash.borrow_mut().item.set(Some(&item));
    state.borrow_mut().player.set(Some(&ash));
    session.sync(&state);

    // ash leaves the graph but keeps holding the item
    state.borrow_mut().player.set(None);
    session.sync(&state);
    assert!(!session.receiver.registry().contains(item.ref_id()));

    misty.borrow_mut().item.set(Some(&item));
    state.borrow_mut().same_player.set(Some(&misty));
    let remote = session.sync(&state);

    assert_mirrored!(state, remote);
    assert!(session.receiver.registry().contains(item.ref_id()));
}

#[test]
fn detach_and_relink_in_one_pass_keeps_node() {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let player = session.node(Entity::with("pikachu", 100, 20));
    state.borrow_mut().player.set(Some(&player));
    session.sync(&state);

    {
        let mut state = state.borrow_mut();
        state.player.set(None);
        state.same_player.set(Some(&player));
    }
    let remote = session.sync(&state);

    let remote_player = session
        .receiver
        .registry()
        .get::<Entity>(player.ref_id())
        .expect("player should survive the pass");
    assert_eq!(remote_player.ref_count(), 1);
    assert_mirrored!(state, remote);
}

#[test]
fn removed_node_is_not_evicted_again() {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let player = session.node(Entity::new());
    state.borrow_mut().player.set(Some(&player));
    let remote = session.sync(&state);

    let removed = session
        .receiver
        .registry()
        .remove(player.ref_id())
        .expect("player should be registered");
    assert_eq!(removed.ref_id(), player.ref_id());
    assert!(session.receiver.registry().remove(player.ref_id()).is_err());

    remote.borrow_mut().player.set(None);
    assert!(session
        .receiver
        .registry()
        .add_erased(removed)
        .is_ok());
    assert!(session.receiver.registry().contains(player.ref_id()));
}
