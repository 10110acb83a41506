/// Tests that each pass carries exactly the changes made since the last one
use diffgraph_shared::{NodeRef, OperationCode};
use diffgraph_test::{assert_mirrored, assert_root_mask, Entity, GameState, Item, TestSession};

fn synced_state() -> (TestSession, NodeRef<GameState>, NodeRef<Entity>) {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    let player = session.node(Entity::with("pikachu", 100, 20));
    {
        let mut state = state.borrow_mut();
        state.timer.set(60);
        state.player.set(Some(&player));
    }
    session.sync(&state);
    (session, state, player)
}

#[test]
fn encode_clears_every_written_tracker() {
    let (_session, state, player) = synced_state();

    assert!(!state.is_dirty());
    assert!(!player.is_dirty());
    assert_eq!(state.dirty_bitmask(), 0);
}

#[test]
fn second_pass_without_mutation_is_empty() {
    let (mut session, state, _player) = synced_state();

    let bytes = session.send(&state);

    assert_root_mask!(bytes, 0);
    assert_eq!(bytes, vec![1, 0, 0, 0, 0, 0, 0, 0]);

    let remote = session.receive::<GameState>(&bytes);
    assert_mirrored!(state, remote);
}

#[test]
fn scalar_change_sends_only_that_property() {
    let (mut session, state, _player) = synced_state();
    state.borrow_mut().timer.set(61);

    let bytes = session.send(&state);

    assert_eq!(
        bytes,
        vec![
            1, 0, 0, 0, // state
            0b1, 0, 0, 0, // timer
            1, // Update
            61, 0, 0, 0,
        ]
    );
    let remote = session.receive::<GameState>(&bytes);
    assert_eq!(*remote.borrow().timer, 61);
}

#[test]
fn repeated_sets_between_passes_send_latest_value_once() {
    let (mut session, state, _player) = synced_state();
    state.borrow_mut().timer.set(5);
    state.borrow_mut().timer.set(6);

    let bytes = session.send(&state);

    assert_eq!(bytes.len(), 4 + 4 + 1 + 4);
    let remote = session.receive::<GameState>(&bytes);
    assert_eq!(*remote.borrow().timer, 6);
}

#[test]
fn setting_current_value_sends_nothing() {
    let (mut session, state, player) = synced_state();
    state.borrow_mut().timer.set(60);
    player.borrow_mut().health.set(100);

    let bytes = session.send(&state);

    assert_root_mask!(bytes, 0);
}

#[test]
fn nested_change_is_reached_through_clean_parent() {
    let (mut session, state, player) = synced_state();
    player.borrow_mut().health.set(90);
    assert!(!state.is_dirty());

    let bytes = session.send(&state);

    assert_eq!(
        bytes,
        vec![
            1, 0, 0, 0, // state
            0b10, 0, 0, 0, // player
            1, // Update
            2, 0, 0, 0, // player
            0b10, 0, 0, 0, // health
            1, // Update
            90, 0, 0, 0,
        ]
    );
    let remote = session.receive::<GameState>(&bytes);
    assert_mirrored!(state, remote);
}

#[test]
fn add_stays_add_when_child_changes_in_same_pass() {
    let mut session = TestSession::new();
    let state = session.node(GameState::new());
    session.sync(&state);
    let player = session.node(Entity::with("pikachu", 100, 20));

    state.borrow_mut().player.set(Some(&player));
    player.borrow_mut().health.set(150);

    assert_eq!(state.pending_op(1), Some(OperationCode::Add));
    assert!(player.is_dirty());

    let bytes = session.send(&state);

    assert_root_mask!(bytes, 0b10);
    assert_eq!(bytes[8], OperationCode::Add.to_byte());
    assert_eq!(&bytes[9..13], &player.ref_id().value().to_le_bytes());
    let remote = session.receive::<GameState>(&bytes);
    let remote_player = remote.borrow().player.get().expect("player should arrive");
    assert_eq!(*remote_player.borrow().health, 150);
    assert_mirrored!(state, remote);
}

#[test]
fn change_two_levels_down_is_found() {
    let (mut session, state, player) = synced_state();
    let item = session.node(Item::with("potion", 30));
    player.borrow_mut().item.set(Some(&item));
    session.sync(&state);

    item.borrow_mut().cost.set(25);
    let bytes = session.send(&state);

    assert_root_mask!(bytes, 0b10);
    let remote = session.receive::<GameState>(&bytes);
    assert_mirrored!(state, remote);
}

#[test]
fn pending_operations_are_visible_before_encode() {
    let (_session, state, player) = synced_state();
    state.borrow_mut().timer.set(1);
    player.borrow_mut().mana.set(0);

    assert_eq!(state.dirty_bitmask(), 0b001);
    assert_eq!(player.dirty_bitmask(), 0b0100);
    assert_eq!(
        player.pending_op(2),
        Some(diffgraph_shared::OperationCode::Update)
    );
}
