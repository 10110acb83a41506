/// PROPERTY-BASED TESTS: the receiver mirrors the sender after any sequence
/// of mutations, including edits to nodes that have left the graph
use proptest::prelude::*;

use diffgraph_shared::NodeRef;
use diffgraph_test::{describe, Entity, GameState, Item, TestSession};

const ENTITIES: usize = 3;
const ITEMS: usize = 2;

#[derive(Clone, Debug)]
enum Mutation {
    Timer(i32),
    Player(Option<usize>),
    SamePlayer(Option<usize>),
    Health(usize, i32),
    Mana(usize, i32),
    Carry(usize, Option<usize>),
    Cost(usize, i32),
    Sync,
}

fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        (-5i32..5).prop_map(Mutation::Timer),
        proptest::option::of(0..ENTITIES).prop_map(Mutation::Player),
        proptest::option::of(0..ENTITIES).prop_map(Mutation::SamePlayer),
        (0..ENTITIES, 0i32..3).prop_map(|(entity, value)| Mutation::Health(entity, value)),
        (0..ENTITIES, 0i32..3).prop_map(|(entity, value)| Mutation::Mana(entity, value)),
        (0..ENTITIES, proptest::option::of(0..ITEMS))
            .prop_map(|(entity, item)| Mutation::Carry(entity, item)),
        (0..ITEMS, 0i32..3).prop_map(|(item, value)| Mutation::Cost(item, value)),
        Just(Mutation::Sync),
    ]
}

struct World {
    session: TestSession,
    state: NodeRef<GameState>,
    entities: Vec<NodeRef<Entity>>,
    items: Vec<NodeRef<Item>>,
}

impl World {
    fn new() -> Self {
        let mut session = TestSession::new();
        let state = session.node(GameState::new());
        let entities = (0..ENTITIES)
            .map(|index| session.node(Entity::with(&format!("entity-{}", index), 10, 10)))
            .collect();
        let items = (0..ITEMS)
            .map(|index| session.node(Item::with(&format!("item-{}", index), 1)))
            .collect();
        Self {
            session,
            state,
            entities,
            items,
        }
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<(), TestCaseError> {
        match mutation {
            Mutation::Timer(value) => {
                self.state.borrow_mut().timer.set(*value);
            }
            Mutation::Player(entity) => {
                let entity = entity.map(|index| &self.entities[index]);
                self.state.borrow_mut().player.set(entity);
            }
            Mutation::SamePlayer(entity) => {
                let entity = entity.map(|index| &self.entities[index]);
                self.state.borrow_mut().same_player.set(entity);
            }
            Mutation::Health(entity, value) => {
                self.entities[*entity].borrow_mut().health.set(*value);
            }
            Mutation::Mana(entity, value) => {
                self.entities[*entity].borrow_mut().mana.set(*value);
            }
            Mutation::Carry(entity, item) => {
                let item = item.map(|index| &self.items[index]);
                self.entities[*entity].borrow_mut().item.set(item);
            }
            Mutation::Cost(item, value) => {
                self.items[*item].borrow_mut().cost.set(*value);
            }
            Mutation::Sync => self.sync()?,
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<(), TestCaseError> {
        let bytes = self
            .session
            .sender
            .serialize(&self.state)
            .map_err(|error| TestCaseError::fail(error.to_string()))?;
        let remote = self
            .session
            .receiver
            .deserialize::<GameState>(&bytes)
            .map_err(|error| TestCaseError::fail(error.to_string()))?;

        prop_assert_eq!(describe(&remote), describe(&self.state));
        prop_assert_eq!(
            self.session.receiver.registry().ref_ids(),
            self.session.sender.ledger().ref_ids()
        );
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_receiver_mirrors_sender(
        mutations in prop::collection::vec(mutation_strategy(), 1..40),
    ) {
        let mut world = World::new();
        for mutation in &mutations {
            world.apply(mutation)?;
        }
        world.sync()?;
    }

    /// A pass that follows another with no mutation in between carries nothing
    #[test]
    fn prop_idle_pass_is_empty(
        mutations in prop::collection::vec(mutation_strategy(), 1..20),
    ) {
        let mut world = World::new();
        for mutation in &mutations {
            world.apply(mutation)?;
        }
        world.sync()?;

        let bytes = world.session.send(&world.state);
        prop_assert_eq!(bytes.len(), 8);
        prop_assert!(!world.state.is_dirty());
    }
}
