//! Model-based property tests.
//!
//! These tests generate random sequences of user intents interleaved with
//! single request deliveries, apply them to the real app over the simulated
//! backend, and check invariants along the way.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!                          ▼
//!                      SimWorld ──── after every op ───▶ standard invariants
//!                          │
//!                       settle ───────────────────────▶ settled invariants
//! ```

use petboard_harness::{
    InvariantRegistry, ModelList, ModelSort, ModelTerm, Operation, SimWorld, Slot,
};
use petboard_proto::ListKind;
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap()
}

fn list_strategy() -> impl Strategy<Value = ModelList> {
    prop_oneof![
        3 => Just(ModelList::All),
        1 => Just(ModelList::Mine),
        1 => Just(ModelList::Featured),
    ]
}

fn sort_strategy() -> impl Strategy<Value = ModelSort> {
    prop_oneof![
        Just(ModelSort::Newest),
        Just(ModelSort::Oldest),
        Just(ModelSort::MostLiked),
        Just(ModelSort::MostDiscussed),
    ]
}

fn term_strategy() -> impl Strategy<Value = ModelTerm> {
    prop_oneof![
        Just(ModelTerm::Clear),
        Just(ModelTerm::Dog),
        Just(ModelTerm::Cat),
        Just(ModelTerm::Nothing),
    ]
}

/// Operations weighted towards deliveries and the detail view, where the
/// interesting races live.
fn operation_strategy() -> impl Strategy<Value = Operation> {
    let slot = any::<Slot>();
    prop_oneof![
        3 => list_strategy().prop_map(|list| Operation::LoadList { list }),
        2 => (list_strategy(), any::<u8>())
            .prop_map(|(list, page)| Operation::SetPage { list, page }),
        1 => (list_strategy(), sort_strategy())
            .prop_map(|(list, sort)| Operation::SetSort { list, sort }),
        1 => (list_strategy(), term_strategy())
            .prop_map(|(list, term)| Operation::Search { list, term }),
        1 => (list_strategy(), term_strategy())
            .prop_map(|(list, term)| Operation::SearchTags { list, term }),
        3 => slot.clone().prop_map(|slot| Operation::OpenForum { slot }),
        1 => Just(Operation::CloseForum),
        1 => any::<u8>().prop_map(|page| Operation::LoadComments { page }),
        3 => Just(Operation::ToggleLike),
        2 => proptest::option::of(slot.clone())
            .prop_map(|reply_to| Operation::AddComment { reply_to }),
        1 => slot.clone().prop_map(|slot| Operation::EditComment { slot }),
        2 => slot.clone().prop_map(|slot| Operation::DeleteComment { slot }),
        1 => term_strategy().prop_map(|tags| Operation::CreateForum { tags }),
        1 => slot.clone().prop_map(|slot| Operation::UpdateForum { slot }),
        1 => slot.prop_map(|slot| Operation::DeleteForum { slot }),
        1 => Just(Operation::SignOut),
        1 => Just(Operation::SignIn),
        8 => Just(Operation::Step),
        1 => Just(Operation::Settle),
    ]
}

/// Apply `ops`, checking the standard invariants after each one and the
/// settled invariants at the end.
async fn run_checked(seed: u64, ops: &[Operation]) -> SimWorld {
    let standard = InvariantRegistry::standard();
    let settled = InvariantRegistry::settled();

    let mut world = SimWorld::new(seed);
    for (i, op) in ops.iter().enumerate() {
        world.apply(op).await;
        standard.assert_all(&world.snapshot(), &format!("after op {i}: {op:?}"));
    }
    world.settle().await;
    settled.assert_all(&world.settled_snapshot(), "after settling");
    world
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Invariants hold after every operation, and the system converges on
    /// the server once everything in flight has landed.
    #[test]
    fn prop_invariants_hold(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..60)
    ) {
        runtime().block_on(run_checked(seed, &ops));
    }

    /// Reloading every list after settling shows exactly the server's
    /// counters, whatever happened before.
    #[test]
    fn prop_reload_matches_server(
        seed in any::<u64>(),
        ops in prop::collection::vec(operation_strategy(), 0..40)
    ) {
        let rt = runtime();
        let world = rt.block_on(async {
            let mut world = run_checked(seed, &ops).await;
            world.apply(&Operation::SignIn).await;
            for list in [ModelList::All, ModelList::Mine, ModelList::Featured] {
                world.apply(&Operation::LoadList { list }).await;
            }
            world.settle().await;
            world
        });

        for kind in ListKind::ALL {
            let list = world.app().list(kind).unwrap();
            for post in list.content() {
                let server = world.backend().forum(post.forum_id).unwrap();
                prop_assert_eq!(post.likes_count, server.likes_count);
                prop_assert_eq!(post.comments_count, server.comments_count);
            }
        }
    }

    /// A like toggled from the detail view lands in every list that shows
    /// the post, without a list reload.
    #[test]
    fn prop_like_propagates_to_lists(seed in any::<u64>(), slot in any::<Slot>()) {
        let rt = runtime();
        let world = rt.block_on(async {
            let mut world = SimWorld::new(seed);
            world.apply(&Operation::LoadList { list: ModelList::All }).await;
            world.apply(&Operation::LoadList { list: ModelList::Featured }).await;
            world.settle().await;

            world.apply(&Operation::OpenForum { slot }).await;
            world.settle().await;
            world.backend().clear_requests();
            world.apply(&Operation::ToggleLike).await;
            world.settle().await;
            world
        });

        let detail = world.app().detail().forum().unwrap();
        let server = world.backend().forum(detail.forum_id).unwrap();
        prop_assert_eq!(detail.likes_count, server.likes_count);
        prop_assert_eq!(world.backend().requests().len(), 1);

        for list in world.app().lists() {
            if let Some(shown) = list.content().iter().find(|p| p.forum_id == detail.forum_id) {
                prop_assert_eq!(shown.likes_count, server.likes_count);
            }
        }
    }
}

#[test]
fn seeded_sequences_keep_invariants() {
    let rt = runtime();
    for seed in 0..16 {
        let ops = Operation::random_sequence(seed, 80);
        rt.block_on(run_checked(seed, &ops));
    }
}

#[test]
fn empty_sequence_settles_immediately() {
    let world = runtime().block_on(run_checked(1, &[]));
    assert_eq!(world.snapshot().in_flight, 0);
    assert!(world.app().lists().all(|l| !l.is_loaded()));
}

#[test]
fn delete_then_reload_steps_back_a_page() {
    let rt = runtime();
    let world = rt.block_on(async {
        let mut world = SimWorld::new(11);
        world.apply(&Operation::SetSort { list: ModelList::All, sort: ModelSort::Oldest }).await;
        world.settle().await;

        let last_page = world.app().list(ListKind::All).unwrap().total_pages() - 1;
        world.apply(&Operation::SetPage { list: ModelList::All, page: last_page as u8 }).await;
        world.settle().await;

        // Delete every post the viewer owns, then reload what is left.
        for slot in 0..16 {
            world.apply(&Operation::DeleteForum { slot }).await;
            world.settle().await;
        }
        world.apply(&Operation::LoadList { list: ModelList::All }).await;
        world.settle().await;
        world
    });

    let list = world.app().list(ListKind::All).unwrap();
    assert!(list.page() < list.total_pages());
    InvariantRegistry::settled().assert_all(&world.settled_snapshot(), "after deletions");
}
