use crate::SubscriberRegistry;

use std::sync::Arc;

use mk_core::RealtimeEvent;
use parking_lot::Mutex;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Subscribe(u8),
    Unsubscribe(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..8).prop_map(Op::Subscribe),
        1 => (0u8..8).prop_map(Op::Unsubscribe),
    ]
}

/// Order a plain Vec model would produce: first registration wins the slot
fn model_order(ops: &[Op]) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    for op in ops {
        match op {
            Op::Subscribe(n) => {
                let id = format!("s{n}");
                if !order.contains(&id) {
                    order.push(id);
                }
            }
            Op::Unsubscribe(n) => {
                let id = format!("s{n}");
                order.retain(|existing| existing != &id);
            }
        }
    }
    order
}

// =========================================================================
// Property-Based Tests - Fan-out order
// =========================================================================

proptest! {
    #[test]
    fn given_random_registrations_when_fanned_out_then_each_live_subscriber_called_once_in_order(
        ops in prop::collection::vec(op(), 0..40)
    ) {
        let mut registry = SubscriberRegistry::new();
        let calls: Arc<Mutex<Vec<String>>> = Arc::default();

        for op in &ops {
            match op {
                Op::Subscribe(n) => {
                    let id = format!("s{n}");
                    let calls = Arc::clone(&calls);
                    let label = id.clone();
                    registry.insert(id, Arc::new(move |_: &RealtimeEvent| {
                        calls.lock().push(label.clone());
                    }));
                }
                Op::Unsubscribe(n) => {
                    registry.remove(&format!("s{n}"));
                }
            }
        }

        let event = RealtimeEvent::Delete { id: "m1".into() };
        for (_, callback) in registry.snapshot() {
            callback(&event);
        }

        let expected = model_order(&ops);
        prop_assert_eq!(calls.lock().clone(), expected.clone());
        prop_assert_eq!(registry.len(), expected.len());
    }
}
