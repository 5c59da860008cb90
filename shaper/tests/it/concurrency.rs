use std::{sync::Arc, thread};

use shaper::{Handle, ShaperEngine, ShaperNode, StaticDriver};

/// Writers race to build and tear down a group with its queues while readers dump. Every dump
/// must observe a consistent tree: a queue under the group implies the group is present.
#[test]
fn readers_see_consistent_snapshots() {
    let _ = tracing_subscriber::fmt::try_init();

    let engine = Arc::new(ShaperEngine::default());
    engine.attach(1, 8, Arc::new(StaticDriver::full())).unwrap();

    let writers = (0..4u32)
        .map(|group| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let parent = Handle::group(group);
                let queues = [Handle::queue(group * 2), Handle::queue(group * 2 + 1)];
                for _ in 0..200 {
                    let mut batch = vec![ShaperNode::new(parent).with_bw_max(1_000)];
                    batch.extend(queues.map(|queue| ShaperNode::new(queue).with_parent(parent)));
                    engine.set(1, &batch).unwrap();

                    let removed = engine
                        .delete(1, &[queues[0], queues[1], parent])
                        .unwrap();
                    assert_eq!(removed, 3);
                }
            })
        })
        .collect::<Vec<_>>();

    let readers = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..500 {
                    let shapers = engine.dump(1).unwrap();
                    for node in &shapers {
                        if let Some(parent) = node.parent.filter(|p| *p != Handle::NETDEV) {
                            assert!(
                                shapers.iter().any(|n| n.handle == parent),
                                "{} without parent {parent}",
                                node.handle
                            );
                        }
                    }
                }
            })
        })
        .collect::<Vec<_>>();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert!(engine.dump(1).unwrap().is_empty());
    assert_eq!(engine.stats(1).unwrap().commits(), 4 * 200 * 2);
}
