use std::sync::Arc;

use rand::seq::SliceRandom;
use shaper::{
    Capability, CapabilitySet, CapabilityTable, Error, Handle, Metric, Scope, ShaperEngine,
    ShaperNode, StaticDriver,
};

use crate::helpers::{IFINDEX, engine};

#[test]
fn empty_device() {
    let engine = engine();

    assert!(engine.dump(IFINDEX).unwrap().is_empty());
    for handle in [Handle::PORT, Handle::NETDEV, Handle::group(0), Handle::queue(0)] {
        assert_eq!(engine.get(IFINDEX, handle), Err(Error::NotFound(handle)));
    }
}

#[test]
fn set_then_get_defaults() {
    let engine = engine();

    engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(1)).with_bw_min(10_000)]).unwrap();

    let node = engine.get(IFINDEX, Handle::queue(1)).unwrap();
    assert_eq!(
        node,
        ShaperNode {
            handle: Handle::queue(1),
            parent: Some(Handle::NETDEV),
            metric: Metric::Bps,
            bw_min: 10_000,
            bw_max: 0,
            burst: 0,
            priority: 0,
            weight: 0,
        }
    );
}

#[test]
fn set_two_queues_then_dump() {
    let engine = engine();

    let modified = engine
        .set(
            IFINDEX,
            &[
                ShaperNode::new(Handle::queue(1)).with_bw_min(10_000),
                ShaperNode::new(Handle::queue(2)).with_bw_min(20_000),
            ],
        )
        .unwrap();
    assert_eq!(modified, 2);

    assert!(engine.get(IFINDEX, Handle::queue(0)).unwrap_err().is_not_found());

    let shapers = engine.dump(IFINDEX).unwrap();
    assert_eq!(shapers.len(), 2);
    assert_eq!(shapers[0].bw_min, 10_000);
    assert_eq!(shapers[1].bw_min, 20_000);
    assert!(shapers.iter().all(|node| node.parent == Some(Handle::NETDEV)));
}

#[test]
fn dump_is_ordered() {
    let engine = engine();

    engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(2))]).unwrap();
    engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(1))]).unwrap();

    let ids = engine.dump(IFINDEX).unwrap().iter().map(|node| node.handle.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn dump_is_ordered_across_scopes() {
    let engine = ShaperEngine::default();
    engine.attach(9, 64, Arc::new(StaticDriver::full())).unwrap();

    let mut nodes = vec![ShaperNode::new(Handle::PORT), ShaperNode::new(Handle::NETDEV)];
    nodes.extend((0..4).map(|id| ShaperNode::new(Handle::group(id))));
    nodes.extend((0..64).map(|id| ShaperNode::new(Handle::queue(id))));

    // Parents must come first within a batch, so insert one node per call.
    let mut queues = nodes.split_off(6);
    queues.shuffle(&mut rand::thread_rng());
    for node in nodes.iter().chain(&queues) {
        engine.set(9, &[*node]).unwrap();
    }

    let handles = engine.dump(9).unwrap().iter().map(|node| node.handle).collect::<Vec<_>>();
    let mut sorted = handles.clone();
    sorted.sort();
    assert_eq!(handles, sorted);
    assert_eq!(handles.len(), 70);
    assert_eq!(handles[0], Handle::PORT);
}

#[test]
fn default_hierarchy() {
    let engine = engine();

    engine
        .set(IFINDEX, &[ShaperNode::new(Handle::NETDEV), ShaperNode::new(Handle::queue(0))])
        .unwrap();

    assert_eq!(engine.get(IFINDEX, Handle::queue(0)).unwrap().parent, Some(Handle::NETDEV));
    assert_eq!(engine.get(IFINDEX, Handle::NETDEV).unwrap().parent, Some(Handle::PORT));
}

#[test]
fn set_replaces_wholesale() {
    let engine = engine();

    engine
        .set(IFINDEX, &[ShaperNode::new(Handle::queue(0)).with_bw_max(500).with_priority(2)])
        .unwrap();
    engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(0)).with_weight(7)]).unwrap();

    let node = engine.get(IFINDEX, Handle::queue(0)).unwrap();
    assert_eq!((node.bw_max, node.priority, node.weight), (0, 0, 7));
}

#[test]
fn delete_missing_is_not_an_error() {
    let engine = engine();

    assert_eq!(engine.delete(IFINDEX, &[Handle::queue(0)]).unwrap(), 0);

    engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(1))]).unwrap();
    assert_eq!(engine.delete(IFINDEX, &[Handle::queue(1)]).unwrap(), 1);
    assert_eq!(engine.delete(IFINDEX, &[Handle::queue(1)]).unwrap(), 0);
}

#[test]
fn delete_batch() {
    let engine = engine();

    engine
        .set(IFINDEX, &[ShaperNode::new(Handle::queue(1)), ShaperNode::new(Handle::queue(2))])
        .unwrap();
    engine.delete(IFINDEX, &[Handle::queue(2), Handle::queue(1)]).unwrap();

    assert!(engine.dump(IFINDEX).unwrap().is_empty());
}

#[test]
fn detached_group() {
    let engine = engine();

    engine
        .set(
            IFINDEX,
            &[
                ShaperNode::new(Handle::group(0)).with_bw_max(10_000),
                ShaperNode::new(Handle::queue(1)).with_parent(Handle::group(0)).with_weight(3),
                ShaperNode::new(Handle::queue(2)).with_parent(Handle::group(0)).with_weight(2),
            ],
        )
        .unwrap();

    let queue = engine.get(IFINDEX, Handle::queue(1)).unwrap();
    assert_eq!(queue.parent, Some(Handle::group(0)));
    assert_eq!(queue.weight, 3);
    assert_eq!(engine.get(IFINDEX, Handle::group(0)).unwrap().parent, Some(Handle::NETDEV));

    let err = engine.delete(IFINDEX, &[Handle::group(0)]).unwrap_err();
    assert_eq!(
        err,
        Error::HasChildren {
            handle: Handle::group(0),
            children: vec![Handle::queue(1), Handle::queue(2)],
        }
    );
    assert_eq!(engine.dump(IFINDEX).unwrap().len(), 3);

    // Leaving a single child behind still fails, and removes nothing.
    let err = engine.delete(IFINDEX, &[Handle::queue(1), Handle::group(0)]).unwrap_err();
    assert!(matches!(err, Error::HasChildren { children, .. } if children == [Handle::queue(2)]));
    assert_eq!(engine.dump(IFINDEX).unwrap().len(), 3);

    let removed =
        engine.delete(IFINDEX, &[Handle::queue(2), Handle::queue(1), Handle::group(0)]).unwrap();
    assert_eq!(removed, 3);
    assert!(engine.dump(IFINDEX).unwrap().is_empty());
}

#[test]
fn netdev_keeps_default_children() {
    let engine = engine();

    engine
        .set(
            IFINDEX,
            &[
                ShaperNode::new(Handle::NETDEV).with_bw_max(100_000),
                ShaperNode::new(Handle::queue(0)).with_weight(1),
                ShaperNode::new(Handle::queue(2)).with_weight(2),
            ],
        )
        .unwrap();

    // The queues were never given a parent, yet they hang under netdev:0.
    let err = engine.delete(IFINDEX, &[Handle::NETDEV]).unwrap_err();
    assert_eq!(
        err,
        Error::HasChildren {
            handle: Handle::NETDEV,
            children: vec![Handle::queue(0), Handle::queue(2)],
        }
    );
    assert_eq!(engine.dump(IFINDEX).unwrap().len(), 3);

    let removed =
        engine.delete(IFINDEX, &[Handle::NETDEV, Handle::queue(0), Handle::queue(2)]).unwrap();
    assert_eq!(removed, 3);
}

#[test]
fn queue_can_leave_group() {
    let engine = engine();

    engine
        .set(
            IFINDEX,
            &[
                ShaperNode::new(Handle::group(0)),
                ShaperNode::new(Handle::queue(1)).with_parent(Handle::group(0)),
            ],
        )
        .unwrap();

    // Reparent the queue under the netdev, after which the group is a leaf.
    engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(1))]).unwrap();
    assert_eq!(engine.delete(IFINDEX, &[Handle::group(0)]).unwrap(), 1);
    assert_eq!(engine.get(IFINDEX, Handle::queue(1)).unwrap().parent, Some(Handle::NETDEV));
}

#[test]
fn capability_gating_leaves_store_unchanged() {
    let engine = ShaperEngine::default();
    let queue_caps = CapabilitySet::empty().with(Capability::BwMin);
    let driver = StaticDriver::new(CapabilityTable::new().with_scope(Scope::Queue, queue_caps));
    engine.attach(IFINDEX, 3, Arc::new(driver)).unwrap();

    engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(0)).with_bw_min(100)]).unwrap();

    let err = engine
        .set(
            IFINDEX,
            &[
                ShaperNode::new(Handle::queue(1)).with_bw_min(100),
                ShaperNode::new(Handle::queue(0)).with_bw_max(1_000),
            ],
        )
        .unwrap_err();
    assert!(err.is_unsupported(), "{err}");

    let expected = ShaperNode::new(Handle::queue(0)).with_bw_min(100).with_parent(Handle::NETDEV);
    assert_eq!(engine.dump(IFINDEX).unwrap(), vec![expected]);

    let stats = engine.stats(IFINDEX).unwrap();
    assert_eq!(stats.commits(), 1);
    assert_eq!(stats.rejections(), 1);
    assert_eq!(stats.modified(), 1);
}

#[test]
fn get_checks_scope_before_existence() {
    let engine = ShaperEngine::default();
    let driver =
        StaticDriver::new(CapabilityTable::new().with_scope(Scope::Queue, CapabilitySet::all()));
    engine.attach(IFINDEX, 3, Arc::new(driver)).unwrap();

    assert!(engine.get(IFINDEX, Handle::NETDEV).unwrap_err().is_unsupported());
    assert!(engine.get(IFINDEX, Handle::queue(0)).unwrap_err().is_not_found());
}

#[test]
fn capabilities() {
    let engine = ShaperEngine::default();
    let queue_caps = CapabilitySet::empty().with(Capability::Weight).with(Capability::Nesting);
    let driver = StaticDriver::new(
        CapabilityTable::new()
            .with_scope(Scope::Queue, queue_caps)
            .with_scope(Scope::Netdev, CapabilitySet::all()),
    );
    engine.attach(IFINDEX, 3, Arc::new(driver)).unwrap();

    assert_eq!(engine.cap_get(IFINDEX, Scope::Queue).unwrap(), queue_caps);
    assert!(engine.cap_get(IFINDEX, Scope::Port).unwrap_err().is_unsupported());
    assert_eq!(
        engine.cap_dump(IFINDEX).unwrap(),
        vec![(Scope::Netdev, CapabilitySet::all()), (Scope::Queue, queue_caps)]
    );
}

#[test]
fn detach_destroys_tree() {
    let engine = engine();

    engine
        .set(IFINDEX, &[ShaperNode::new(Handle::NETDEV), ShaperNode::new(Handle::queue(2))])
        .unwrap();
    assert_eq!(engine.detach(IFINDEX).unwrap(), 2);

    engine.attach(IFINDEX, 3, Arc::new(StaticDriver::full())).unwrap();
    assert!(engine.dump(IFINDEX).unwrap().is_empty());
}

#[test]
fn devices_are_independent() {
    let engine = engine();
    engine.attach(IFINDEX + 1, 3, Arc::new(StaticDriver::full())).unwrap();

    engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(0))]).unwrap();

    assert!(engine.dump(IFINDEX + 1).unwrap().is_empty());
    assert_eq!(engine.dump(IFINDEX).unwrap().len(), 1);
}
