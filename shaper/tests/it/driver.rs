use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use parking_lot::Mutex;
use shaper::{
    CapabilitySet, Error, Handle, Result, Scope, ShaperEngine, ShaperNode, ShaperOps,
};

use crate::helpers::IFINDEX;

/// A driver that records every call and can be told to fail.
#[derive(Default)]
struct RecordingDriver {
    applied: Mutex<Vec<Vec<ShaperNode>>>,
    removed: Mutex<Vec<Vec<Handle>>>,
    fail: AtomicBool,
}

impl RecordingDriver {
    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::Relaxed) {
            Err(Error::unsupported("hardware queue is busy"))
        } else {
            Ok(())
        }
    }
}

impl ShaperOps for RecordingDriver {
    fn capabilities(&self, scope: Scope) -> Option<CapabilitySet> {
        (scope != Scope::Port).then(CapabilitySet::all)
    }

    fn apply(&self, _ifindex: u32, shapers: &[ShaperNode]) -> Result<()> {
        self.check()?;
        self.applied.lock().push(shapers.to_vec());
        Ok(())
    }

    fn remove(&self, _ifindex: u32, handles: &[Handle]) -> Result<()> {
        self.check()?;
        self.removed.lock().push(handles.to_vec());
        Ok(())
    }
}

fn setup() -> (ShaperEngine, Arc<RecordingDriver>) {
    let _ = tracing_subscriber::fmt::try_init();

    let driver = Arc::new(RecordingDriver::default());
    let engine = ShaperEngine::default();
    engine.attach(IFINDEX, 4, driver.clone()).unwrap();
    (engine, driver)
}

#[test]
fn driver_receives_resolved_batch() {
    let (engine, driver) = setup();

    engine
        .set(
            IFINDEX,
            &[
                ShaperNode::new(Handle::group(1)).with_bw_max(1_000),
                ShaperNode::new(Handle::queue(3)).with_parent(Handle::group(1)),
                ShaperNode::new(Handle::queue(0)),
            ],
        )
        .unwrap();

    let applied = driver.applied.lock();
    assert_eq!(applied.len(), 1);
    let parents = applied[0].iter().map(|node| node.parent).collect::<Vec<_>>();
    assert_eq!(parents, vec![Some(Handle::NETDEV), Some(Handle::group(1)), Some(Handle::NETDEV)]);
}

#[test]
fn driver_removes_children_first() {
    let (engine, driver) = setup();

    engine
        .set(
            IFINDEX,
            &[
                ShaperNode::new(Handle::NETDEV),
                ShaperNode::new(Handle::group(0)),
                ShaperNode::new(Handle::queue(1)).with_parent(Handle::group(0)),
            ],
        )
        .unwrap();

    engine
        .delete(IFINDEX, &[Handle::NETDEV, Handle::group(0), Handle::queue(2), Handle::queue(1)])
        .unwrap();

    let removed = driver.removed.lock();
    assert_eq!(*removed, vec![vec![Handle::queue(1), Handle::group(0), Handle::NETDEV]]);
}

#[test]
fn nothing_to_remove_skips_driver() {
    let (engine, driver) = setup();

    engine.delete(IFINDEX, &[Handle::queue(0), Handle::group(5)]).unwrap();
    assert!(driver.removed.lock().is_empty());
}

#[test]
fn driver_failure_leaves_tree_untouched() {
    let (engine, driver) = setup();

    engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(0)).with_weight(1)]).unwrap();

    driver.fail.store(true, Ordering::Relaxed);

    let err = engine
        .set(
            IFINDEX,
            &[
                ShaperNode::new(Handle::queue(0)).with_weight(9),
                ShaperNode::new(Handle::queue(1)),
            ],
        )
        .unwrap_err();
    assert!(err.is_unsupported());
    assert!(engine.delete(IFINDEX, &[Handle::queue(0)]).unwrap_err().is_unsupported());

    let shapers = engine.dump(IFINDEX).unwrap();
    assert_eq!(shapers.len(), 1);
    assert_eq!(shapers[0].weight, 1);

    let stats = engine.stats(IFINDEX).unwrap();
    assert_eq!(stats.rejections(), 2);
    assert_eq!(stats.removed(), 0);

    driver.fail.store(false, Ordering::Relaxed);
    assert_eq!(engine.delete(IFINDEX, &[Handle::queue(0)]).unwrap(), 1);
    assert_eq!(engine.stats(IFINDEX).unwrap().removed(), 1);
}

#[test]
fn capabilities_are_snapshotted_at_attach() {
    let (engine, _driver) = setup();

    assert!(engine.cap_get(IFINDEX, Scope::Port).unwrap_err().is_unsupported());
    assert!(engine.set(IFINDEX, &[ShaperNode::new(Handle::PORT)]).unwrap_err().is_unsupported());
    assert_eq!(engine.cap_dump(IFINDEX).unwrap().len(), 3);
}

/// A driver whose first `apply` blocks until the test releases it.
struct GatedDriver {
    gated: AtomicBool,
    entered: Barrier,
    release: Barrier,
}

impl GatedDriver {
    fn new() -> Self {
        Self { gated: AtomicBool::new(true), entered: Barrier::new(2), release: Barrier::new(2) }
    }
}

impl ShaperOps for GatedDriver {
    fn capabilities(&self, scope: Scope) -> Option<CapabilitySet> {
        (scope != Scope::Port).then(CapabilitySet::all)
    }

    fn apply(&self, _ifindex: u32, _shapers: &[ShaperNode]) -> Result<()> {
        if self.gated.swap(false, Ordering::SeqCst) {
            self.entered.wait();
            self.release.wait();
        }
        Ok(())
    }

    fn remove(&self, _ifindex: u32, _handles: &[Handle]) -> Result<()> {
        Ok(())
    }
}

#[test]
fn set_racing_detach() {
    let _ = tracing_subscriber::fmt::try_init();

    let driver = Arc::new(GatedDriver::new());
    let engine = ShaperEngine::default();
    engine.attach(IFINDEX, 4, driver.clone()).unwrap();

    thread::scope(|s| {
        let first = s.spawn(|| engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(0))]));
        driver.entered.wait();

        // Resolves the device, then waits for the write lock held by `first`.
        let second = s.spawn(|| engine.set(IFINDEX, &[ShaperNode::new(Handle::queue(1))]));
        thread::sleep(Duration::from_millis(50));

        let detach = s.spawn(|| engine.detach(IFINDEX));
        thread::sleep(Duration::from_millis(50));

        driver.release.wait();

        assert_eq!(first.join().unwrap(), Ok(1));
        let flushed = detach.join().unwrap().unwrap();

        // Either `second` commits before the flush and is counted by it, or it fails.
        match second.join().unwrap() {
            Ok(modified) => {
                assert_eq!(modified, 1);
                assert_eq!(flushed, 2);
            }
            Err(e) => {
                assert_eq!(e, Error::InvalidArgument(format!("device {IFINDEX} not found")));
                assert_eq!(flushed, 1);
            }
        }
    });

    assert!(!engine.is_attached(IFINDEX));
    assert!(engine.dump(IFINDEX).is_err());
}
