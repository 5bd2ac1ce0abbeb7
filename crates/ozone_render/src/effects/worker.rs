//! The effects thread.
//!
//! A strict rendezvous with the render thread over two single-slot channels:
//! [`EffectsWorker::begin`] hands the eye position to the worker, the render
//! thread draws, and [`EffectsWorker::finish`] blocks until the scan for that
//! frame is back. At most one scan is in flight, and camera accumulators are
//! written only by the render thread from the returned [`EffectsScan`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use ozone_core::Vec3;
use ozone_matrix::Orbis;
use parking_lot::RwLock;

use super::{scan_effects, EffectsScan};
use crate::error::{RenderError, RenderResult};

/// Owner of the effects thread.
#[derive(Debug)]
pub struct EffectsWorker {
    /// Scan radius around the eye.
    distance: f32,
    /// Cleared by `unload`; checked by the worker after every wake.
    alive: Arc<AtomicBool>,
    /// Completed scans since creation.
    scans: Arc<AtomicU64>,
    request: Option<Sender<Vec3>>,
    response: Option<Receiver<EffectsScan>>,
    thread: Option<JoinHandle<()>>,
    /// A request was sent and its scan not yet collected.
    pending: bool,
}

impl EffectsWorker {
    /// Creates a stopped worker scanning `distance` units around the eye.
    #[must_use]
    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            alive: Arc::new(AtomicBool::new(false)),
            scans: Arc::new(AtomicU64::new(0)),
            request: None,
            response: None,
            thread: None,
            pending: false,
        }
    }

    /// Starts the thread. A no-op while running.
    pub fn load(&mut self, orbis: Arc<RwLock<Orbis>>) -> RenderResult<()> {
        if self.thread.is_some() {
            tracing::debug!("EffectsWorker: load while running ignored");
            return Ok(());
        }

        let (request_tx, request_rx) = bounded::<Vec3>(1);
        let (response_tx, response_rx) = bounded::<EffectsScan>(1);

        self.alive.store(true, Ordering::Release);

        let alive = Arc::clone(&self.alive);
        let scans = Arc::clone(&self.scans);
        let distance = self.distance;

        let handle = thread::Builder::new()
            .name("ozone-effects".to_owned())
            .spawn(move || Self::run(&orbis, distance, &alive, &scans, &request_rx, &response_tx))
            .map_err(|e| {
                self.alive.store(false, Ordering::Release);
                RenderError::ResourceAllocation(format!("cannot spawn effects thread: {e}"))
            })?;

        self.request = Some(request_tx);
        self.response = Some(response_rx);
        self.thread = Some(handle);
        self.pending = false;

        tracing::info!(distance, "EffectsWorker: loaded");
        Ok(())
    }

    fn run(
        orbis: &RwLock<Orbis>,
        distance: f32,
        alive: &AtomicBool,
        scans: &AtomicU64,
        requests: &Receiver<Vec3>,
        responses: &Sender<EffectsScan>,
    ) {
        while let Ok(eye) = requests.recv() {
            if !alive.load(Ordering::Acquire) {
                break;
            }

            let scan = scan_effects(&orbis.read(), eye, distance);
            scans.fetch_add(1, Ordering::AcqRel);

            if responses.send(scan).is_err() {
                break;
            }
        }
        tracing::debug!("EffectsWorker: thread exiting");
    }

    /// True between `load` and `unload`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// True if a scan was started and not yet collected.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Completed scans since creation.
    #[must_use]
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Acquire)
    }

    /// Wakes the worker to scan around `eye`. Returns false, doing nothing,
    /// if the worker is not running or a scan is already in flight.
    pub fn begin(&mut self, eye: Vec3) -> bool {
        if self.pending {
            tracing::debug!("EffectsWorker: begin with a scan in flight ignored");
            return false;
        }
        let Some(request) = &self.request else {
            return false;
        };

        if request.send(eye).is_err() {
            tracing::error!("EffectsWorker: thread is gone");
            return false;
        }
        self.pending = true;
        true
    }

    /// Blocks until the scan started by `begin` completes. `None` if no scan
    /// is in flight.
    pub fn finish(&mut self) -> Option<EffectsScan> {
        if !self.pending {
            return None;
        }
        self.pending = false;

        let response = self.response.as_ref()?;
        match response.recv() {
            Ok(scan) => Some(scan),
            Err(_) => {
                tracing::error!("EffectsWorker: thread exited during a scan");
                None
            }
        }
    }

    /// Stops and joins the thread. A no-op when not running.
    pub fn unload(&mut self) {
        let Some(handle) = self.thread.take() else {
            tracing::debug!("EffectsWorker: unload while stopped ignored");
            return;
        };

        self.alive.store(false, Ordering::Release);

        // Final wake: the worker sees the flag cleared and leaves its loop.
        if let Some(request) = self.request.take() {
            let _ = request.send(Vec3::ZERO);
        }
        self.response = None;
        self.pending = false;

        if handle.join().is_err() {
            tracing::error!("EffectsWorker: thread panicked");
        }
        tracing::info!(scans = self.scans(), "EffectsWorker: unloaded");
    }
}

impl Drop for EffectsWorker {
    fn drop(&mut self) {
        self.unload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ozone_matrix::Object;

    fn world() -> Arc<RwLock<Orbis>> {
        Arc::new(RwLock::new(Orbis::with_cells(8)))
    }

    #[test]
    fn test_begin_finish_roundtrip() {
        let orbis = world();
        {
            let mut orbis = orbis.write();
            let id = orbis.add_object(Object::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0)));
            if let Some(obj) = orbis.object_mut(id) {
                obj.add_event(Object::EVENT_SHAKE, 0.5);
            }
        }

        let mut worker = EffectsWorker::new(32.0);
        worker.load(Arc::clone(&orbis)).unwrap();
        assert!(worker.is_running());

        assert!(worker.begin(Vec3::ZERO));
        assert!(!worker.begin(Vec3::ZERO));
        let scan = worker.finish().unwrap();
        assert!((scan.shake - 0.5).abs() < 1e-6);
        assert_eq!(worker.finish(), None);
        assert_eq!(worker.scans(), 1);

        worker.unload();
        assert!(!worker.is_running());
    }

    #[test]
    fn test_stopped_worker_ignores_begin() {
        let mut worker = EffectsWorker::new(32.0);
        assert!(!worker.begin(Vec3::ZERO));
        assert_eq!(worker.finish(), None);
        worker.unload();
    }

    #[test]
    fn test_unload_with_scan_in_flight() {
        let mut worker = EffectsWorker::new(32.0);
        worker.load(world()).unwrap();
        assert!(worker.begin(Vec3::ZERO));
        worker.unload();
        assert!(!worker.is_pending());
        assert!(!worker.is_running());
    }

    #[test]
    fn test_reload_after_unload() {
        let orbis = world();
        let mut worker = EffectsWorker::new(32.0);
        worker.load(Arc::clone(&orbis)).unwrap();
        worker.unload();

        worker.load(orbis).unwrap();
        assert!(worker.begin(Vec3::ZERO));
        assert!(worker.finish().is_some());
    }
}
