//! Flush scheduling
//!
//! Requests to refresh the panel may arrive from any context at any rate.
//! They only raise a [`Signal`]; a single worker coalesces everything that
//! arrives within one refresh quantum and performs one full-frame flush.
//!
//! A flush (encode → SPI write → latch pulse) always runs with the
//! transfer lock held, so at most one frame is on the wire per device.
//! The transfer lock is also what detach waits on before the resources
//! may be released.

use alloc::vec::Vec;
use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_hal::delay::DelayNs;
use embedded_hal_async::delay::DelayNs as AsyncDelayNs;
use portable_atomic::{AtomicU32, Ordering};

use memlcd_core::{
    encode, DeviceState, LcdError, LifecycleEvent, PanelGeometry, PixelSource, TransmitFrame,
};
use memlcd_hal::{OutputPin, SpiBus};

use crate::surface::try_alloc_with;

/// Latch hold time on each edge, in microseconds
pub const LATCH_HOLD_US: u32 = 10;

/// Everything a single flush needs exclusive access to
pub struct Transfer<SPI, PIN, D> {
    frame: TransmitFrame<Vec<u8>>,
    spi: SPI,
    latch: PIN,
    delay: D,
}

impl<SPI, PIN, D> Transfer<SPI, PIN, D>
where
    SPI: SpiBus,
    PIN: OutputPin,
    D: DelayNs,
{
    /// Allocate and lay out the transmit frame for `geometry`
    pub fn new(geometry: PanelGeometry, spi: SPI, latch: PIN, delay: D) -> Result<Self, LcdError> {
        geometry.validate()?;

        let buffer = try_alloc_with(geometry.frame_len(), || 0u8)?;
        // Geometry is valid and the buffer sized from it; nothing else can fail
        let frame =
            TransmitFrame::new(buffer, geometry).map_err(|_| LcdError::AllocationFailure)?;

        Ok(Self {
            frame,
            spi,
            latch,
            delay,
        })
    }

    /// Encode `source`, write the frame and pulse the latch
    ///
    /// The latch is only pulsed after the transport accepted the whole
    /// frame. On error the frame is dropped; the next flush re-encodes
    /// from scratch.
    pub fn send<S>(&mut self, source: &S) -> Result<(), LcdError>
    where
        S: PixelSource + ?Sized,
    {
        encode(source, &mut self.frame).map_err(|_| LcdError::OutOfBounds)?;

        self.spi
            .write(self.frame.as_bytes())
            .map_err(|_| LcdError::Transport)?;

        self.pulse_latch();
        Ok(())
    }

    fn pulse_latch(&mut self) {
        self.latch.set_low();
        self.delay.delay_us(LATCH_HOLD_US);
        self.latch.set_high();
        self.delay.delay_us(LATCH_HOLD_US);
    }

    /// Drive the latch to its idle (high) level
    pub fn release_latch(&mut self) {
        self.latch.set_high();
    }

    /// The most recently encoded frame
    pub fn frame(&self) -> &TransmitFrame<Vec<u8>> {
        &self.frame
    }

    /// Give back the hardware resources
    pub fn into_parts(self) -> (SPI, PIN, D) {
        (self.spi, self.latch, self.delay)
    }
}

/// Flush counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushStats {
    /// Accepted flush requests
    pub requests: u32,
    /// Frames that reached the panel
    pub flushes: u32,
    /// Flushes dropped on a transport error
    pub failures: u32,
}

/// Per-device flush coordinator
///
/// Shareable between tasks and interrupt handlers through `&self`; the
/// raw mutex type `M` picks the locking strategy.
pub struct FlushScheduler<M: RawMutex, SPI, PIN, D> {
    transfer: Mutex<M, Transfer<SPI, PIN, D>>,
    request: Signal<M, ()>,
    state: BlockingMutex<M, Cell<DeviceState>>,
    requests: AtomicU32,
    flushes: AtomicU32,
    failures: AtomicU32,
    quantum_ms: u32,
}

impl<M, SPI, PIN, D> FlushScheduler<M, SPI, PIN, D>
where
    M: RawMutex,
    SPI: SpiBus,
    PIN: OutputPin,
    D: DelayNs,
{
    /// Wrap a transfer; the device starts out uninitialized
    pub fn new(transfer: Transfer<SPI, PIN, D>, quantum_ms: u32) -> Self {
        Self {
            transfer: Mutex::new(transfer),
            request: Signal::new(),
            state: BlockingMutex::new(Cell::new(DeviceState::Uninitialized)),
            requests: AtomicU32::new(0),
            flushes: AtomicU32::new(0),
            failures: AtomicU32::new(0),
            quantum_ms,
        }
    }

    /// Mark the device attached
    pub fn attach(&self) -> DeviceState {
        self.apply(LifecycleEvent::Attach)
    }

    /// Current lifecycle state
    pub fn state(&self) -> DeviceState {
        self.state.lock(|s| s.get())
    }

    /// Snapshot of the flush counters
    pub fn stats(&self) -> FlushStats {
        FlushStats {
            requests: self.requests.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Coalescing window in ms
    pub fn quantum_ms(&self) -> u32 {
        self.quantum_ms
    }

    /// Ask for a refresh
    ///
    /// Never blocks and never touches the bus. Any number of requests
    /// before the worker's next flush collapse into that one flush.
    pub fn request_flush(&self) -> Result<(), LcdError> {
        if !self.state().accepts_requests() {
            return Err(LcdError::Detached);
        }

        self.requests.fetch_add(1, Ordering::Relaxed);
        self.request.signal(());
        Ok(())
    }

    /// Encode `source` and send one frame now
    ///
    /// Waits for any in-flight flush. Transport errors are counted and
    /// returned; the device stays attached.
    pub async fn flush<S>(&self, source: &S) -> Result<(), LcdError>
    where
        S: PixelSource + ?Sized,
    {
        let mut transfer = self.transfer.lock().await;

        if !self.begin_flush() {
            return Err(LcdError::Detached);
        }

        let result = transfer.send(source);
        self.apply(LifecycleEvent::FlushFinished);

        match result {
            Ok(()) => {
                self.flushes.fetch_add(1, Ordering::Relaxed);
            }
            Err(_err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "defmt")]
                defmt::warn!("Flush dropped: {}", _err);
            }
        }

        result
    }

    /// Worker loop: wait for requests, coalesce for one quantum, flush
    ///
    /// Returns once the device starts detaching. Transport errors are
    /// logged and the loop keeps serving requests.
    pub async fn run<S, T>(&self, source: &S, timer: &mut T)
    where
        S: PixelSource + ?Sized,
        T: AsyncDelayNs,
    {
        loop {
            self.request.wait().await;

            if self.state().is_shutting_down() {
                break;
            }

            timer.delay_ms(self.quantum_ms).await;

            // Requests that arrived during the quantum are served by this flush
            self.request.reset();

            // Transport errors were already counted and logged by `flush`
            if let Err(LcdError::Detached) = self.flush(source).await {
                break;
            }
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Flush worker stopped");
    }

    /// Stop accepting work and wait for any in-flight flush to finish
    ///
    /// After this returns no flush will run again and the transfer
    /// resources are free to be reclaimed.
    pub async fn detach(&self) {
        self.apply(LifecycleEvent::DetachRequested);

        // Wake the worker so it observes the state change
        self.request.signal(());

        let _drained = self.transfer.lock().await;
        self.apply(LifecycleEvent::DetachComplete);

        #[cfg(feature = "defmt")]
        defmt::info!("Device detached");
    }

    /// Take the transfer back out of the scheduler
    pub fn into_transfer(self) -> Transfer<SPI, PIN, D> {
        self.transfer.into_inner()
    }

    fn begin_flush(&self) -> bool {
        self.state.lock(|s| {
            let current = s.get();
            if !current.accepts_flush() {
                return false;
            }
            s.set(current.transition(LifecycleEvent::FlushStarted));
            true
        })
    }

    fn apply(&self, event: LifecycleEvent) -> DeviceState {
        self.state.lock(|s| {
            let next = s.get().transition(event);
            s.set(next);
            next
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::thread;
    use std::time::Duration;
    use std::vec;

    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use embassy_futures::yield_now;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use super::*;

    const G: PanelGeometry = PanelGeometry::new(16, 4);

    #[derive(Clone, Default)]
    struct Recorder {
        frames: Arc<StdMutex<Vec<Vec<u8>>>>,
        fail: Arc<AtomicBool>,
        started: Arc<AtomicBool>,
        finished: Arc<AtomicBool>,
        slow_ms: u64,
    }

    impl SpiBus for Recorder {
        type Error = ();

        fn write(&mut self, data: &[u8]) -> Result<(), ()> {
            self.started.store(true, Ordering::SeqCst);
            if self.slow_ms > 0 {
                thread::sleep(Duration::from_millis(self.slow_ms));
            }
            self.finished.store(true, Ordering::SeqCst);

            if self.fail.load(Ordering::SeqCst) {
                return Err(());
            }
            self.frames.lock().unwrap().push(data.to_vec());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct Latch {
        high: Arc<AtomicBool>,
        pulses: Arc<AtomicUsize>,
    }

    impl OutputPin for Latch {
        fn set_high(&mut self) {
            self.high.store(true, Ordering::SeqCst);
        }

        fn set_low(&mut self) {
            self.high.store(false, Ordering::SeqCst);
            self.pulses.fetch_add(1, Ordering::SeqCst);
        }

        fn is_set_high(&self) -> bool {
            self.high.load(Ordering::SeqCst)
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    impl AsyncDelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    type Scheduler = FlushScheduler<CriticalSectionRawMutex, Recorder, Latch, NoDelay>;

    fn scheduler(spi: Recorder, latch: Latch) -> Scheduler {
        let transfer = Transfer::new(G, spi, latch, NoDelay).unwrap();
        let s = FlushScheduler::new(transfer, 16);
        assert_eq!(s.attach(), DeviceState::Attached);
        s
    }

    fn white() -> Vec<u8> {
        vec![255u8; G.surface_len()]
    }

    #[test]
    fn test_flush_sends_frame_and_pulses_latch() {
        let spi = Recorder::default();
        let latch = Latch::default();
        let s = scheduler(spi.clone(), latch.clone());

        block_on(s.flush(white().as_slice())).unwrap();

        let frames = spi.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), G.frame_len());
        assert_eq!(frames[0][0], 0x80);
        assert_eq!(frames[0][2], 0xFF);
        assert_eq!(latch.pulses.load(Ordering::SeqCst), 1);
        assert!(latch.high.load(Ordering::SeqCst));
        assert_eq!(s.state(), DeviceState::Idle);
    }

    #[test]
    fn test_transport_error_releases_lock() {
        let spi = Recorder::default();
        spi.fail.store(true, Ordering::SeqCst);
        let latch = Latch::default();
        let s = scheduler(spi.clone(), latch.clone());

        let surface = white();
        assert_eq!(block_on(s.flush(surface.as_slice())), Err(LcdError::Transport));
        // Would hang if the lock leaked
        assert_eq!(block_on(s.flush(surface.as_slice())), Err(LcdError::Transport));

        assert_eq!(latch.pulses.load(Ordering::SeqCst), 0);
        assert_eq!(s.state(), DeviceState::Idle);
        assert_eq!(s.stats().failures, 2);

        spi.fail.store(false, Ordering::SeqCst);
        block_on(s.flush(surface.as_slice())).unwrap();
        assert_eq!(s.stats().flushes, 1);
        assert_eq!(latch.pulses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_burst_coalesces_into_one_flush() {
        let spi = Recorder::default();
        let s = scheduler(spi.clone(), Latch::default());
        let surface = white();

        let worker = async {
            let mut timer = NoDelay;
            s.run(surface.as_slice(), &mut timer).await;
        };

        let burst = async {
            for _ in 0..100 {
                s.request_flush().unwrap();
            }
            while s.stats().flushes == 0 {
                yield_now().await;
            }
            s.detach().await;
        };

        block_on(join(worker, burst));

        let stats = s.stats();
        assert_eq!(stats.requests, 100);
        assert_eq!(stats.flushes, 1);
        assert_eq!(spi.frames.lock().unwrap().len(), 1);
        assert_eq!(s.state(), DeviceState::Detached);
    }

    #[test]
    fn test_worker_survives_transport_errors() {
        let spi = Recorder::default();
        spi.fail.store(true, Ordering::SeqCst);
        let s = scheduler(spi.clone(), Latch::default());
        let surface = white();

        let worker = async {
            s.run(surface.as_slice(), &mut NoDelay).await;
        };

        let driver = async {
            s.request_flush().unwrap();
            while s.stats().failures == 0 {
                yield_now().await;
            }
            spi.fail.store(false, Ordering::SeqCst);
            s.request_flush().unwrap();
            while s.stats().flushes == 0 {
                yield_now().await;
            }
            s.detach().await;
        };

        block_on(join(worker, driver));
        assert_eq!(s.stats().failures, 1);
        assert_eq!(s.stats().flushes, 1);
    }

    #[test]
    fn test_detach_waits_for_inflight_flush() {
        let spi = Recorder {
            slow_ms: 50,
            ..Recorder::default()
        };
        let s = scheduler(spi.clone(), Latch::default());
        let surface = white();

        thread::scope(|scope| {
            let flusher = scope.spawn(|| block_on(s.flush(surface.as_slice())));

            while !spi.started.load(Ordering::SeqCst) {
                thread::yield_now();
            }

            block_on(s.detach());
            // Detach only returns once the transfer is done
            assert!(spi.finished.load(Ordering::SeqCst));
            assert_eq!(flusher.join().unwrap(), Ok(()));
        });

        assert_eq!(s.state(), DeviceState::Detached);
        assert_eq!(block_on(s.flush(surface.as_slice())), Err(LcdError::Detached));
        assert_eq!(s.request_flush(), Err(LcdError::Detached));
        assert_eq!(spi.frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_requests() {
        let s = scheduler(Recorder::default(), Latch::default());

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        s.request_flush().unwrap();
                    }
                });
            }
        });

        assert_eq!(s.stats().requests, 100);
        // Requests alone never touch the bus
        assert_eq!(s.stats().flushes, 0);
        assert_eq!(s.state(), DeviceState::Attached);
    }

    #[test]
    fn test_uninitialized_rejects_work() {
        let transfer = Transfer::new(G, Recorder::default(), Latch::default(), NoDelay).unwrap();
        let s: Scheduler = FlushScheduler::new(transfer, 16);
        assert_eq!(s.request_flush(), Err(LcdError::Detached));
        assert_eq!(block_on(s.flush(white().as_slice())), Err(LcdError::Detached));
    }

    #[test]
    fn test_into_parts_returns_resources() {
        let spi = Recorder::default();
        let s = scheduler(spi.clone(), Latch::default());
        block_on(s.detach());

        let (spi_back, _latch, _delay) = s.into_transfer().into_parts();
        assert!(Arc::ptr_eq(&spi_back.frames, &spi.frames));
    }
}
