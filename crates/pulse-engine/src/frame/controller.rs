use std::time::Instant;

use anyhow::{Context, Result, bail};

use crate::paint::Color;
use crate::sync::{Fence, FenceBackend};
use crate::time::FpsCounter;

use super::pool::FramePool;
use super::present::{PresentParams, Swapchain};
use super::queue::{CommandQueue, Submission};

/// Lifecycle of the frame loop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Uninitialized,
    Running,
    Draining,
    Terminated,
}

/// Window-system input consumed at the top of an iteration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopEvent {
    Quit,
    ToggleVsync,
    Resized { width: u32, height: u32 },
}

/// Loop settings fixed at construction.
#[derive(Debug, Copy, Clone)]
pub struct LoopConfig {
    pub vsync: bool,
    pub clear_color: Color,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            clear_color: Color::CORNFLOWER_BLUE,
        }
    }
}

/// Owns the surface, queue, fence and per-slot resources, and drives
/// update → render → present.
///
/// Per frame: record into the current slot, submit, present, signal the fence,
/// ask the surface for the next slot and wait until that slot's previous
/// submission has retired. The wait guarantees the next `begin_frame` never
/// resets an allocator the GPU is still reading.
pub struct FrameLoop<S, Q, F>
where
    S: Swapchain,
    Q: CommandQueue<S>,
    F: FenceBackend,
{
    state: LoopState,
    surface: S,
    queue: Q,
    fence: Fence<F>,
    pool: FramePool,
    current_slot: usize,
    vsync: bool,
    clear_color: Color,
    fps: FpsCounter,
    frames_presented: u64,
}

impl<S, Q, F> FrameLoop<S, Q, F>
where
    S: Swapchain,
    Q: CommandQueue<S>,
    F: FenceBackend,
{
    /// Assembles the loop around ready GPU objects. The loop starts `Uninitialized`.
    pub fn new(surface: S, queue: Q, fence: F, config: LoopConfig) -> Self {
        let pool = FramePool::new(surface.buffer_count());
        let current_slot = surface.current_slot_index();

        Self {
            state: LoopState::Uninitialized,
            surface,
            queue,
            fence: Fence::new(fence),
            pool,
            current_slot,
            vsync: config.vsync,
            clear_color: config.clear_color,
            fps: FpsCounter::new(),
            frames_presented: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    pub fn vsync(&self) -> bool {
        self.vsync
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn fence(&self) -> &Fence<F> {
        &self.fence
    }

    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    /// Enters `Running`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != LoopState::Uninitialized {
            bail!("frame loop already started ({:?})", self.state);
        }

        self.current_slot = self.surface.current_slot_index();
        self.fps.reset();
        self.state = LoopState::Running;

        log::info!(
            "frame loop running: {} slots, vsync {}, tearing {}",
            self.pool.slot_count(),
            on_off(self.vsync),
            if self.surface.tearing_supported() { "supported" } else { "unsupported" },
        );
        Ok(())
    }

    /// Runs one iteration: consume `events`, then update and render.
    ///
    /// A [`LoopEvent::Quit`] moves the loop to `Draining` and skips the rest
    /// of the iteration, including any events queued after it. While the
    /// surface has no drawable area nothing is updated or rendered. Any error
    /// moves the loop to `Draining`. Returns the state after the iteration.
    pub fn run_iteration<I>(&mut self, events: I) -> Result<LoopState>
    where
        I: IntoIterator<Item = LoopEvent>,
    {
        if self.state != LoopState::Running {
            return Ok(self.state);
        }

        for event in events {
            match event {
                LoopEvent::Quit => {
                    log::info!("quit requested");
                    self.state = LoopState::Draining;
                    return Ok(self.state);
                }
                LoopEvent::ToggleVsync => self.toggle_vsync(),
                LoopEvent::Resized { width, height } => {
                    if let Err(err) = self.resize(width, height) {
                        self.state = LoopState::Draining;
                        return Err(err);
                    }
                }
            }
        }

        if !self.surface.is_drawable() {
            return Ok(self.state);
        }

        self.update(Instant::now());

        if let Err(err) = self.render() {
            self.state = LoopState::Draining;
            return Err(err);
        }

        Ok(self.state)
    }

    /// Whether the next iteration will render. False while minimized.
    pub fn is_drawable(&self) -> bool {
        self.surface.is_drawable()
    }

    /// Flips vsync. Affects only the arguments of the next present.
    pub fn toggle_vsync(&mut self) {
        self.vsync = !self.vsync;
        log::info!("vsync {}", on_off(self.vsync));
    }

    /// Advances the frame accumulator and reports FPS once per second.
    pub fn update(&mut self, now: Instant) {
        if let Some(sample) = self.fps.tick(now) {
            log::info!(
                "fps: {:.1} ({} frames in {:.3}s)",
                sample.fps,
                sample.frames,
                sample.elapsed.as_secs_f64()
            );
        }
    }

    /// Records, submits and presents one frame, then waits for the next slot.
    pub fn render(&mut self) -> Result<()> {
        let slot = self.current_slot;
        let completed = self.fence.completed_value();

        self.pool.begin_frame(slot, completed);
        self.pool.record_clear(self.clear_color);
        let list = self.pool.end_frame();

        let submission = self
            .queue
            .execute(list, &mut self.surface)
            .with_context(|| format!("failed to execute frame for slot {slot}"))?;

        if submission == Submission::Submitted {
            self.fence.note_submission();

            let params = PresentParams::new(self.vsync, self.surface.tearing_supported());
            self.surface.present(params).context("present failed")?;
            self.frames_presented += 1;
        }

        let value = self.fence.signal()?;
        self.pool.set_fence_value(slot, value);

        self.current_slot = self.surface.current_slot_index();
        let wait_for = self.pool.fence_value(self.current_slot);

        log::trace!(
            "frame {} slot {slot} -> fence {value}; next slot {} waits for {wait_for}",
            self.fps.total_frames(),
            self.current_slot
        );

        self.fence.wait_until(wait_for, None)?;
        Ok(())
    }

    /// Drains the queue and recreates the back-buffers at the new size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.fence.flush().context("flush before resize failed")?;
        self.surface.resize(width, height);
        self.current_slot = self.surface.current_slot_index();
        self.fps.reset();

        if self.surface.is_drawable() {
            log::debug!("resized to {width}x{height}; current slot {}", self.current_slot);
        } else {
            log::debug!("surface has no drawable area; rendering paused");
        }
        Ok(())
    }

    /// Waits for all GPU work to retire and enters `Terminated`.
    ///
    /// Safe to call from any state; only the first call after `start` flushes.
    pub fn shutdown(&mut self) -> Result<()> {
        match self.state {
            LoopState::Terminated => return Ok(()),
            LoopState::Uninitialized => {
                self.state = LoopState::Terminated;
                return Ok(());
            }
            LoopState::Running | LoopState::Draining => {}
        }

        self.state = LoopState::Draining;
        let value = self.fence.flush().context("final flush failed")?;
        self.state = LoopState::Terminated;

        log::info!(
            "frame loop terminated after {} presented frames (fence {value})",
            self.frames_presented
        );
        Ok(())
    }
}

impl<S, Q, F> Drop for FrameLoop<S, Q, F>
where
    S: Swapchain,
    Q: CommandQueue<S>,
    F: FenceBackend,
{
    fn drop(&mut self) {
        // GPU objects are released with the loop; nothing may still be in flight.
        if let Err(err) = self.shutdown() {
            log::error!("frame loop dropped without a clean flush: {err:#}");
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
