use std::time::{Duration, Instant};

use anyhow::Result;
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{input::KeyQueue, render::Renderer};

/// Fixed frame period: 60 frames per second.
pub const FRAME_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Configuration values for the engine window and runtime behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Nudge2D".into(),
            width: 300,
            height: 300,
            vsync: true,
        }
    }
}

/// Main entrypoint for running a Nudge2D program.
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine instance with default configuration.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Override the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Override the initial window size in logical pixels.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Enable or disable vertical sync.
    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.config.vsync = vsync;
        self
    }

    /// Run the provided game until the window is closed or the game requests exit.
    ///
    /// Window and surface creation fail fast: any initialization error
    /// propagates out before the frame loop starts. Once running, the
    /// loop has a single steady state and only host-level events
    /// (window close, Escape) end it.
    pub fn run<G: Game + 'static>(self, mut game: G) -> Result<()> {
        let config = self.config;

        let event_loop = EventLoop::new()?;
        let mut window_attributes = Window::default_attributes();
        window_attributes.title = config.title.clone();
        window_attributes.inner_size = Some(LogicalSize::new(config.width, config.height).into());
        let window = event_loop.create_window(window_attributes)?;

        // Leak the window to get a 'static reference
        // This is safe because the window lives for the entire program duration
        let window: &'static Window = Box::leak(Box::new(window));

        let mut ctx = EngineContext::new(window, &config)?;
        game.init(&mut ctx)?;
        log::info!(
            "running at {:.2} fps ({}x{})",
            1.0 / FRAME_INTERVAL.as_secs_f64(),
            config.width,
            config.height
        );

        let mut last_frame = Instant::now();
        event_loop.run(move |event, elwt| {
            match event {
                Event::WindowEvent { event, .. } => {
                    ctx.handle_window_event(&event);

                    match event {
                        WindowEvent::CloseRequested => {
                            elwt.exit();
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if is_escape_pressed(&event) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::Resized(new_size) => {
                            ctx.resize_renderer(new_size);
                        }
                        WindowEvent::RedrawRequested => {
                            if let Err(err) = game.draw(&mut ctx) {
                                log::error!("encountered error during draw: {err:?}");
                                elwt.exit();
                                return;
                            }

                            if ctx.exit_requested {
                                elwt.exit();
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => {
                    let now = Instant::now();
                    ctx.update_time(now - last_frame);
                    last_frame = now;

                    if let Err(err) = game.update(&mut ctx) {
                        log::error!("encountered error during update: {err:?}");
                        elwt.exit();
                        return;
                    }

                    if ctx.exit_requested {
                        elwt.exit();
                        return;
                    }

                    ctx.window.request_redraw();
                    // Park until the next frame is due instead of spinning.
                    elwt.set_control_flow(ControlFlow::WaitUntil(now + ctx.timer.remaining()));
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn is_escape_pressed(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(event.physical_key, PhysicalKey::Code(KeyCode::Escape))
}

/// Accumulator-based fixed timestep clock.
///
/// Wall-clock deltas are fed in via [`advance`](FrameTimer::advance);
/// each [`tick`](FrameTimer::tick) consumes one interval once enough
/// time has accumulated. Keeping the clock injectable makes the frame
/// cadence testable without real waits.
pub struct FrameTimer {
    interval: Duration,
    accumulator: Duration,
}

impl FrameTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    /// Feed elapsed wall-clock time into the accumulator.
    pub fn advance(&mut self, delta: Duration) {
        self.accumulator += delta;
    }

    /// Consume one interval if enough time has accumulated.
    ///
    /// Call in a loop until it returns `false` to catch up after a
    /// long frame.
    pub fn tick(&mut self) -> bool {
        if self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            true
        } else {
            false
        }
    }

    /// Time left until the next tick is due.
    pub fn remaining(&self) -> Duration {
        self.interval.saturating_sub(self.accumulator)
    }
}

/// Shared context provided to game code each frame.
pub struct EngineContext<'window> {
    window: &'window winit::window::Window,
    delta_time: Duration,
    elapsed_time: Duration,
    timer: FrameTimer,
    exit_requested: bool,
    keys: KeyQueue,
    renderer: Renderer<'window>,
}

impl<'window> EngineContext<'window> {
    fn new(window: &'window winit::window::Window, config: &EngineConfig) -> Result<Self> {
        let renderer = Renderer::new(window, config.vsync)?;

        Ok(Self {
            window,
            delta_time: Duration::ZERO,
            elapsed_time: Duration::ZERO,
            timer: FrameTimer::new(FRAME_INTERVAL),
            exit_requested: false,
            keys: KeyQueue::new(),
            renderer,
        })
    }

    fn update_time(&mut self, delta: Duration) {
        self.delta_time = delta;
        self.elapsed_time += delta;
        self.timer.advance(delta);
    }

    fn handle_window_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            self.keys.handle_key(event);
        }
    }

    fn resize_renderer(&mut self, new_size: PhysicalSize<u32>) {
        self.renderer.resize(new_size);
    }

    /// Duration between the current and previous loop iterations.
    pub fn delta_time(&self) -> Duration {
        self.delta_time
    }

    /// Total time elapsed since the engine started running.
    pub fn elapsed_time(&self) -> Duration {
        self.elapsed_time
    }

    /// Check if a fixed-rate frame is due and consume accumulated time.
    ///
    /// Returns `true` once per elapsed [`FRAME_INTERVAL`]. Call in a
    /// loop until it returns `false` to handle multiple frames after
    /// a stall.
    pub fn should_run_fixed_update(&mut self) -> bool {
        self.timer.tick()
    }

    /// Access the underlying winit window.
    pub fn window(&self) -> &winit::window::Window {
        self.window
    }

    /// Access the queued key presses.
    pub fn keys(&self) -> &KeyQueue {
        &self.keys
    }

    /// Request that the engine exit after the current frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Access the renderer for drawing operations.
    pub fn renderer(&mut self) -> &mut Renderer<'window> {
        &mut self.renderer
    }
}

/// Trait implemented by user code to hook into the engine lifecycle.
pub trait Game {
    /// Called once after the window is created but before the first frame.
    fn init(&mut self, _ctx: &mut EngineContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Update game state. Called once per loop iteration before drawing.
    fn update(&mut self, ctx: &mut EngineContext<'_>) -> Result<()>;

    /// Draw the current frame. Called after update when a redraw is requested.
    fn draw(&mut self, ctx: &mut EngineContext<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_tick_before_interval_elapses() {
        let mut timer = FrameTimer::new(FRAME_INTERVAL);
        timer.advance(FRAME_INTERVAL / 2);
        assert!(!timer.tick());
    }

    #[test]
    fn one_tick_per_interval() {
        let mut timer = FrameTimer::new(FRAME_INTERVAL);
        timer.advance(FRAME_INTERVAL);
        assert!(timer.tick());
        assert!(!timer.tick());
    }

    #[test]
    fn long_stall_yields_multiple_ticks() {
        let mut timer = FrameTimer::new(FRAME_INTERVAL);
        timer.advance(FRAME_INTERVAL * 3);
        assert!(timer.tick());
        assert!(timer.tick());
        assert!(timer.tick());
        assert!(!timer.tick());
    }

    #[test]
    fn timer_keeps_ticking_indefinitely() {
        // The loop never terminates on its own: after N simulated
        // frames the timer is still scheduled and still ticks.
        let mut timer = FrameTimer::new(FRAME_INTERVAL);
        for _ in 0..1000 {
            timer.advance(FRAME_INTERVAL);
            assert!(timer.tick());
            assert!(!timer.tick());
        }
    }

    #[test]
    fn remaining_counts_down_to_next_tick() {
        let mut timer = FrameTimer::new(Duration::from_millis(10));
        assert_eq!(timer.remaining(), Duration::from_millis(10));
        timer.advance(Duration::from_millis(4));
        assert_eq!(timer.remaining(), Duration::from_millis(6));
        timer.advance(Duration::from_millis(6));
        assert_eq!(timer.remaining(), Duration::ZERO);
        assert!(timer.tick());
        assert_eq!(timer.remaining(), Duration::from_millis(10));
    }
}
