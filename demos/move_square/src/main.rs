use anyhow::Result;
use nudge2d::{Camera2D, Engine, EngineContext, Game, Vec2};

mod session;

use session::{Session, SQUARE_COLOR, SQUARE_SIZE};

const BACKGROUND: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

struct MoveSquare {
    session: Session,
    camera: Camera2D,
}

impl Game for MoveSquare {
    fn update(&mut self, ctx: &mut EngineContext) -> Result<()> {
        while ctx.should_run_fixed_update() {
            let tokens = ctx.keys().drain();
            if !tokens.is_empty() {
                log::debug!("keys this frame: {tokens:?}");
            }
            self.session.advance(tokens);
        }
        Ok(())
    }

    fn draw(&mut self, ctx: &mut EngineContext) -> Result<()> {
        let renderer = ctx.renderer();
        let mut frame = renderer.begin_frame()?;

        renderer.clear(&mut frame, BACKGROUND)?;
        renderer.fill_rect(
            &mut frame,
            self.session.position,
            Vec2::new(SQUARE_SIZE, SQUARE_SIZE),
            SQUARE_COLOR,
            &self.camera,
        )?;

        renderer.end_frame(frame)?;
        Ok(())
    }
}

fn main() -> Result<()> {
    // Info-level default; RUST_LOG overrides. GPU backend logs are
    // noisy, keep them off unless asked for.
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or("info,wgpu_hal=off,wgpu_core=off,wgpu=off,naga=off"),
    )
    .init();

    Engine::new()
        .with_title("Move the Square")
        .with_size(300, 300)
        .with_vsync(true)
        .run(MoveSquare {
            session: Session::new(),
            camera: Camera2D::new(Vec2::ZERO),
        })
}
