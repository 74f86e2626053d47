//! Frame driver
//!
//! Owns the world and runs every pass of a frame in the order the lifecycle
//! guarantees depend on.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::world::World;
use tracing::{debug, info, trace, trace_span, warn};

/// Accumulator splitting variable frame time into fixed steps
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    accumulator: f32,
    step: f32,
    max_steps: u32,
}

impl FixedTimestep {
    /// Create an accumulator running `step` second updates, at most `max_steps` per frame
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            accumulator: 0.0,
            step,
            max_steps: max_steps.max(1),
        }
    }

    /// Seconds covered by one fixed step
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add frame time and return the number of fixed steps to run
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);

        // Safety check: prevent spiral of death
        let limit = self.step * self.max_steps as f32;
        if self.accumulator > limit {
            warn!(
                accumulated = self.accumulator,
                limit, "Fixed step accumulator too large, clamping"
            );
            self.accumulator = limit;
        }

        let steps = ((self.accumulator / self.step) as u32).min(self.max_steps);
        self.accumulator -= steps as f32 * self.step;
        steps
    }

    /// How far between two fixed steps the current frame sits, in `[0, 1)`
    pub fn interpolation_alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    pub fn accumulated_time(&self) -> f32 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Runs frames over a [`World`]
pub struct Engine {
    world: World,
    config: EngineConfig,
    fixed: FixedTimestep,
    frame: u64,
}

impl Engine {
    /// Create a frame driver; the configuration is validated first
    pub fn new(config: EngineConfig, world: World) -> Result<Self, EngineError> {
        config.validate()?;
        info!(
            fixed_timestep = config.fixed_timestep,
            max_fixed_steps = config.max_fixed_steps,
            physics = config.physics_enabled,
            "Engine created"
        );
        let fixed = FixedTimestep::new(config.fixed_timestep, config.max_fixed_steps);
        Ok(Self {
            world,
            config,
            fixed,
            frame: 0,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fixed_timestep(&self) -> &FixedTimestep {
        &self.fixed
    }

    /// Number of frames run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Give the world back, e.g. to inspect it after a run
    pub fn into_world(self) -> World {
        self.world
    }

    /// Run one frame of `dt` seconds
    ///
    /// Timers, input dispatch, start, update, fixed updates, late update,
    /// physics, component purge, node purge, layer purge, input reset and
    /// finally render.
    pub fn tick(&mut self, dt: f32) {
        let span = trace_span!("frame", frame = self.frame);
        let _enter = span.enter();
        let world = &mut self.world;

        world.update_component_timers(dt);
        world.dispatch_input();
        world.call_start_components();
        world.call_update_components(dt);

        let steps = self.fixed.accumulate(dt);
        let step = self.fixed.step();
        for _ in 0..steps {
            world.call_fixed_update_components(step);
        }
        trace!(steps, "Fixed updates done");

        world.call_late_update_components(dt);

        if self.config.physics_enabled {
            world.physics_step(dt);
        }

        world.clear_destroyed_components();
        world.clear_destroyed_nodes();
        world.clear_destroyed_layers();

        world.input_mut().clear_frame_data();
        world.render_frame();

        self.frame += 1;
    }

    /// Run `frames` frames of `dt` seconds each
    pub fn run_frames(&mut self, frames: u32, dt: f32) {
        debug!(frames, dt, "Running frames");
        for _ in 0..frames {
            self.tick(dt);
        }
    }
}
