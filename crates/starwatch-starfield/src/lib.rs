//! Procedural starfield: particle layers that twinkle, a slow sky rotation,
//! and shooting stars, driven one frame at a time through a
//! [`RenderSurface`](starwatch_render::RenderSurface).

pub mod error;
pub mod host;
pub mod layer;
pub mod lifecycle;
pub mod scene;
pub mod shooting_star;
pub mod twinkle;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use error::StarfieldError;
pub use host::{HostDisplay, ListenerId, ResizeCallback, ResizeListeners};
pub use layer::{ParticleLayer, StarPoint};
pub use lifecycle::{AnimationLoop, LoopControl, ReleaseReport, StarfieldHandle, start, stop};
pub use scene::{ActiveStar, FrameDriver, FrameStats, SceneLayer, SceneState};
pub use shooting_star::{ShootingStar, ShootingStarSpawner, SpawnTimer};
pub use starwatch_config::{LayerConfig, StarfieldConfig, TwinkleStrategy};
