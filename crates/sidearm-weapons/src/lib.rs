//! Tick-driven weapon firing model.
//!
//! A [`Weapon`] is advanced once per fixed step. Each step it evaluates the
//! fire gate, drives the windup and burst state machines, discharges
//! projectiles through the scene's ray query, and moves its tracers. A
//! [`WeaponManager`] holds a character's weapons and routes trigger and
//! switch input to whichever one is active.

pub mod burst;
pub mod config;
pub mod gate;
pub mod manager;
pub mod spread;
pub mod state;
pub mod tracer;
pub mod weapon;
pub mod windup;

pub use config::{ConfigError, WeaponConfig, WeaponLoadout};
pub use manager::{InputPhase, LoadoutSnapshot, ManagerError, WeaponManager};
pub use state::WeaponRuntimeState;
pub use weapon::{FireContext, Weapon, WeaponEvent, WeaponEvents, WeaponRig};
