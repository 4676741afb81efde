pub mod collab;
pub mod combatant;
pub mod game_trait;
pub mod math;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};
    use std::rc::Rc;

    use glam::{Quat, Vec2, Vec3};

    use crate::collab::{
        AudioOutput, LayerMask, ParticleEmitter, RandomSource, RayHit, RayQuery, TracerHandle,
        TriggerInteraction, VisualEffect,
    };
    use crate::combatant::{Combatant, CombatantLookup, EntityId, Health, HealthChange, MeleeStrike};
    use crate::game_trait::{GameEvent, PlayerInputs, PlayerScore, Simulation};

    /// `RandomSource` that replays scripted values, then falls back to a constant.
    pub struct ScriptedRandom {
        samples: VecDeque<Vec2>,
        fallback: Vec2,
        indices: VecDeque<usize>,
    }

    impl ScriptedRandom {
        /// Always returns `sample`.
        pub fn constant(sample: Vec2) -> Self {
            Self {
                samples: VecDeque::new(),
                fallback: sample,
                indices: VecDeque::new(),
            }
        }

        /// Replays `samples` in order, then returns the disk center.
        pub fn sequence(samples: impl IntoIterator<Item = Vec2>) -> Self {
            Self {
                samples: samples.into_iter().collect(),
                fallback: Vec2::ZERO,
                indices: VecDeque::new(),
            }
        }

        /// Scripted answers for `pick_index` (taken modulo the requested length).
        pub fn with_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
            self.indices = indices.into_iter().collect();
            self
        }
    }

    impl RandomSource for ScriptedRandom {
        fn sample_unit_disk(&mut self) -> Vec2 {
            self.samples.pop_front().unwrap_or(self.fallback)
        }

        fn pick_index(&mut self, len: usize) -> usize {
            let i = self.indices.pop_front().unwrap_or(0);
            if len == 0 { 0 } else { i % len }
        }
    }

    /// A call observed by `RecordingAudio`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum AudioCall {
        OneShot(String),
        Play(String),
        Looping(bool),
    }

    pub type AudioLog = Rc<RefCell<Vec<AudioCall>>>;

    /// Audio output that records every call into a shared log.
    pub struct RecordingAudio {
        log: AudioLog,
    }

    impl RecordingAudio {
        pub fn new() -> (Self, AudioLog) {
            let log: AudioLog = Rc::default();
            (
                Self {
                    log: Rc::clone(&log),
                },
                log,
            )
        }
    }

    impl AudioOutput for RecordingAudio {
        fn play_one_shot(&mut self, clip: &str) {
            self.log.borrow_mut().push(AudioCall::OneShot(clip.to_string()));
        }

        fn play(&mut self, clip: &str) {
            self.log.borrow_mut().push(AudioCall::Play(clip.to_string()));
        }

        fn set_looping(&mut self, enable: bool) {
            self.log.borrow_mut().push(AudioCall::Looping(enable));
        }
    }

    /// Particle emitter that counts emissions.
    pub struct CountingParticles {
        count: Rc<Cell<u32>>,
    }

    impl CountingParticles {
        pub fn new() -> (Self, Rc<Cell<u32>>) {
            let count = Rc::new(Cell::new(0));
            (
                Self {
                    count: Rc::clone(&count),
                },
                count,
            )
        }
    }

    impl ParticleEmitter for CountingParticles {
        fn emit(&mut self) {
            self.count.set(self.count.get() + 1);
        }
    }

    /// In-memory tracer visuals. Tests call `destroy` to simulate the
    /// presentation layer removing a tracer.
    #[derive(Debug, Default)]
    pub struct FakeVisuals {
        next_id: u64,
        alive: HashMap<TracerHandle, Vec3>,
        pub spawned: Vec<(Vec3, Quat)>,
    }

    impl FakeVisuals {
        pub fn destroy(&mut self, handle: TracerHandle) {
            self.alive.remove(&handle);
        }

        pub fn destroy_all(&mut self) {
            self.alive.clear();
        }

        pub fn position(&self, handle: TracerHandle) -> Option<Vec3> {
            self.alive.get(&handle).copied()
        }

        pub fn live_count(&self) -> usize {
            self.alive.len()
        }
    }

    impl VisualEffect for FakeVisuals {
        fn spawn_tracer(&mut self, position: Vec3, orientation: Quat) -> TracerHandle {
            let handle = TracerHandle(self.next_id);
            self.next_id += 1;
            self.alive.insert(handle, position);
            self.spawned.push((position, orientation));
            handle
        }

        fn is_alive(&self, handle: TracerHandle) -> bool {
            self.alive.contains_key(&handle)
        }

        fn set_position(&mut self, handle: TracerHandle, position: Vec3) {
            if let Some(p) = self.alive.get_mut(&handle) {
                *p = position;
            }
        }
    }

    /// Arguments of one recorded ray cast.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct RayCast {
        pub origin: Vec3,
        pub direction: Vec3,
        pub max_distance: f32,
        pub mask: LayerMask,
        pub triggers: TriggerInteraction,
    }

    /// Ray world that answers from a script and records every cast.
    pub struct ScriptedRays {
        results: RefCell<VecDeque<Option<RayHit>>>,
        fallback: Option<RayHit>,
        pub casts: RefCell<Vec<RayCast>>,
    }

    impl ScriptedRays {
        pub fn always(result: Option<RayHit>) -> Self {
            Self {
                results: RefCell::default(),
                fallback: result,
                casts: RefCell::default(),
            }
        }

        pub fn miss() -> Self {
            Self::always(None)
        }

        /// Replays `results` in order, then answers `fallback`.
        pub fn sequence(
            results: impl IntoIterator<Item = Option<RayHit>>,
            fallback: Option<RayHit>,
        ) -> Self {
            Self {
                results: RefCell::new(results.into_iter().collect()),
                fallback,
                casts: RefCell::default(),
            }
        }

        pub fn cast_count(&self) -> usize {
            self.casts.borrow().len()
        }
    }

    impl RayQuery for ScriptedRays {
        fn cast(
            &self,
            origin: Vec3,
            direction: Vec3,
            max_distance: f32,
            mask: LayerMask,
            triggers: TriggerInteraction,
        ) -> Option<RayHit> {
            self.casts.borrow_mut().push(RayCast {
                origin,
                direction,
                max_distance,
                mask,
                triggers,
            });
            self.results
                .borrow_mut()
                .pop_front()
                .unwrap_or(self.fallback)
        }
    }

    /// Combatant with health only.
    #[derive(Debug, Clone)]
    pub struct Dummy {
        pub id: EntityId,
        pub health: Health,
    }

    impl Combatant for Dummy {
        fn id(&self) -> EntityId {
            self.id
        }

        fn health(&self) -> i32 {
            self.health.current
        }

        fn apply_damage(&mut self, change: i32) -> HealthChange {
            self.health.apply(change)
        }

        fn melee_attack(&mut self) -> Option<MeleeStrike> {
            None
        }
    }

    /// `CombatantLookup` over a map of dummies.
    #[derive(Debug, Default)]
    pub struct CombatantTable {
        pub entries: HashMap<EntityId, Dummy>,
    }

    impl CombatantTable {
        pub fn with(mut self, id: EntityId, max_health: i32) -> Self {
            self.entries.insert(
                id,
                Dummy {
                    id,
                    health: Health::full(max_health),
                },
            );
            self
        }

        pub fn health(&self, id: EntityId) -> Option<i32> {
            self.entries.get(&id).map(|d| d.health.current)
        }
    }

    impl CombatantLookup for CombatantTable {
        fn combatant_mut(&mut self, id: EntityId) -> Option<&mut dyn Combatant> {
            self.entries.get_mut(&id).map(|d| d as &mut dyn Combatant)
        }

        fn is_alive(&self, id: EntityId) -> bool {
            self.entries.get(&id).is_some_and(|d| d.health.is_alive())
        }
    }

    /// Run `n` updates with empty inputs, returning all accumulated events.
    pub fn run_sim_ticks(sim: &mut dyn Simulation, n: usize, dt: f32) -> Vec<GameEvent> {
        let empty = PlayerInputs::default();
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(sim.update(dt, &empty));
        }
        all_events
    }

    // ================================================================
    // Simulation Contract Tests
    // ================================================================
    // Every Simulation implementation must pass these. Session crates call
    // them from their own #[cfg(test)] modules with a concrete instance.

    /// update() with dt>0 must change the serialized state.
    pub fn contract_update_advances_time(sim: &mut dyn Simulation) {
        let before = sim.serialize_state();
        sim.update(1.0, &PlayerInputs::default());
        let after = sim.serialize_state();
        assert_ne!(before, after, "update(dt>0) must advance session state");
    }

    /// serialize → apply → serialize must be stable.
    pub fn contract_state_roundtrip_preserves(sim: &mut dyn Simulation) {
        let state_a = sim.serialize_state();
        sim.apply_state(&state_a);
        let state_b = sim.serialize_state();
        sim.apply_state(&state_b);
        let state_c = sim.serialize_state();
        assert_eq!(
            state_b, state_c,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// pause() must freeze state, resume() must unfreeze it.
    pub fn contract_pause_stops_updates(sim: &mut dyn Simulation) {
        sim.pause();
        assert!(sim.is_paused());
        let before = sim.serialize_state();
        sim.update(1.0, &PlayerInputs::default());
        let during_pause = sim.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");

        sim.resume();
        sim.update(1.0, &PlayerInputs::default());
        let after_resume = sim.serialize_state();
        assert_ne!(during_pause, after_resume, "State must change after resume");
    }

    /// Malformed state bytes must be ignored.
    pub fn contract_malformed_state_ignored(sim: &mut dyn Simulation) {
        let before = sim.serialize_state();
        sim.apply_state(&[0xc1, 0xff, 0x00]);
        assert_eq!(before, sim.serialize_state(), "Malformed snapshot must be dropped");
    }

    /// round_results() must return one entry per scoring player.
    pub fn contract_round_results_complete(
        sim: &dyn Simulation,
        expected_players: usize,
    ) -> Vec<PlayerScore> {
        let results = sim.round_results();
        assert_eq!(
            results.len(),
            expected_players,
            "round_results must have one entry per player"
        );
        results
    }
}
