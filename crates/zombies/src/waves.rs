use {bevy::prelude::*, serde::Deserialize};

#[derive(Deserialize, Asset, Clone, Debug, Resource, Reflect)]
pub struct WaveConfig {
    pub initial_delay: f32,
    pub spawn_interval: f32,
    pub spawn_rate_multiplier: f32,
    pub total_waves: u32,
    pub time_between_waves: f32,
    pub wave_zombie_count: u32,
    pub burst_spawn_delay: f32,
    /// (x, y) positions zombies appear at.
    pub spawn_points: Vec<[f32; 2]>,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            initial_delay: 60.0,
            spawn_interval: 3.0,
            spawn_rate_multiplier: 0.8,
            total_waves: 3,
            time_between_waves: 20.0,
            wave_zombie_count: 10,
            burst_spawn_delay: 0.4,
            spawn_points: vec![[-15.0, 0.0], [15.0, 0.0]],
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WaveTick {
    pub spawns: u32,
    pub wave_started: Option<u32>,
}

#[derive(Debug, Clone)]
struct Burst {
    remaining: u32,
    countdown: f32,
}

/// Regular trickle spawns plus timed wave bursts.
///
/// Nothing spawns until `initial_delay` has passed. Regular spawns pause
/// while a burst is running. Once the last wave has started only its burst
/// keeps going.
#[derive(Resource, Debug, Clone)]
pub struct WaveScheduler {
    config: WaveConfig,
    start_delay: f32,
    started: bool,
    spawn_interval: f32,
    next_spawn: f32,
    wave_timer: f32,
    current_wave: u32,
    burst: Option<Burst>,
}

impl WaveScheduler {
    pub fn new(config: WaveConfig) -> Self {
        Self {
            start_delay: config.initial_delay,
            started: false,
            spawn_interval: config.spawn_interval,
            next_spawn: config.spawn_interval,
            wave_timer: config.time_between_waves,
            current_wave: 0,
            burst: None,
            config,
        }
    }

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    pub fn current_wave(&self) -> u32 {
        self.current_wave
    }

    pub fn spawn_interval(&self) -> f32 {
        self.spawn_interval
    }

    pub fn is_bursting(&self) -> bool {
        self.burst.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.current_wave >= self.config.total_waves && self.burst.is_none()
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn tick(&mut self, dt: f32) -> WaveTick {
        let mut tick = WaveTick::default();
        // A burst started this frame already spawned its first zombie.
        let had_burst = self.burst.is_some();
        self.tick_schedule(dt, &mut tick);
        if had_burst {
            self.tick_burst(dt, &mut tick);
        }
        tick
    }

    fn tick_schedule(&mut self, dt: f32, tick: &mut WaveTick) {
        if self.current_wave >= self.config.total_waves {
            return;
        }

        if self.started {
            self.next_spawn -= dt;
        } else {
            self.start_delay -= dt;
            if self.start_delay > 0.0 {
                return;
            }
            self.started = true;
            self.next_spawn = self.spawn_interval;
        }

        if self.next_spawn <= 0.0 && self.burst.is_none() {
            tick.spawns += 1;
            self.next_spawn = self.spawn_interval;
        }

        self.wave_timer -= dt;
        if self.wave_timer <= 0.0 && self.burst.is_none() {
            self.start_wave(tick);
        }
    }

    fn start_wave(&mut self, tick: &mut WaveTick) {
        self.current_wave += 1;
        tick.wave_started = Some(self.current_wave);

        if self.config.wave_zombie_count == 0 {
            self.finish_burst();
            return;
        }
        tick.spawns += 1;
        self.burst = Some(Burst {
            remaining: self.config.wave_zombie_count - 1,
            countdown: self.config.burst_spawn_delay,
        });
    }

    fn tick_burst(&mut self, dt: f32, tick: &mut WaveTick) {
        let delay = self.config.burst_spawn_delay;
        let Some(burst) = self.burst.as_mut() else {
            return;
        };

        burst.countdown -= dt;
        while burst.countdown <= 0.0 {
            if burst.remaining == 0 {
                self.finish_burst();
                return;
            }
            tick.spawns += 1;
            burst.remaining -= 1;
            burst.countdown += delay;
        }
    }

    fn finish_burst(&mut self) {
        self.burst = None;
        self.spawn_interval *= self.config.spawn_rate_multiplier;
        if self.current_wave < self.config.total_waves {
            self.wave_timer = self.config.time_between_waves;
        }
    }
}
