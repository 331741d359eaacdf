use engine::sim::{Aabb, ParticleCommand, Vec2};

pub(crate) const DUST_LIFESPAN_SECONDS: f32 = 0.2;
const DUST_ALPHA_START: f32 = 1.0;
const DUST_ALPHA_END: f32 = 0.1;
const DUST_SIZE_START_PX: f32 = 3.0;
const DUST_SIZE_END_PX: f32 = 5.0;
const DUST_MAX_ALIVE: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DustParticle {
    position: Vec2,
    velocity: Vec2,
    age_seconds: f32,
}

impl DustParticle {
    fn progress(&self) -> f32 {
        (self.age_seconds / DUST_LIFESPAN_SECONDS).clamp(0.0, 1.0)
    }

    pub(crate) fn alpha(&self) -> f32 {
        lerp(DUST_ALPHA_START, DUST_ALPHA_END, self.progress())
    }

    pub(crate) fn bounds(&self) -> Aabb {
        let size = lerp(DUST_SIZE_START_PX, DUST_SIZE_END_PX, self.progress());
        Aabb::from_center(self.position, Vec2::new(size, size))
    }
}

/// Walking dust. Emits one particle per tick while the controller asks for
/// it; live particles keep fading after the emitter stops.
#[derive(Debug, Default)]
pub(crate) struct DustEmitter {
    particles: Vec<DustParticle>,
}

impl DustEmitter {
    pub(crate) fn update(&mut self, dt: f32, command: &ParticleCommand, anchor: Vec2) {
        for particle in &mut self.particles {
            particle.age_seconds += dt;
            particle.position += particle.velocity * dt;
        }
        self.particles
            .retain(|particle| particle.age_seconds < DUST_LIFESPAN_SECONDS);

        if command.active && self.particles.len() < DUST_MAX_ALIVE {
            self.particles.push(DustParticle {
                position: anchor + command.follow_offset,
                velocity: command.speed,
                age_seconds: 0.0,
            });
        }
    }

    pub(crate) fn clear(&mut self) {
        self.particles.clear();
    }

    pub(crate) fn particles(&self) -> &[DustParticle] {
        &self.particles
    }
}

fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}
