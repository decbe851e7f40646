//! Seeded synthetic workload: wandering actors, homing projectiles, and
//! pooled hit effects, all gated by LOD.

use nimbus_perf::{
    Aabb, EffectKind, EffectParams, EntityHandle, EntityType, InstanceId, PerformanceLayer, Vec2,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Host-side owner reference stored with every indexed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The camera-following player.
    Player,
    /// Index into the actor list.
    Actor(usize),
    /// A projectile fired by the player.
    Projectile,
}

const VIEW_SIZE: Vec2 = Vec2::new(1280.0, 720.0);
const ACTOR_SIZE: f32 = 24.0;
const ACTOR_SPEED: f32 = 60.0;
const PLAYER_SPEED: f32 = 140.0;
const PROJECTILE_SIZE: f32 = 4.0;
const PROJECTILE_SPEED: f32 = 420.0;
const PROJECTILE_LIFETIME: u32 = 90;
const FIRE_EVERY: u64 = 6;
const TARGET_RANGE: f32 = 600.0;
const SEEK_RADIUS: f32 = 300.0;
const HIT_RADIUS: f32 = 16.0;
const SPARK_BURST: usize = 6;
const SPARK_LIFETIME: u32 = 20;
const TEXT_LIFETIME: u32 = 45;

/// Relative spawn weights of the actor population.
const ACTOR_MIX: [(EntityType, u32); 6] = [
    (EntityType::Enemy, 50),
    (EntityType::Pickup, 12),
    (EntityType::Npc, 15),
    (EntityType::Decoration, 14),
    (EntityType::Elite, 8),
    (EntityType::Boss, 1),
];

struct Mover {
    handle: EntityHandle,
    position: Vec2,
    velocity: Vec2,
}

struct Projectile {
    mover: Mover,
    frames_left: u32,
}

struct Effect {
    id: InstanceId,
    tag: EntityType,
    position: Vec2,
    velocity: Vec2,
    frames_left: u32,
}

/// Counters accumulated over the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkloadTotals {
    /// Projectiles fired.
    pub fired: u64,
    /// Projectiles that reached a target.
    pub hits: u64,
    /// Actor updates skipped by stride gating or culling.
    pub skipped_updates: u64,
    /// Effects released early because LOD culled them.
    pub culled_effects: u64,
}

/// Deterministic simulation driving a [`PerformanceLayer`].
pub struct Workload {
    rng: ChaCha8Rng,
    world: Aabb,
    frame: u64,
    player: Mover,
    actors: Vec<Mover>,
    projectiles: Vec<Projectile>,
    effects: Vec<Effect>,
    totals: WorkloadTotals,
}

impl Workload {
    /// Register the player and `actor_count` actors scattered over `world`.
    pub fn spawn(
        layer: &mut PerformanceLayer<Owner>,
        world: Aabb,
        actor_count: usize,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let center = world.center();
        let player = Mover {
            handle: layer.register(
                Owner::Player,
                Aabb::from_center(center, ACTOR_SIZE, ACTOR_SIZE),
                EntityType::Player,
            ),
            position: center,
            velocity: random_direction(&mut rng) * PLAYER_SPEED,
        };

        let actors = (0..actor_count)
            .map(|i| {
                let tag = pick_actor_type(&mut rng);
                let position = Vec2::new(
                    rng.random_range(world.x..world.right()),
                    rng.random_range(world.y..world.bottom()),
                );
                let handle = layer.register(
                    Owner::Actor(i),
                    Aabb::from_center(position, ACTOR_SIZE, ACTOR_SIZE),
                    tag,
                );
                let speed = if tag == EntityType::Decoration { 0.0 } else { ACTOR_SPEED };
                Mover {
                    handle,
                    position,
                    velocity: random_direction(&mut rng) * speed,
                }
            })
            .collect();

        layer.set_view(Aabb::from_center(center, VIEW_SIZE.x, VIEW_SIZE.y), center);

        Self {
            rng,
            world,
            frame: 0,
            player,
            actors,
            projectiles: Vec::new(),
            effects: Vec::new(),
            totals: WorkloadTotals::default(),
        }
    }

    /// Run one frame of game logic against the layer.
    pub fn step(&mut self, layer: &mut PerformanceLayer<Owner>, dt: f32) {
        self.move_player(layer, dt);
        self.update_actors(layer, dt);
        if self.frame % FIRE_EVERY == 0 {
            self.fire(layer);
        }
        self.update_projectiles(layer, dt);
        self.update_effects(layer, dt);
        self.frame += 1;
    }

    /// Counters so far.
    pub fn totals(&self) -> WorkloadTotals {
        self.totals
    }

    /// Live projectiles and effects.
    pub fn in_flight(&self) -> (usize, usize) {
        (self.projectiles.len(), self.effects.len())
    }

    fn move_player(&mut self, layer: &mut PerformanceLayer<Owner>, dt: f32) {
        if self.rng.random_bool(0.01) {
            self.player.velocity = random_direction(&mut self.rng) * PLAYER_SPEED;
        }
        let player = &mut self.player;
        step_within(&mut player.position, &mut player.velocity, self.world, dt, ACTOR_SIZE);
        layer.move_entity(
            self.player.handle,
            Aabb::from_center(self.player.position, ACTOR_SIZE, ACTOR_SIZE),
        );
        let p = self.player.position;
        layer.set_view(Aabb::from_center(p, VIEW_SIZE.x, VIEW_SIZE.y), p);
    }

    fn update_actors(&mut self, layer: &mut PerformanceLayer<Owner>, dt: f32) {
        for actor in &mut self.actors {
            let Some(record) = layer.classify_entity(actor.handle) else {
                continue;
            };
            if record.is_culled() || !layer.should_update(&record) {
                self.totals.skipped_updates += 1;
                continue;
            }
            // Catch up on the frames skipped since the last update.
            let dt = dt * record.stride as f32;
            step_within(&mut actor.position, &mut actor.velocity, self.world, dt, ACTOR_SIZE);
            layer.move_entity(
                actor.handle,
                Aabb::from_center(actor.position, ACTOR_SIZE, ACTOR_SIZE),
            );
        }
    }

    fn fire(&mut self, layer: &mut PerformanceLayer<Owner>) {
        let origin = self.player.position;
        let Some(target) = layer.query_nearest(origin, TARGET_RANGE, Some(self.player.handle))
        else {
            return;
        };
        let Some(aim) = layer
            .entity(target)
            .filter(|r| is_hostile(r.tag))
            .map(|r| r.bounds.center())
        else {
            return;
        };

        let velocity = (aim - origin).normalize_or_zero() * PROJECTILE_SPEED;
        let handle = layer.register(
            Owner::Projectile,
            Aabb::from_center(origin, PROJECTILE_SIZE, PROJECTILE_SIZE),
            EntityType::Projectile,
        );
        self.projectiles.push(Projectile {
            mover: Mover {
                handle,
                position: origin,
                velocity,
            },
            frames_left: PROJECTILE_LIFETIME,
        });
        self.totals.fired += 1;
    }

    fn update_projectiles(&mut self, layer: &mut PerformanceLayer<Owner>, dt: f32) {
        let mut live = Vec::with_capacity(self.projectiles.len());
        for mut projectile in std::mem::take(&mut self.projectiles) {
            let position = projectile.mover.position;
            match nearest_hostile(layer, position) {
                Some((owner, target, distance)) if distance <= HIT_RADIUS => {
                    if let Owner::Actor(i) = owner
                        && let Some(actor) = self.actors.get_mut(i)
                    {
                        // Knock the target away along the projectile's path.
                        actor.velocity =
                            projectile.mover.velocity.normalize_or_zero() * ACTOR_SPEED;
                    }
                    self.spawn_hit_effects(layer, target);
                    layer.unregister(projectile.mover.handle);
                    self.totals.hits += 1;
                    continue;
                }
                Some((_, target, _)) => {
                    projectile.mover.velocity =
                        (target - position).normalize_or_zero() * PROJECTILE_SPEED;
                }
                None => {}
            }

            projectile.frames_left = projectile.frames_left.saturating_sub(1);
            projectile.mover.position += projectile.mover.velocity * dt;
            let inside = self.world.contains_point(projectile.mover.position);
            if projectile.frames_left == 0 || !inside {
                layer.unregister(projectile.mover.handle);
                continue;
            }
            layer.move_entity(
                projectile.mover.handle,
                Aabb::from_center(projectile.mover.position, PROJECTILE_SIZE, PROJECTILE_SIZE),
            );
            live.push(projectile);
        }
        self.projectiles = live;
    }

    fn spawn_hit_effects(&mut self, layer: &mut PerformanceLayer<Owner>, at: Vec2) {
        let damage: u32 = self.rng.random_range(5..250);
        let text = layer.acquire(
            EffectKind::FloatingText,
            &EffectParams::at(at)
                .with_content(format!("-{damage}"))
                .with_color([1.0, 0.3, 0.2, 1.0]),
        );
        self.effects.push(Effect {
            id: text,
            tag: EntityType::DamageNumber,
            position: at,
            velocity: Vec2::new(0.0, -40.0),
            frames_left: TEXT_LIFETIME,
        });

        for _ in 0..SPARK_BURST {
            let id = layer.acquire(EffectKind::Spark, &EffectParams::at(at));
            let speed: f32 = self.rng.random_range(30.0..120.0);
            self.effects.push(Effect {
                id,
                tag: EntityType::Particle,
                position: at,
                velocity: random_direction(&mut self.rng) * speed,
                frames_left: SPARK_LIFETIME,
            });
        }
    }

    fn update_effects(&mut self, layer: &mut PerformanceLayer<Owner>, dt: f32) {
        let mut live = Vec::with_capacity(self.effects.len());
        for mut effect in std::mem::take(&mut self.effects) {
            let record = layer.classify(effect.position, effect.tag);
            effect.frames_left = effect.frames_left.saturating_sub(1);
            if record.is_culled() {
                layer.release(effect.id);
                self.totals.culled_effects += 1;
                continue;
            }
            if effect.frames_left == 0 {
                layer.release(effect.id);
                continue;
            }
            if layer.should_update(&record) {
                effect.position += effect.velocity * dt * record.stride as f32;
                if let Some(fx) = layer.effect_mut(effect.id) {
                    fx.position = effect.position;
                    fx.scale = record.quality;
                }
            }
            live.push(effect);
        }
        self.effects = live;
    }

    /// Release every outstanding effect and projectile.
    pub fn despawn_transients(&mut self, layer: &mut PerformanceLayer<Owner>) {
        for effect in self.effects.drain(..) {
            layer.release(effect.id);
        }
        for projectile in self.projectiles.drain(..) {
            layer.unregister(projectile.mover.handle);
        }
    }
}

fn is_hostile(tag: EntityType) -> bool {
    matches!(tag, EntityType::Enemy | EntityType::Elite | EntityType::Boss)
}

/// Owner, center and distance of the closest hostile within seek range.
fn nearest_hostile(layer: &PerformanceLayer<Owner>, from: Vec2) -> Option<(Owner, Vec2, f32)> {
    layer
        .query_radius(from, SEEK_RADIUS)
        .into_iter()
        .filter_map(|h| {
            let record = layer.entity(h)?;
            if !is_hostile(record.tag) {
                return None;
            }
            let center = record.bounds.center();
            Some((record.owner, center, center.distance(from)))
        })
        .min_by(|a, b| a.2.total_cmp(&b.2))
}

/// Integrate a box of `size` and bounce it off the world edges.
fn step_within(position: &mut Vec2, velocity: &mut Vec2, world: Aabb, dt: f32, size: f32) {
    let half = size * 0.5;
    let mut next = *position + *velocity * dt;
    if next.x - half < world.x || next.x + half > world.right() {
        velocity.x = -velocity.x;
        next.x = next.x.clamp(world.x + half, world.right() - half);
    }
    if next.y - half < world.y || next.y + half > world.bottom() {
        velocity.y = -velocity.y;
        next.y = next.y.clamp(world.y + half, world.bottom() - half);
    }
    *position = next;
}

fn random_direction(rng: &mut ChaCha8Rng) -> Vec2 {
    let angle: f32 = rng.random_range(0.0..std::f32::consts::TAU);
    Vec2::new(angle.cos(), angle.sin())
}

fn pick_actor_type(rng: &mut ChaCha8Rng) -> EntityType {
    let total: u32 = ACTOR_MIX.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for (tag, weight) in ACTOR_MIX {
        if roll < weight {
            return tag;
        }
        roll -= weight;
    }
    EntityType::Enemy
}
