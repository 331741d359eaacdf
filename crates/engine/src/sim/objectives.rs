use tracing::info;

use super::context::{SimEvent, TickContext};
use super::math::Aabb;
use crate::level::{ObjectCategory, ObjectPlacement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickupId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickupKind {
    Coin,
    Key,
    Flag,
}

impl From<ObjectCategory> for PickupKind {
    fn from(category: ObjectCategory) -> Self {
        match category {
            ObjectCategory::Coin => PickupKind::Coin,
            ObjectCategory::Key => PickupKind::Key,
            ObjectCategory::Finish => PickupKind::Flag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    id: PickupId,
    kind: PickupKind,
    bounds: Aabb,
    alive: bool,
}

impl Pickup {
    pub fn id(&self) -> PickupId {
        self.id
    }

    pub fn kind(&self) -> PickupKind {
        self.kind
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn alive(&self) -> bool {
        self.alive
    }
}

/// Owns every coin, key, and flag of a level instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectiveTracker {
    pickups: Vec<Pickup>,
}

impl ObjectiveTracker {
    pub fn from_placements(placements: &[ObjectPlacement]) -> Self {
        let pickups = placements
            .iter()
            .enumerate()
            .map(|(index, placement)| Pickup {
                id: PickupId(index as u32),
                kind: placement.category.into(),
                bounds: placement.bounds,
                alive: true,
            })
            .collect();
        Self { pickups }
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn live_pickups(&self) -> impl Iterator<Item = &Pickup> + '_ {
        self.pickups.iter().filter(|pickup| pickup.alive)
    }

    pub fn remaining(&self, kind: PickupKind) -> usize {
        self.live_pickups()
            .filter(|pickup| pickup.kind == kind)
            .count()
    }

    /// Overlap pass against the body's resolved position. Returns true when
    /// the flag was reached during this call.
    pub fn check_overlaps(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let player = ctx.body.aabb();
        let mut reached_flag = false;

        for pickup in self.pickups.iter_mut().filter(|pickup| pickup.alive) {
            if !pickup.bounds.intersects(&player) {
                continue;
            }
            pickup.alive = false;
            match pickup.kind {
                PickupKind::Coin => {
                    ctx.state.record_coin();
                    ctx.events.push(SimEvent::CoinCollected { pickup: pickup.id });
                }
                PickupKind::Key => {
                    ctx.state.collect_key();
                    ctx.events.push(SimEvent::KeyCollected { pickup: pickup.id });
                    info!(pickup = pickup.id.0, "key_collected");
                }
                PickupKind::Flag => {
                    if ctx.state.finish() {
                        reached_flag = true;
                        ctx.events.push(SimEvent::FlagReached { pickup: pickup.id });
                        info!(
                            pickup = pickup.id.0,
                            coins = ctx.state.coins_collected(),
                            has_key = ctx.state.has_key(),
                            "flag_reached"
                        );
                    }
                }
            }
        }

        reached_flag
    }
}
