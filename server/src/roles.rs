//! Quota-constrained random role assignment.
//!
//! Quotas scale with the number of in-world (PLAYER-group) records:
//! mafia and police each get 20% rounded half up with a floor of 1, the
//! doctor is always a single slot. Below the minimum team size the quotas
//! collapse to exactly one of each. Records that already hold a fixed role
//! count against the quotas; only RANDOM records are reassigned, and no
//! record is ever created or destroyed here.

use rand::seq::SliceRandom;
use rand::Rng;
use shared::{Group, PlayerRecord, Role};

/// Team size below which quotas collapse to one of each constrained role.
pub const MIN_PLAYERS_FOR_QUOTAS: usize = 5;

/// Maximum counts permitted for the constrained roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleQuotas {
    pub mafia: usize,
    pub police: usize,
    pub doctor: usize,
}

/// Computes quotas from the number of PLAYER-group records.
pub fn role_quotas(total: usize) -> RoleQuotas {
    if total < MIN_PLAYERS_FOR_QUOTAS {
        return RoleQuotas {
            mafia: 1,
            police: 1,
            doctor: 1,
        };
    }

    let scaled = ((total as f32) * 0.2).round() as usize;
    RoleQuotas {
        mafia: scaled.max(1),
        police: scaled.max(1),
        doctor: 1,
    }
}

/// Reassigns every RANDOM record in place.
///
/// Builds a pool of outstanding quota slots, fills the remainder by
/// round-robin over the citizen jobs, shuffles, then assigns pool entries
/// to RANDOM records in their original order. Pool exhaustion cannot
/// happen by construction; FARMER is the fallback if it does.
pub fn distribute_roles<R: Rng>(records: &mut [&mut PlayerRecord], rng: &mut R) {
    let total = records
        .iter()
        .filter(|record| record.group == Group::Player)
        .count();
    let quotas = role_quotas(total);

    let mut fixed_mafia = 0;
    let mut fixed_police = 0;
    let mut fixed_doctor = 0;
    let mut random_slots: Vec<usize> = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match record.role {
            Role::Random => random_slots.push(index),
            Role::Mafia => fixed_mafia += 1,
            Role::Police => fixed_police += 1,
            Role::Doctor => fixed_doctor += 1,
            // Citizens and the jobs hold no quota.
            Role::Citizen | Role::Farmer | Role::Miner | Role::Fisher => {}
        }
    }

    let mut pool: Vec<Role> = Vec::with_capacity(random_slots.len());
    pool.extend(std::iter::repeat(Role::Mafia).take(quotas.mafia.saturating_sub(fixed_mafia)));
    pool.extend(std::iter::repeat(Role::Police).take(quotas.police.saturating_sub(fixed_police)));
    pool.extend(std::iter::repeat(Role::Doctor).take(quotas.doctor.saturating_sub(fixed_doctor)));

    let remainder = random_slots.len().saturating_sub(pool.len());
    for slot in 0..remainder {
        pool.push(Role::CITIZEN_JOBS[slot % Role::CITIZEN_JOBS.len()]);
    }

    pool.shuffle(rng);

    for (pool_index, record_index) in random_slots.into_iter().enumerate() {
        records[record_index].role = pool.get(pool_index).copied().unwrap_or(Role::Farmer);
    }
}
