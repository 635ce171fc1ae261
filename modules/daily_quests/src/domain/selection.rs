use rand::Rng;

use crate::contract::model::Quest;

/// Weight used for picking; non-positive weights still get a minimal chance.
pub fn effective_weight(weight: i32) -> u64 {
    if weight <= 0 {
        1
    } else {
        weight as u64
    }
}

/// Pick one quest with probability proportional to its effective weight.
pub fn weighted_pick<'a, R: Rng + ?Sized>(quests: &'a [Quest], rng: &mut R) -> Option<&'a Quest> {
    let total: u64 = quests.iter().map(|q| effective_weight(q.weight)).sum();
    if total == 0 {
        return None;
    }

    let mut roll = rng.random_range(0..total);
    for quest in quests {
        let w = effective_weight(quest.weight);
        if roll < w {
            return Some(quest);
        }
        roll -= w;
    }
    quests.last()
}
