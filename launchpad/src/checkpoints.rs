//! Append-only (block, value) histories used for vote power and supply.
//!
//! Each entry lives under its own storage key, so the cost of a write or a
//! lookup does not grow with the length of the history. Only the newest
//! entry may be rewritten, and only while its block is the current one;
//! earlier entries are final.

use shared::types::{Amount, BlockNumber, Checkpoint};
use soroban_sdk::Env;

use crate::storage::{
    get_checkpoint, get_checkpoint_count, set_checkpoint, set_checkpoint_count, History,
};

/// Value of the newest entry, or zero for an empty history.
pub fn latest(env: &Env, history: &History) -> Amount {
    newest(env, history).map(|cp| cp.value).unwrap_or(0)
}

fn newest(env: &Env, history: &History) -> Option<Checkpoint> {
    let count = get_checkpoint_count(env, history);
    if count == 0 {
        return None;
    }
    get_checkpoint(env, history, count - 1)
}

/// Value in effect at `block`: the newest entry whose block is `<= block`.
pub fn value_at(env: &Env, history: &History, block: BlockNumber) -> Amount {
    let count = get_checkpoint_count(env, history);
    if count == 0 {
        return 0;
    }
    if let Some(last) = get_checkpoint(env, history, count - 1) {
        if last.block <= block {
            return last.value;
        }
    }

    // first index whose block is strictly greater than `block`
    let mut low: u32 = 0;
    let mut high: u32 = count - 1;
    while low < high {
        let mid = low + (high - low) / 2;
        match get_checkpoint(env, history, mid) {
            Some(cp) if cp.block > block => high = mid,
            Some(_) => low = mid + 1,
            None => break,
        }
    }
    if low == 0 {
        return 0;
    }
    get_checkpoint(env, history, low - 1)
        .map(|cp| cp.value)
        .unwrap_or(0)
}

/// Record `value` as of `block`.
pub fn push(env: &Env, history: &History, block: BlockNumber, value: Amount) {
    let count = get_checkpoint_count(env, history);
    let checkpoint = Checkpoint { block, value };
    if let Some(last) = newest(env, history) {
        if last.block == block {
            set_checkpoint(env, history, count - 1, &checkpoint);
            return;
        }
    }
    set_checkpoint(env, history, count, &checkpoint);
    set_checkpoint_count(env, history, count + 1);
}
