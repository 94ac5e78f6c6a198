//! Chronologically ordered record keys in the Realtime Database push format.
//!
//! A key is 20 characters: 8 encode the millisecond timestamp and 12 are
//! random. Keys generated in the same millisecond reuse the previous random
//! part incremented by one, so they still sort in creation order.

use std::sync::{Mutex, PoisonError};

use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

/// Length of every generated key.
pub const PUSH_ID_LEN: usize = TIME_CHARS + RANDOM_CHARS;

#[derive(Debug, Default)]
struct PushState {
    last_millis: i64,
    last_random: [u8; RANDOM_CHARS],
}

static STATE: Mutex<PushState> = Mutex::new(PushState {
    last_millis: 0,
    last_random: [0; RANDOM_CHARS],
});

/// Generate a new key for the current time.
#[must_use]
pub fn push_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut state = STATE.lock().unwrap_or_else(PoisonError::into_inner);
    generate(now, &mut state, &mut rand::rng())
}

fn generate<R: Rng + ?Sized>(millis: i64, state: &mut PushState, rng: &mut R) -> String {
    if millis == state.last_millis {
        increment(&mut state.last_random);
    } else {
        for slot in &mut state.last_random {
            *slot = rng.random_range(0..64);
        }
    }
    state.last_millis = millis;

    let mut time_part = [0u8; TIME_CHARS];
    let mut remaining = millis.max(0);
    for slot in time_part.iter_mut().rev() {
        *slot = encode(remaining % 64);
        remaining /= 64;
    }

    let mut key = String::with_capacity(PUSH_ID_LEN);
    key.extend(time_part.iter().map(|&b| char::from(b)));
    key.extend(
        state
            .last_random
            .iter()
            .map(|&v| char::from(encode(i64::from(v)))),
    );
    key
}

/// Add one to the base-64 random digits, carrying from the right.
fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}

fn encode(value: i64) -> u8 {
    usize::try_from(value)
        .ok()
        .and_then(|i| PUSH_CHARS.get(i).copied())
        .unwrap_or(b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_alphabet() {
        let id = push_id();
        assert_eq!(id.len(), PUSH_ID_LEN);
        assert!(id.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_same_millisecond_keys_sort_in_order() {
        let mut state = PushState::default();
        let mut rng = rand::rng();
        let first = generate(1_717_000_000_000, &mut state, &mut rng);
        let second = generate(1_717_000_000_000, &mut state, &mut rng);
        assert!(first < second);
        assert_eq!(first[..TIME_CHARS], second[..TIME_CHARS]);
    }

    #[test]
    fn test_later_time_sorts_after() {
        let mut state = PushState::default();
        let mut rng = rand::rng();
        let earlier = generate(1_000, &mut state, &mut rng);
        let later = generate(2_000, &mut state, &mut rng);
        assert!(earlier < later);
    }

    #[test]
    fn test_increment_carries() {
        let mut digits = [0u8; RANDOM_CHARS];
        digits[RANDOM_CHARS - 1] = 63;
        increment(&mut digits);
        assert_eq!(digits[RANDOM_CHARS - 1], 0);
        assert_eq!(digits[RANDOM_CHARS - 2], 1);
    }
}
