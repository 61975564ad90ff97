use std::time::{SystemTime, UNIX_EPOCH};

use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Generates a random alphanumeric string of a given length.
///
/// # Examples
///
/// ```
/// let random_string = utils::generate_random_string(10);
/// assert_eq!(random_string.len(), 10);
/// ```
pub fn generate_random_string(length: usize) -> String {
    let rng = thread_rng();
    rng.sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Milliseconds since UNIX_EPOCH, used to stamp messages as they arrive.
///
/// # Examples
///
/// ```
/// let now = utils::current_time_millis();
/// assert!(now > 0);
/// ```
pub fn current_time_millis() -> u128 {
    let start = SystemTime::now();
    start
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis()
}
