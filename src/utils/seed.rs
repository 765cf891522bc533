//! Random seed source for identifier allocation.

/// Draws a 128-bit random token from the operating system.
///
/// The seed does not need to be cryptographically strong for identifier
/// allocation, but 128 bits keeps collisions rare enough that the allocator's
/// retry loop almost never runs twice.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
pub fn random_seed() -> u128 {
    let mut buffer = [0u8; 16];

    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    u128::from_le_bytes(buffer)
}
