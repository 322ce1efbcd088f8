use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn stable_hash_with(f: impl FnOnce(&mut DefaultHasher)) -> u64 {
    let mut hasher = DefaultHasher::new();
    f(&mut hasher);
    hasher.finish()
}

pub fn stable_hash_parts(seed: u64, parts: &[u64]) -> u64 {
    stable_hash_with(|hasher| {
        seed.hash(hasher);
        for part in parts {
            part.hash(hasher);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_hash_is_order_sensitive() {
        assert_eq!(stable_hash_parts(7, &[1, 2]), stable_hash_parts(7, &[1, 2]));
        assert_ne!(stable_hash_parts(7, &[1, 2]), stable_hash_parts(7, &[2, 1]));
        assert_ne!(stable_hash_parts(7, &[1, 2]), stable_hash_parts(8, &[1, 2]));
    }
}
