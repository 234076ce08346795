//! Occupancy bitmap helpers. Bit `i` lives in byte `i / 8` at position
//! `i % 8`, least significant bit first.

pub fn init(bitmap: &mut [u8]) {
    bitmap.fill(0);
}

pub fn is_set(bitmap: &[u8], pos: usize) -> bool {
    bitmap[pos / 8] & (1 << (pos % 8)) != 0
}

pub fn set(bitmap: &mut [u8], pos: usize) {
    bitmap[pos / 8] |= 1 << (pos % 8);
}

pub fn reset(bitmap: &mut [u8], pos: usize) {
    bitmap[pos / 8] &= !(1 << (pos % 8));
}

/// Returns the first position in `0..max_n` whose bit equals `bit`.
pub fn first_bit(bit: bool, bitmap: &[u8], max_n: usize) -> Option<usize> {
    (0..max_n).find(|&pos| is_set(bitmap, pos) == bit)
}

/// Returns the first position in `(curr, max_n)` whose bit equals `bit`.
pub fn next_bit(bit: bool, bitmap: &[u8], max_n: usize, curr: usize) -> Option<usize> {
    (curr + 1..max_n).find(|&pos| is_set(bitmap, pos) == bit)
}

/// Number of set bits among the first `max_n` positions.
pub fn count_ones(bitmap: &[u8], max_n: usize) -> usize {
    (0..max_n).filter(|&pos| is_set(bitmap, pos)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reset() {
        let mut map = [0u8; 2];
        set(&mut map, 0);
        set(&mut map, 9);
        assert_eq!(map, [0b0000_0001, 0b0000_0010]);
        assert!(is_set(&map, 9));

        reset(&mut map, 9);
        assert!(!is_set(&map, 9));
        assert_eq!(count_ones(&map, 16), 1);
    }

    #[test]
    fn test_bit_search() {
        let mut map = [0u8; 1];
        for pos in [0, 2, 3] {
            set(&mut map, pos);
        }

        assert_eq!(first_bit(true, &map, 4), Some(0));
        assert_eq!(first_bit(false, &map, 4), Some(1));
        assert_eq!(next_bit(true, &map, 4, 0), Some(2));
        assert_eq!(next_bit(true, &map, 4, 3), None);
        // Bits past max_n are ignored
        assert_eq!(first_bit(false, &[0b0000_1111], 4), None);
    }
}
