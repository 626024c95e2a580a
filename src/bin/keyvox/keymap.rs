//! Computer keyboard to MIDI note layout.
//!
//! Two rows of a QWERTY keyboard laid out like a piano: the home row holds
//! the white keys, the row above holds the black keys.
//!
//! ```text
//!    w e   t y u   o p
//!   a s d f g h j k l ;
//!   C D E F G A B C D E
//! ```

/// (key, MIDI note), middle C upwards.
pub const KEYS: [(char, u8); 17] = [
    ('a', 60),
    ('w', 61),
    ('s', 62),
    ('e', 63),
    ('d', 64),
    ('f', 65),
    ('t', 66),
    ('g', 67),
    ('y', 68),
    ('h', 69),
    ('u', 70),
    ('j', 71),
    ('k', 72),
    ('o', 73),
    ('l', 74),
    ('p', 75),
    (';', 76),
];

pub fn note_for_key(key: char) -> Option<u8> {
    let key = key.to_ascii_lowercase();
    KEYS.iter().find(|(k, _)| *k == key).map(|&(_, note)| note)
}

pub fn is_black(note: u8) -> bool {
    matches!(note % 12, 1 | 3 | 6 | 8 | 10)
}
