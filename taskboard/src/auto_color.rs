//! Deterministic default colors for columns.
//!
//! A column created without an explicit color gets one picked from a
//! curated palette by hashing its title, so the same title always lands on
//! the same lane color.

/// Curated palette of lane colors (CSS hex).
const PALETTE: &[&str] = &[
    "#ef4444", // red
    "#f97316", // orange
    "#eab308", // yellow
    "#22c55e", // green
    "#14b8a6", // teal
    "#3b82f6", // blue
    "#8b5cf6", // violet
    "#ec4899", // pink
    "#64748b", // slate
    "#0ea5e9", // sky
];

/// Return a deterministic color for a column title.
///
/// Titles are compared case-insensitively and without surrounding space.
pub fn column_color(title: &str) -> String {
    let key = title.trim().to_lowercase();
    let idx = (fnv1a(&key) as usize) % PALETTE.len();
    PALETTE[idx].to_string()
}

/// FNV-1a hash (32-bit) for short strings.
fn fnv1a(s: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in s.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_color_deterministic() {
        assert_eq!(column_color("Doing"), column_color("Doing"));
        assert_eq!(column_color("  doing "), column_color("Doing"));
    }

    #[test]
    fn test_column_color_from_palette() {
        for title in &["To Do", "Doing", "Done", "Blocked", ""] {
            let color = column_color(title);
            assert!(PALETTE.contains(&color.as_str()));
            assert_eq!(color.len(), 7);
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
