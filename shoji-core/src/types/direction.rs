/// Compass direction for spatial focus movement. `Up` means toward smaller
/// Y values (window coordinates are Y-down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}
