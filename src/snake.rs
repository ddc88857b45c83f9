use crate::TermInt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: TermInt,
    pub y: TermInt,
}

impl Position {
    pub fn new(x: TermInt, y: TermInt) -> Self {
        Position { x, y }
    }

    /// One step in `dir` on a `width` x `height` torus.
    pub fn wrapped_step(self, dir: Direction, width: TermInt, height: TermInt) -> Self {
        let (dx, dy) = dir.delta();
        let x = (self.x as i32 + dx).rem_euclid(width as i32);
        let y = (self.y as i32 + dy).rem_euclid(height as i32);
        Position { x: x as TermInt, y: y as TermInt }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Velocity as (dx, dy). Up points towards larger `y`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// True when both directions move along the same nonzero axis.
    pub fn shares_axis(self, other: Direction) -> bool {
        use Direction::*;
        matches!((self, other), (Up | Down, Up | Down) | (Left | Right, Left | Right))
    }
}

/// Snake body stored in a fixed ring buffer, head first.
///
/// The buffer is sized for the whole board up front, so moving and growing
/// never allocate.
pub struct Snake {
    cells: Box<[Position]>,
    head: usize,
    len: usize,
    direction: Direction,
}

impl Snake {
    pub fn new(head: Position, capacity: usize) -> Self {
        assert!(capacity > 0, "snake needs room for its head");
        let cells = vec![head; capacity].into_boxed_slice();
        Snake { cells, head: 0, len: 1, direction: Direction::None }
    }

    pub fn head(&self) -> Position {
        self.cells[self.head]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Segments from head to tail.
    pub fn segments(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.len).map(move |i| self.cells[(self.head + i) % self.cells.len()])
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.segments().any(|p| p == pos)
    }

    /// Moves the head to `new_head`. Unless `grow` is set the tail is dropped
    /// first and returned.
    pub fn step(&mut self, new_head: Position, grow: bool) -> Option<Position> {
        // A full board has nowhere left to grow into.
        let old_tail = if !grow || self.len == self.capacity() {
            self.pop_back()
        } else {
            None
        };
        self.push_front(new_head);
        old_tail
    }

    /// Whether the head sits on any other segment.
    pub fn bites_itself(&self) -> bool {
        let head = self.head();
        self.segments().skip(1).any(|p| p == head)
    }

    fn push_front(&mut self, pos: Position) {
        let cap = self.capacity();
        self.head = (self.head + cap - 1) % cap;
        self.cells[self.head] = pos;
        self.len += 1;
    }

    fn pop_back(&mut self) -> Option<Position> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.len - 1) % self.capacity();
        self.len -= 1;
        Some(self.cells[idx])
    }
}
