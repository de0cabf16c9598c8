#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn horizontal_distance(&self, other: &Rect) -> f32 {
        (self.x - other.x).abs()
    }

    // Distance from this rect's nearest horizontal edge to the other's
    // opposing edge; zero when the rects are stacked flush.
    pub fn seam_distance(&self, other: &Rect) -> f32 {
        let top_to_bottom = (self.y - other.bottom()).abs();
        let bottom_to_top = (self.bottom() - other.y).abs();
        top_to_bottom.min(bottom_to_top)
    }

    pub fn vertical_overlap(&self, other: &Rect) -> f32 {
        (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0)
    }

    pub fn snap_above(&self, target: &Rect) -> (f32, f32) {
        (target.x, target.y - self.height)
    }

    pub fn snap_below(&self, target: &Rect) -> (f32, f32) {
        (target.x, target.bottom())
    }
}
