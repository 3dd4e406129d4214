//! Region growing ("magic wand" flood fill) over the source image.
//!
//! Growth is breadth-first over 4-connected neighbors and reads only the
//! source image, never a layer. Work can be split into bounded chunks so a
//! large fill does not stall the host's event loop; the result does not
//! depend on how the work was chunked.

use crate::color::Rgba;
use crate::pixels::{Dimensions, PixelCoord, SourceImage};
use crate::region::PixelRegion;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Queue entries processed per slice when no chunk size is given.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Similarity settings for one fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowParams {
    /// Maximum `|Δr|+|Δg|+|Δb|` from the seed color.
    pub tolerance: u32,
    /// Pixels near this color are walls.
    pub border_color: Rgba,
    /// Maximum distance from `border_color` for a pixel to count as a wall.
    pub border_tolerance: u32,
}

impl GrowParams {
    fn is_border(&self, color: Rgba) -> bool {
        color.is_similar(self.border_color, self.border_tolerance)
    }
}

/// Progress report from [`RegionGrowth::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowStep {
    /// More work remains.
    Pending { accepted: usize, queued: usize },
    /// The region is final.
    Complete { accepted: usize },
}

/// An in-progress flood fill.
///
/// Dropping it part-way is always safe: nothing has been written anywhere.
#[derive(Debug)]
pub struct RegionGrowth {
    image: Arc<SourceImage>,
    params: GrowParams,
    seed: PixelCoord,
    seed_color: Rgba,
    visited: Vec<bool>,
    queue: VecDeque<usize>,
    accepted: Vec<usize>,
    chunk_size: usize,
}

impl RegionGrowth {
    /// Start growing from `seed`.
    ///
    /// A seed outside the image, or one that is itself a border pixel, yields
    /// an empty region.
    pub fn new(image: Arc<SourceImage>, seed: PixelCoord, params: GrowParams) -> Self {
        let dims = image.dimensions();
        let mut visited = vec![false; dims.pixel_count()];
        let mut queue = VecDeque::new();
        let seed_color = image.get(seed).unwrap_or(Rgba::TRANSPARENT);

        if dims.contains(seed) && !params.is_border(seed_color) {
            let index = dims.index_of(seed);
            visited[index] = true;
            queue.push_back(index);
        }

        Self {
            image,
            params,
            seed,
            seed_color,
            visited,
            queue,
            accepted: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set how many queue entries one [`Future::poll`] processes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn seed(&self) -> PixelCoord {
        self.seed
    }

    /// Color of the seed pixel in the source image.
    pub fn seed_color(&self) -> Rgba {
        self.seed_color
    }

    pub fn is_complete(&self) -> bool {
        self.queue.is_empty()
    }

    /// Process at most `budget` queue entries.
    pub fn step(&mut self, budget: usize) -> GrowStep {
        let dims = self.image.dimensions();
        for _ in 0..budget.max(1) {
            let Some(current) = self.queue.pop_front() else {
                break;
            };
            self.accepted.push(current);

            for neighbor in neighbors(dims, current) {
                if self.visited[neighbor] {
                    continue;
                }
                self.visited[neighbor] = true;
                let color = self.image.at(neighbor);
                if color.is_similar(self.seed_color, self.params.tolerance) && !self.params.is_border(color) {
                    self.queue.push_back(neighbor);
                }
            }
        }

        if self.queue.is_empty() {
            GrowStep::Complete {
                accepted: self.accepted.len(),
            }
        } else {
            GrowStep::Pending {
                accepted: self.accepted.len(),
                queued: self.queue.len(),
            }
        }
    }

    /// Run to completion and return the region.
    pub fn finish(mut self) -> PixelRegion {
        while !self.is_complete() {
            self.step(usize::MAX);
        }
        self.take_region()
    }

    /// Linear in the image size: the visited bitmap is reused as the
    /// region mask, so no sort happens in the final slice.
    fn take_region(&mut self) -> PixelRegion {
        let mut mask = std::mem::take(&mut self.visited);
        mask.fill(false);
        for index in self.accepted.drain(..) {
            mask[index] = true;
        }
        PixelRegion::from_mask(self.image.dimensions(), &mask)
    }
}

impl Future for RegionGrowth {
    type Output = PixelRegion;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let chunk = self.chunk_size;
        match self.step(chunk) {
            GrowStep::Complete { .. } => Poll::Ready(self.take_region()),
            GrowStep::Pending { .. } => {
                // Hand control back to the executor between chunks.
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }
}

fn neighbors(dims: Dimensions, index: usize) -> impl Iterator<Item = usize> {
    let w = dims.width as usize;
    let h = dims.height as usize;
    let (x, y) = (index % w, index / w);
    [
        (x + 1 < w).then(|| index + 1),
        (x > 0).then(|| index - 1),
        (y + 1 < h).then(|| index + w),
        (y > 0).then(|| index - w),
    ]
    .into_iter()
    .flatten()
}

/// Grow a region eagerly.
pub fn grow(image: &Arc<SourceImage>, seed: PixelCoord, params: GrowParams) -> PixelRegion {
    RegionGrowth::new(Arc::clone(image), seed, params).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::PixelBuffer;
    use std::task::{RawWaker, RawWakerVTable, Waker};

    fn block_on<F: Future>(f: F) -> (F::Output, usize) {
        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);
        let mut polls = 0;

        loop {
            polls += 1;
            if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
                return (result, polls);
            }
        }
    }

    fn uniform(width: u32, height: u32, color: Rgba) -> Arc<SourceImage> {
        Arc::new(SourceImage::from_buffer(PixelBuffer::filled(width, height, color)).unwrap())
    }

    /// Two gray halves separated by a black column at x == 4.
    fn walled() -> Arc<SourceImage> {
        let mut buf = PixelBuffer::filled(9, 5, Rgba::rgb(128, 128, 128));
        for y in 0..5 {
            buf.set(PixelCoord::new(4, y), Rgba::BLACK);
        }
        Arc::new(SourceImage::from_buffer(buf).unwrap())
    }

    fn far_border(tolerance: u32) -> GrowParams {
        GrowParams {
            tolerance,
            border_color: Rgba::rgb(255, 0, 255),
            border_tolerance: 0,
        }
    }

    #[test]
    fn test_uniform_image_fills_everything() {
        let image = uniform(4, 4, Rgba::rgb(10, 20, 30));
        let region = grow(&image, PixelCoord::new(0, 0), far_border(0));
        assert_eq!(region.len(), 16);
    }

    #[test]
    fn test_border_stops_growth() {
        let image = walled();
        let params = GrowParams {
            tolerance: MAX,
            border_color: Rgba::BLACK,
            border_tolerance: 10,
        };
        let region = grow(&image, PixelCoord::new(1, 2), params);
        assert_eq!(region.len(), 4 * 5);
        assert!(region.iter().all(|c| c.x < 4));
    }

    const MAX: u32 = crate::color::MAX_DISTANCE;

    #[test]
    fn test_without_border_tolerance_wall_is_crossed_only_if_similar() {
        let image = walled();
        // Black is 384 away from the gray; a tolerance above that lets it through.
        let region = grow(&image, PixelCoord::new(1, 2), far_border(400));
        assert_eq!(region.len(), 45);

        let region = grow(&image, PixelCoord::new(1, 2), far_border(50));
        assert_eq!(region.len(), 20);
    }

    #[test]
    fn test_tolerance_is_measured_from_seed() {
        // A gradient row: each step is +10 on red.
        let mut buf = PixelBuffer::new(6, 1);
        for x in 0..6u32 {
            buf.set(PixelCoord::new(x, 0), Rgba::rgb((x * 10) as u8, 0, 0));
        }
        let image = Arc::new(SourceImage::from_buffer(buf).unwrap());
        let region = grow(&image, PixelCoord::new(0, 0), far_border(25));
        // Red 0, 10, 20 are within 25 of the seed; 30 is not even though it is
        // only 10 from its neighbor.
        assert_eq!(region.len(), 3);
    }

    #[test]
    fn test_seed_on_border_yields_nothing() {
        let image = walled();
        let params = GrowParams {
            tolerance: 10,
            border_color: Rgba::BLACK,
            border_tolerance: 0,
        };
        assert!(grow(&image, PixelCoord::new(4, 0), params).is_empty());
    }

    #[test]
    fn test_out_of_bounds_seed_yields_nothing() {
        let image = uniform(4, 4, Rgba::WHITE);
        assert!(grow(&image, PixelCoord::new(9, 9), far_border(0)).is_empty());
    }

    #[test]
    fn test_diagonal_neighbors_are_not_connected() {
        // Checkerboard: no two same-colored pixels share an edge.
        let mut buf = PixelBuffer::new(3, 3);
        for y in 0..3u32 {
            for x in 0..3u32 {
                let c = if (x + y) % 2 == 0 { Rgba::WHITE } else { Rgba::rgb(0, 0, 1) };
                buf.set(PixelCoord::new(x, y), c);
            }
        }
        let image = Arc::new(SourceImage::from_buffer(buf).unwrap());
        let region = grow(&image, PixelCoord::new(1, 1), far_border(0));
        assert_eq!(region.len(), 1);
    }

    #[test]
    fn test_chunked_matches_eager() {
        let image = walled();
        let params = far_border(10);
        let eager = grow(&image, PixelCoord::new(7, 1), params);

        let mut growth = RegionGrowth::new(Arc::clone(&image), PixelCoord::new(7, 1), params);
        let mut slices = 0;
        while let GrowStep::Pending { .. } = growth.step(3) {
            slices += 1;
        }
        assert!(slices > 1);
        assert_eq!(growth.finish(), eager);
    }

    #[test]
    fn test_future_yields_between_chunks() {
        let image = uniform(20, 20, Rgba::WHITE);
        let growth = RegionGrowth::new(Arc::clone(&image), PixelCoord::new(10, 10), far_border(0))
            .with_chunk_size(50);
        let (region, polls) = block_on(growth);
        assert_eq!(region.len(), 400);
        assert!(polls >= 8);
    }

    #[test]
    fn test_region_is_row_major_after_breadth_first_growth() {
        let image = uniform(5, 5, Rgba::WHITE);
        let region = grow(&image, PixelCoord::new(2, 2), far_border(0));
        let indices: Vec<usize> = region.indices().collect();
        assert_eq!(indices, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_step_reports_progress() {
        let image = uniform(10, 10, Rgba::WHITE);
        let mut growth = RegionGrowth::new(image, PixelCoord::new(0, 0), far_border(0));
        assert!(matches!(growth.step(1), GrowStep::Pending { accepted: 1, .. }));
        assert!(!growth.is_complete());
        assert!(matches!(growth.step(usize::MAX), GrowStep::Complete { accepted: 100 }));
    }
}
