//! Sample planning.
//!
//! [`plan`] maps a total frame count and a desired number of stills to the
//! ordered list of frame indices to extract. The step between samples is
//! `max(1, total / desired)` with floor division, so samples are always
//! evenly spaced and the plan never stalls on a zero step.

/// The frame indices to extract for one run.
///
/// Indices are strictly increasing, start at 0 for a non-empty video, and
/// all lie below the total frame count the plan was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct SamplePlan {
    indices: Vec<u64>,
    requested: u64,
    interval: u64,
}

impl SamplePlan {
    /// The planned frame indices, in extraction order.
    pub fn indices(&self) -> &[u64] {
        &self.indices
    }

    /// Number of planned frames.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if there is nothing to extract.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The frame count the plan was built for.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Distance between consecutive samples. Zero for an empty plan.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Returns `true` if the video was too short to provide every requested
    /// sample.
    pub fn is_short(&self) -> bool {
        (self.indices.len() as u64) < self.requested
    }

    /// Consume the plan and return its indices.
    pub fn into_indices(self) -> Vec<u64> {
        self.indices
    }
}

/// Plan which frames to sample.
///
/// Returns an empty plan when `total_frames` or `desired_count` is zero.
///
/// # Example
///
/// ```
/// let plan = framepick::plan(100, 5);
/// assert_eq!(plan.indices(), &[0, 20, 40, 60, 80]);
/// ```
pub fn plan(total_frames: u64, desired_count: u64) -> SamplePlan {
    if total_frames == 0 || desired_count == 0 {
        return SamplePlan {
            indices: Vec::new(),
            requested: desired_count,
            interval: 0,
        };
    }

    let interval = (total_frames / desired_count).max(1);
    // `k * interval < total_frames` for every `k < count`; no overflow.
    let count = desired_count.min(total_frames);
    let indices: Vec<u64> = (0..count).map(|k| k * interval).collect();

    log::debug!(
        "Planned {} of {} requested frames (total={}, interval={})",
        indices.len(),
        desired_count,
        total_frames,
        interval
    );

    SamplePlan {
        indices,
        requested: desired_count,
        interval,
    }
}
