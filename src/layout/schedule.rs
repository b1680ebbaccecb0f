use crate::config::TimingConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::clamp01;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
/// A half-open time interval `[start, start + duration)` with fade lengths, in seconds.
pub struct Window {
    pub start: f64,
    pub duration: f64,
    pub fade_in: f64,
    pub fade_out: f64,
}

impl Window {
    fn faded(start: f64, duration: f64, fade_in: f64, fade_out: f64) -> Self {
        let half = duration / 2.0;
        Self {
            start,
            duration,
            fade_in: fade_in.min(half),
            fade_out: fade_out.min(half),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Half-open interval test.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end()
    }

    /// `min(1, elapsed / fade_in, remaining / fade_out)` clamped to `[0, 1]`.
    pub fn fade_multiplier(&self, t: f64) -> f64 {
        let mut m: f64 = 1.0;
        if self.fade_in > 0.0 {
            m = m.min((t - self.start) / self.fade_in);
        }
        if self.fade_out > 0.0 {
            m = m.min((self.end() - t) / self.fade_out);
        }
        clamp01(m)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Where every text element sits in time.
pub struct Schedule {
    /// `None` when the video is too short to hold any title time.
    pub title: Option<Window>,
    pub closing: Option<Window>,
    /// One window per kept sentence, in sentence order.
    pub captions: Vec<Window>,
    /// One window per kept skill highlight, in order.
    pub skills: Vec<Window>,
    /// Start of the caption slice (end of the title window).
    pub slice_start: f64,
    /// Length of the time between the title and closing windows.
    pub slice_len: f64,
}

/// Lay out title, captions, skills and closing over `total` seconds.
///
/// Clamp policy for short videos:
/// - if `total` is shorter than title + closing, both shrink proportionally to fill it and
///   every caption and skill is dropped;
/// - otherwise only as many captions as fit at `min_caption_duration + caption_gap` each are
///   kept, taken from the front of the list;
/// - skills split the caption slice evenly and are dropped from the end when a slot would be
///   shorter than `min_caption_duration`.
///
/// Never produces a negative duration. Fails only for a non-positive `total` or zero captions.
pub fn schedule(
    total: f64,
    caption_count: usize,
    skill_count: usize,
    timing: &TimingConfig,
) -> ReelResult<Schedule> {
    if !(total.is_finite() && total > 0.0) {
        return Err(ReelError::layout(format!(
            "total duration must be positive (got {total})"
        )));
    }
    if caption_count == 0 {
        return Err(ReelError::layout("text produced zero captions"));
    }

    let reserved = timing.title_duration + timing.closing_duration;
    let (title_len, closing_len) = if reserved > total {
        let s = total / reserved;
        (timing.title_duration * s, timing.closing_duration * s)
    } else {
        (timing.title_duration, timing.closing_duration)
    };
    let slice_start = title_len;
    let slice_len = (total - title_len - closing_len).max(0.0);

    let title = (title_len > 0.0).then(|| {
        Window::faded(
            0.0,
            title_len,
            timing.title_fade_in,
            timing.title_fade_out,
        )
    });
    let closing = (closing_len > 0.0).then(|| {
        Window::faded(
            total - closing_len,
            closing_len,
            timing.closing_fade,
            timing.closing_fade,
        )
    });

    let unit = timing.min_caption_duration + timing.caption_gap;
    let fit = if unit > 0.0 {
        (slice_len / unit).floor() as usize
    } else {
        caption_count
    };
    let kept = caption_count.min(fit);
    if kept < caption_count {
        tracing::warn!(
            kept,
            dropped = caption_count - kept,
            slice_len,
            "captions dropped, not enough time between title and closing"
        );
    }

    let mut captions = Vec::with_capacity(kept);
    if kept > 0 {
        let per = slice_len / kept as f64;
        let dur = per - timing.caption_gap;
        for i in 0..kept {
            captions.push(Window::faded(
                slice_start + i as f64 * per,
                dur,
                timing.caption_fade,
                timing.caption_fade,
            ));
        }
    }

    let skills = if kept == 0 {
        Vec::new()
    } else {
        schedule_skills(slice_start, slice_len, skill_count, timing)
    };

    Ok(Schedule {
        title,
        closing,
        captions,
        skills,
        slice_start,
        slice_len,
    })
}

fn schedule_skills(
    slice_start: f64,
    slice_len: f64,
    skill_count: usize,
    timing: &TimingConfig,
) -> Vec<Window> {
    if skill_count == 0 || slice_len <= 0.0 {
        return Vec::new();
    }
    let fit = if timing.min_caption_duration > 0.0 {
        (slice_len / timing.min_caption_duration).floor() as usize
    } else {
        skill_count
    };
    let kept = skill_count.min(fit);
    if kept < skill_count {
        tracing::warn!(
            kept,
            dropped = skill_count - kept,
            "skill highlights dropped, not enough time"
        );
    }
    if kept == 0 {
        return Vec::new();
    }

    let slot = slice_len / kept as f64;
    let dur = timing.skill_duration.min(slot - timing.caption_gap);
    if dur <= 0.0 {
        return Vec::new();
    }
    (0..kept)
        .map(|i| {
            Window::faded(
                slice_start + i as f64 * slot,
                dur,
                timing.caption_fade,
                timing.caption_fade,
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/layout/schedule.rs"]
mod tests;
