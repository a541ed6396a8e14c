use std::time::{Duration, Instant};

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_title_time: Instant,
    frame_count: u32,
    pub frame_dt: f32,
    fps: f32,
}

impl FrameTiming {
    pub fn new(now: Instant) -> Self {
        Self {
            last_frame_time: None,
            last_title_time: now,
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            fps: 0.0,
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Record a frame and return the elapsed time since the previous one in
    /// milliseconds. Returns true in the second slot when the fps estimate
    /// was refreshed (about twice a second).
    pub fn update(&mut self, now: Instant) -> (f32, bool) {
        let dt_duration = if let Some(last) = self.last_frame_time {
            now.saturating_duration_since(last)
        } else {
            Duration::from_millis(16)
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().max(0.0);

        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_title_time);
        let mut refreshed = false;
        if elapsed.as_secs_f32() >= 0.5 {
            self.fps = self.frame_count as f32 / elapsed.as_secs_f32();
            self.frame_count = 0;
            self.last_title_time = now;
            refreshed = true;
        }
        (self.frame_dt * 1000.0, refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameTiming;
    use std::time::{Duration, Instant};

    #[test]
    fn first_frame_assumes_sixty_hz() {
        let start = Instant::now();
        let mut timing = FrameTiming::new(start);
        let (dt_ms, _) = timing.update(start);
        assert!((dt_ms - 16.0).abs() < 1e-3);
    }

    #[test]
    fn elapsed_follows_wall_clock() {
        let start = Instant::now();
        let mut timing = FrameTiming::new(start);
        timing.update(start);
        let (dt_ms, _) = timing.update(start + Duration::from_millis(33));
        assert!((dt_ms - 33.0).abs() < 1e-3);
    }

    #[test]
    fn fps_refreshes_every_half_second() {
        let start = Instant::now();
        let mut timing = FrameTiming::new(start);
        let mut refreshed = false;
        for frame in 1..=30 {
            let (_, r) = timing.update(start + Duration::from_millis(frame * 20));
            refreshed |= r;
        }
        assert!(refreshed);
        assert!((timing.fps() - 50.0).abs() < 1.0);
    }
}
