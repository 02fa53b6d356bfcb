use std::time::{Duration, Instant};

/// Frame cadence plus the draw-time readout shown in the settings panel.
pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_label_time: Instant,
    frame_count: u32,
    total_ms: f32,
    pub frame_dt: f32,
    label: String,
}

impl FrameTiming {
    pub fn new(now: Instant) -> Self {
        Self {
            last_frame_time: None,
            last_label_time: now,
            frame_count: 0,
            total_ms: 0.0,
            frame_dt: 1.0 / 60.0,
            label: String::new(),
        }
    }

    /// Last averaged draw time, formatted as "x.x ms".
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn update(&mut self, now: Instant) {
        let dt_duration = if let Some(last) = self.last_frame_time {
            now.saturating_duration_since(last)
        } else {
            Duration::from_millis(16)
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().max(0.0);

        self.frame_count = self.frame_count.saturating_add(1);
        self.total_ms += self.frame_dt * 1000.0;
        let elapsed = now.saturating_duration_since(self.last_label_time);
        if elapsed.as_secs_f32() >= 0.5 {
            let ms = self.total_ms / self.frame_count as f32;
            self.label = format!("{:.1} ms", ms);
            self.frame_count = 0;
            self.total_ms = 0.0;
            self.last_label_time = now;
        }
    }
}
