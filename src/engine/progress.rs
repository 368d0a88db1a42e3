/// Accumulates ffmpeg `-progress` output (key=value lines)
#[derive(Debug, Default, Clone)]
pub struct ProgressParser {
    pub out_time_us: u64,
    pub fps: Option<f64>,
    pub speed: Option<f64>,
    pub is_complete: bool,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Unknown keys and unparseable values ("N/A") are ignored.
    pub fn parse_line(&mut self, line: &str) {
        let Some((key, value)) = line.split_once('=') else {
            return;
        };
        let value = value.trim();
        match key.trim() {
            "out_time_us" | "out_time_ms" => {
                // Both keys carry microseconds
                if let Ok(us) = value.parse::<u64>() {
                    self.out_time_us = us;
                }
            }
            "fps" => self.fps = value.parse().ok().or(self.fps),
            "speed" => {
                if let Ok(s) = value.trim_end_matches('x').trim().parse::<f64>() {
                    self.speed = Some(s);
                }
            }
            "progress" => self.is_complete = value == "end",
            _ => {}
        }
    }

    pub fn out_time_s(&self) -> f64 {
        self.out_time_us as f64 / 1_000_000.0
    }

    /// Snapshot for display, given the input duration if it is known
    pub fn snapshot(&self, duration_s: Option<f64>) -> EncodeProgress {
        EncodeProgress {
            out_time_s: self.out_time_s(),
            duration_s: duration_s.filter(|d| *d > 0.0),
            fps: self.fps,
            speed: self.speed,
            complete: self.is_complete,
        }
    }
}

/// What the encode loop reports to its progress callback
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EncodeProgress {
    pub out_time_s: f64,
    pub duration_s: Option<f64>,
    pub fps: Option<f64>,
    pub speed: Option<f64>,
    pub complete: bool,
}

impl EncodeProgress {
    /// Completed fraction in [0, 1]; `None` when the duration is unknown
    pub fn fraction(&self) -> Option<f64> {
        if self.complete {
            return Some(1.0);
        }
        self.duration_s
            .map(|d| (self.out_time_s / d).clamp(0.0, 1.0))
    }

    /// Remaining wall-clock seconds, from the encode speed
    pub fn eta_s(&self) -> Option<f64> {
        let duration = self.duration_s?;
        let speed = self.speed.filter(|s| *s > 0.0)?;
        Some(((duration - self.out_time_s).max(0.0)) / speed)
    }
}
