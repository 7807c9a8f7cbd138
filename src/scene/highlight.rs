use crate::core::geo::MapSpace;
use crate::data::earthquake::Earthquake;
use crate::mesh::color::Color;

/// Animation time added per frame
pub const PULSE_TIME_STEP: f64 = 0.05;

pub const CORE_COLOR: u32 = 0xff3300;
pub const RING_COLOR: u32 = 0xffaa00;

/// Scales and opacities of the highlight meshes for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseFrame {
    pub core_scale: f64,
    pub core_opacity: f64,
    pub ring_scale: f64,
    pub ring_opacity: f64,
}

/// Pulsing core plus an expanding, fading ring around one selected event
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightPulse {
    pub event_index: usize,
    pub position: [f32; 3],
    base_size: f64,
    time: f64,
}

impl HighlightPulse {
    pub fn new(event_index: usize, event: &Earthquake, space: &MapSpace) -> Self {
        let p = space.lon_lat_to_map_xy(event.lon, event.lat);
        let amplitude = if event.amplitude != 0.0 { event.amplitude } else { 3.0 };
        Self {
            event_index,
            position: [p.x as f32, p.y as f32, -event.depth as f32],
            base_size: (amplitude * 3.0).max(2.0),
            time: 0.0,
        }
    }

    pub fn base_size(&self) -> f64 {
        self.base_size
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn core_color() -> Color {
        Color::from_hex(CORE_COLOR)
    }

    pub fn ring_color() -> Color {
        Color::from_hex(RING_COLOR)
    }

    /// Advances one frame and returns its state
    pub fn step(&mut self) -> PulseFrame {
        self.time += PULSE_TIME_STEP;
        self.frame_at(self.time)
    }

    pub fn frame_at(&self, time: f64) -> PulseFrame {
        let base = self.base_size;
        let wave = (time * 5.0).sin();
        let span = base * 4.0;
        let ring_scale = base + (time * 10.0) % span;
        PulseFrame {
            core_scale: base + wave * base * 0.1,
            core_opacity: 0.5 + wave * 0.5,
            ring_scale,
            ring_opacity: (1.0 - (ring_scale - base) / span).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(amplitude: f64) -> Earthquake {
        Earthquake {
            lat: 23.0,
            lon: 121.0,
            depth: 12.0,
            amplitude,
            ..Default::default()
        }
    }

    #[test]
    fn test_base_size() {
        let space = MapSpace::default();
        assert_eq!(HighlightPulse::new(0, &event(5.0), &space).base_size(), 15.0);
        assert_eq!(HighlightPulse::new(0, &event(0.0), &space).base_size(), 9.0);
        assert_eq!(HighlightPulse::new(0, &event(0.5), &space).base_size(), 2.0);
        assert_eq!(HighlightPulse::new(0, &event(5.0), &space).position[2], -12.0);
    }

    #[test]
    fn test_pulse_frames() {
        let space = MapSpace::default();
        let mut pulse = HighlightPulse::new(3, &event(5.0), &space);
        let start = pulse.frame_at(0.0);
        assert_eq!(start.core_scale, 15.0);
        assert_eq!(start.core_opacity, 0.5);
        assert_eq!(start.ring_scale, 15.0);
        assert_eq!(start.ring_opacity, 1.0);

        let first = pulse.step();
        assert!((pulse.time() - 0.05).abs() < 1e-12);
        assert!(first.core_scale > 15.0);
        assert!((first.ring_scale - 15.5).abs() < 1e-9);

        // The ring wraps after covering four base sizes.
        let wrapped = pulse.frame_at(6.05);
        assert!((wrapped.ring_scale - 15.5).abs() < 1e-9);
        for i in 0..200 {
            let f = pulse.frame_at(i as f64 * 0.05);
            assert!(f.ring_opacity >= 0.0 && f.ring_opacity <= 1.0);
            assert!(f.ring_scale >= 15.0 && f.ring_scale < 75.0);
        }
    }
}
