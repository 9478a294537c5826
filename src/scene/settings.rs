//! Global settings and animation takes.

use crate::object::properties::{f64_property, i64_property};
use crate::tree::{Element, Token};
use crate::util::time::ticks_to_seconds;

/// Values lifted from `GlobalSettings.Properties70`.
#[derive(Debug, Clone)]
pub struct GlobalSettings {
    pub time_mode: i64,
    pub custom_frame_rate: f64,
    pub frame_rate: f32,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            time_mode: 0,
            custom_frame_rate: -1.0,
            frame_rate: 24.0,
        }
    }
}

pub(crate) fn parse_global_settings(root: &Element) -> GlobalSettings {
    let Some(element) = root.child("GlobalSettings") else {
        return GlobalSettings::default();
    };
    let time_mode = i64_property(element, "TimeMode", 0);
    let custom_frame_rate = f64_property(element, "CustomFrameRate", -1.0);
    GlobalSettings {
        time_mode,
        custom_frame_rate,
        frame_rate: frame_rate_of(time_mode, custom_frame_rate),
    }
}

/// Map the `TimeMode` enumeration to frames per second.
fn frame_rate_of(time_mode: i64, custom_frame_rate: f64) -> f32 {
    match time_mode {
        1 => 120.0,
        2 => 100.0,
        3 => 60.0,
        4 => 50.0,
        5 => 48.0,
        6 | 7 => 30.0,
        8 | 9 => 29.970_026,
        10 => 25.0,
        11 => 24.0,
        12 => 1000.0,
        13 => 23.976,
        14 if custom_frame_rate > 0.0 => custom_frame_rate as f32,
        15 => 96.0,
        16 => 72.0,
        17 => 59.94,
        _ => 24.0,
    }
}

/// One named animation take.
#[derive(Debug, Clone, Default)]
pub struct TakeInfo {
    pub name: Token,
    pub filename: Token,
    /// Take span in seconds.
    pub local_time_from: f64,
    pub local_time_to: f64,
    pub reference_time_from: f64,
    pub reference_time_to: f64,
}

pub(crate) fn parse_takes(root: &Element) -> Vec<TakeInfo> {
    let Some(container) = root.child("Takes") else {
        return Vec::new();
    };
    container
        .children()
        .iter()
        .filter(|el| el.id() == "Take")
        .map(|el| {
            let span = |id: &str| -> (f64, f64) {
                let Some(child) = el.child(id) else {
                    return (0.0, 0.0);
                };
                let tick = |i: usize| {
                    child
                        .property(i)
                        .and_then(|p| p.to_i64().ok())
                        .unwrap_or(0)
                };
                (ticks_to_seconds(tick(0)), ticks_to_seconds(tick(1)))
            };
            let (local_time_from, local_time_to) = span("LocalTime");
            let (reference_time_from, reference_time_to) = span("ReferenceTime");
            TakeInfo {
                name: el
                    .property(0)
                    .and_then(|p| p.as_token())
                    .cloned()
                    .unwrap_or_default(),
                filename: el
                    .child("FileName")
                    .and_then(|c| c.property(0))
                    .and_then(|p| p.as_token())
                    .cloned()
                    .unwrap_or_default(),
                local_time_from,
                local_time_to,
                reference_time_from,
                reference_time_to,
            }
        })
        .collect()
}
