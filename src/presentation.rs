//! Rendering a stored record for display
//!
//! The page state that survives between renders (the current theme and the
//! map with its marker) lives in a [`RenderState`] owned by the caller.
//! [`render`] takes it by `&mut`, runs the summary analysis and produces a
//! [`ResultView`] the CLI prints and other front ends can serialise.

use std::fmt;

use rand::RngExt;
use serde::Serialize;

use crate::analyzer::{self, TemperatureExtract, Theme, Tip};
use crate::models::WeatherRecord;

pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "© OpenStreetMap";
pub const MAX_ZOOM: u8 = 19;

const LOCATED_ZOOM: u8 = 10;
const WORLD_ZOOM: u8 = 2;
const RAINDROPS: usize = 60;

/// Map viewport and its single marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub marker: Option<(f64, f64)>,
    pub popup: Option<String>,
}

impl MapView {
    /// First display of the map
    fn create(latitude: f64, longitude: f64) -> Self {
        let zoom = if latitude == 0.0 { WORLD_ZOOM } else { LOCATED_ZOOM };
        Self {
            center: (latitude, longitude),
            zoom,
            marker: None,
            popup: None,
        }
    }

    fn recentre(&mut self, latitude: f64, longitude: f64) {
        self.center = (latitude, longitude);
        self.zoom = LOCATED_ZOOM;
    }

    /// An existing marker follows; a new one is only placed for non-zero
    /// coordinates.
    fn place_marker(&mut self, latitude: f64, longitude: f64) {
        if self.marker.is_some() || (latitude != 0.0 && longitude != 0.0) {
            self.marker = Some((latitude, longitude));
        }
    }
}

/// Presentation state carried from one render to the next
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub theme: Option<Theme>,
    pub map: Option<MapView>,
}

impl RenderState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_on_map(&mut self, latitude: f64, longitude: f64) -> &mut MapView {
        let map = match self.map.take() {
            Some(mut map) => {
                map.recentre(latitude, longitude);
                map
            }
            None => MapView::create(latitude, longitude),
        };
        let map = self.map.insert(map);
        map.place_marker(latitude, longitude);
        map
    }

    /// Swap the page theme, returning the one it replaced
    pub fn set_theme(&mut self, theme: Theme) -> Option<Theme> {
        self.theme.replace(theme)
    }
}

/// One element of the background animation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SceneElement {
    Sun,
    Cloud { variant: &'static str, opacity: f32 },
    WindLine { variant: &'static str },
    Raindrop { left_percent: f32, duration_secs: f32, opacity: f32 },
}

/// Background animation for a theme
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub elements: Vec<SceneElement>,
}

impl Scene {
    pub fn for_theme<R: RngExt>(theme: Theme, rng: &mut R) -> Self {
        let clouds = |variants: &[&'static str]| {
            variants
                .iter()
                .map(|&variant| SceneElement::Cloud {
                    variant,
                    opacity: 1.0,
                })
                .collect::<Vec<_>>()
        };

        let elements = match theme {
            Theme::Hot | Theme::Clear => {
                let mut elements = vec![SceneElement::Sun];
                elements.extend(clouds(&["c1", "c2", "c3"]));
                elements
            }
            Theme::Cloudy => {
                let mut elements: Vec<SceneElement> = ["c1", "c2", "c3", "c1", "c2"]
                    .iter()
                    .enumerate()
                    .map(|(i, &variant)| SceneElement::Cloud {
                        variant,
                        opacity: 0.8 - i as f32 * 0.1,
                    })
                    .collect();
                elements.extend(
                    ["", "w2", "w3"]
                        .iter()
                        .map(|&variant| SceneElement::WindLine { variant }),
                );
                elements
            }
            Theme::Rain => {
                let mut elements = clouds(&["c1", "c2", "c3"]);
                elements.extend((0..RAINDROPS).map(|_| SceneElement::Raindrop {
                    left_percent: rng.random_range(0.0..100.0),
                    duration_secs: rng.random_range(0.9..1.7),
                    opacity: rng.random_range(0.4..1.0),
                }));
                elements
            }
        };

        Self { elements }
    }

    fn count(&self, pred: impl Fn(&SceneElement) -> bool) -> usize {
        self.elements.iter().filter(|e| pred(e)).count()
    }

    /// Short description for text output, e.g. `sun, 3 clouds`
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.count(|e| matches!(e, SceneElement::Sun)) > 0 {
            parts.push("sun".to_string());
        }
        for (label, n) in [
            ("clouds", self.count(|e| matches!(e, SceneElement::Cloud { .. }))),
            ("wind lines", self.count(|e| matches!(e, SceneElement::WindLine { .. }))),
            ("raindrops", self.count(|e| matches!(e, SceneElement::Raindrop { .. }))),
        ] {
            if n > 0 {
                parts.push(format!("{n} {label}"));
            }
        }
        parts.join(", ")
    }
}

/// Everything shown for one record
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub location: String,
    pub date_range: String,
    pub summary: String,
    pub temperatures: TemperatureExtract,
    pub tips: Vec<Tip>,
    pub theme: Theme,
    pub theme_class: String,
    pub scene: Scene,
    pub map: Option<MapView>,
}

impl ResultView {
    /// Tip block, one `- ` prefixed line per tip
    #[must_use]
    pub fn tip_lines(&self) -> Vec<String> {
        self.tips.iter().map(|tip| format!("- {tip}")).collect()
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.location)?;
        writeln!(f, "   📅 {}", self.date_range)?;
        for line in self.summary.lines() {
            writeln!(f, "   {line}")?;
        }
        writeln!(f)?;
        writeln!(f, "Tips:")?;
        for line in self.tip_lines() {
            writeln!(f, "   {line}")?;
        }
        writeln!(f)?;
        writeln!(f, "Theme: {} ({})", self.theme, self.scene.describe())?;
        match self.map.as_ref().and_then(|m| m.marker) {
            Some((lat, lon)) => writeln!(f, "   🗺️ Marker at {lat:.4}, {lon:.4}")?,
            None => writeln!(f, "   🗺️ No map position")?,
        }
        Ok(())
    }
}

/// Render a record, updating the caller's page state
pub fn render<R: RngExt>(
    state: &mut RenderState,
    record: &WeatherRecord,
    rng: &mut R,
) -> ResultView {
    let analysis = analyzer::analyze(&record.weather_summary);

    if let Some((lat, lon)) = record.coordinates() {
        let map = state.show_on_map(lat, lon);
        if map.marker.is_some() {
            map.popup = Some(format!("{}: {}", record.location, analysis.theme));
        }
    }

    let previous = state.set_theme(analysis.theme);
    if previous != Some(analysis.theme) {
        tracing::debug!("Theme changed from {:?} to {}", previous, analysis.theme);
    }

    ResultView {
        location: record.location.clone(),
        date_range: record.date_range(),
        summary: record.weather_summary.clone(),
        temperatures: analysis.temperatures,
        tips: analysis.tips,
        theme: analysis.theme,
        theme_class: analysis.theme.css_class(),
        scene: Scene::for_theme(analysis.theme, rng),
        map: state.map.clone(),
    }
}
