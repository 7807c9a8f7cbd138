use crate::core::geo::TileCoord;
use serde::{Deserialize, Serialize};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    /// Key separating this source's tiles from other sources in a shared cache.
    fn cache_key(&self) -> String;
}

/// URL pattern with `{z}`, `{x}` and `{y}` placeholders.
///
/// Providers disagree on axis order, so the template spells it out: the
/// ArcGIS imagery service is `{z}/{y}/{x}` while Terrarium is `{z}/{x}/{y}.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// `{base}/{z}/{y}/{x}`
    pub fn satellite(base: &str) -> Self {
        Self(format!("{}/{{z}}/{{y}}/{{x}}", base.trim_end_matches('/')))
    }

    /// `{base}/{z}/{x}/{y}.png`
    pub fn terrarium(base: &str) -> Self {
        Self(format!("{}/{{z}}/{{x}}/{{y}}.png", base.trim_end_matches('/')))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TileSource for UrlTemplate {
    fn url(&self, coord: TileCoord) -> String {
        self.0
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }

    fn cache_key(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_axis_order() {
        let coord = TileCoord::new(211, 108, 8);
        let sat = UrlTemplate::satellite("https://imagery.example/tile/");
        assert_eq!(sat.url(coord), "https://imagery.example/tile/8/108/211");

        let dem = UrlTemplate::terrarium("https://dem.example/terrarium");
        assert_eq!(dem.url(coord), "https://dem.example/terrarium/8/211/108.png");
    }

    #[test]
    fn test_custom_template() {
        let t = UrlTemplate::new("https://t.example/{z}-{x}-{y}.webp");
        assert_eq!(t.url(TileCoord::new(3, 4, 5)), "https://t.example/5-3-4.webp");
        assert_eq!(t.cache_key(), "https://t.example/{z}-{x}-{y}.webp");
    }
}
