use serde::Deserialize;

pub const DEFAULT_LOGO_URL: &str = "https://i.postimg.cc/pTTvjx8r/Group-143.png";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub address: String,
    /// Base URL used when building retrieval links. Falls back to the request's Host header.
    pub public_url: Option<String>,
    /// Lifetime of a generated image, in seconds.
    pub store_ttl: u64,
    /// Seconds between background sweeps. 0 disables the reaper.
    pub sweep_interval: u64,
    /// Timeout for each outbound image download, in seconds.
    pub timeout: u64,
    pub user_agent: String,
    pub default_text: String,
    pub default_logo_url: String,
    pub compositor: CompositorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 10000,
            address: "0.0.0.0".to_string(),
            public_url: None,
            store_ttl: 60,
            sweep_interval: 30,
            timeout: 30,
            user_agent: format!("brandshot/{}", env!("CARGO_PKG_VERSION")),
            default_text: "Default Text".to_string(),
            default_logo_url: DEFAULT_LOGO_URL.to_string(),
            compositor: CompositorConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CompositorConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub logo_width: u32,
    pub logo_height: u32,
    pub logo_padding: u32,
    /// Fraction of the canvas height darkened by the footer gradient.
    pub gradient_coverage: f32,
    /// Alpha reached by the gradient on the bottom row.
    pub gradient_max_alpha: u8,
    pub font_path: String,
    pub font_size: f32,
    pub text_padding: u32,
    pub bottom_padding: u32,
    /// Fraction of the canvas width available to a caption line.
    pub text_width_ratio: f32,
    pub jpeg_quality: u8,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1080,
            canvas_height: 1350,
            logo_width: 185,
            logo_height: 58,
            logo_padding: 40,
            gradient_coverage: 0.6,
            gradient_max_alpha: 230,
            font_path: "InterTight-Bold.ttf".to_string(),
            font_size: 80.0,
            text_padding: 50,
            bottom_padding: 120,
            text_width_ratio: 0.85,
            jpeg_quality: 90,
        }
    }
}

impl CompositorConfig {
    pub fn max_text_width(&self) -> f32 {
        (self.canvas_width as f32 * self.text_width_ratio).floor()
    }

    pub fn gradient_height(&self) -> u32 {
        ((self.canvas_height as f32 * self.gradient_coverage) as u32).min(self.canvas_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::figment::{
        providers::{Format, Toml},
        Figment,
    };

    #[test]
    fn defaults_match_the_reference_layout() {
        let config = CompositorConfig::default();
        assert_eq!(config.max_text_width(), 918.0);
        assert_eq!(config.gradient_height(), 810);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let toml = r#"
            store_ttl = 5

            [compositor]
            font_size = 64.0
        "#;
        let config: AppConfig = Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .unwrap();

        assert_eq!(config.store_ttl, 5);
        assert_eq!(config.port, 10000);
        assert_eq!(config.compositor.font_size, 64.0);
        assert_eq!(config.compositor.canvas_width, 1080);
        assert_eq!(config.default_logo_url, DEFAULT_LOGO_URL);
    }
}
