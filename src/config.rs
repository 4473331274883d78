//! Configuration types for stamping a header onto a PDF cover page.
//!
//! All stamping behaviour is controlled through [`OverlayConfig`], built via
//! its [`OverlayConfigBuilder`]. The header text itself lives in a
//! [`HeaderTemplate`], which can be replaced wholesale from a JSON file
//! without recompiling. HTTP-specific knobs are kept apart in
//! [`ServerConfig`] so library users never pull in server concerns.

use crate::error::OverlayError;
use crate::progress::ProgressCallback;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::path::Path;

/// One PostScript point is 1/72 inch.
pub const INCH: f32 = 72.0;

/// US Letter, used when a page declares no usable box.
pub const LETTER: (f32, f32) = (612.0, 792.0);

/// Configuration for stamping a header.
///
/// Built via [`OverlayConfig::builder()`] or using
/// [`OverlayConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_overlay::OverlayConfig;
///
/// let config = OverlayConfig::builder()
///     .timezone("Europe/Lisbon")
///     .date_format("%Y-%m-%d")
///     .concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct OverlayConfig {
    /// Text drawn on the cover page.
    pub template: HeaderTemplate,

    /// IANA time zone used for the `{date}` placeholder. Default: `America/Sao_Paulo`.
    pub timezone: String,

    /// strftime pattern for the `{date}` placeholder. Default: `%d/%m/%Y`.
    pub date_format: String,

    /// Distance from the left edge of the visible page box to the text, in points. Default: 72 (1 in).
    pub margin_left: f32,

    /// Distance from the top edge of the visible page box to the first baseline, in points. Default: 18 (0.25 in).
    pub top_offset: f32,

    /// Number of documents stamped at once by [`crate::stamp::stamp_batch`]. Default: 4.
    pub concurrency: usize,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-file progress events for batch runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            template: HeaderTemplate::default(),
            timezone: "America/Sao_Paulo".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            margin_left: INCH,
            top_offset: 0.25 * INCH,
            concurrency: 4,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OverlayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayConfig")
            .field("template", &self.template)
            .field("timezone", &self.timezone)
            .field("date_format", &self.date_format)
            .field("margin_left", &self.margin_left)
            .field("top_offset", &self.top_offset)
            .field("concurrency", &self.concurrency)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn StampProgressCallback>"),
            )
            .finish()
    }
}

impl OverlayConfig {
    /// Create a new builder for `OverlayConfig`.
    pub fn builder() -> OverlayConfigBuilder {
        OverlayConfigBuilder {
            config: Self::default(),
        }
    }

    /// Parsed form of [`OverlayConfig::timezone`].
    pub fn tz(&self) -> Result<Tz, OverlayError> {
        self.timezone.parse::<Tz>().map_err(|e| {
            OverlayError::InvalidConfig(format!("unknown time zone '{}': {}", self.timezone, e))
        })
    }

    /// Render `instant` with the configured zone and pattern.
    pub fn format_date(&self, instant: DateTime<Utc>) -> Result<String, OverlayError> {
        let local = instant.with_timezone(&self.tz()?);
        let mut out = String::new();
        write!(out, "{}", local.format(&self.date_format)).map_err(|_| {
            OverlayError::InvalidConfig(format!("invalid date format '{}'", self.date_format))
        })?;
        Ok(out)
    }

    /// Today's date as it appears in the header.
    pub fn today(&self) -> Result<String, OverlayError> {
        self.format_date(Utc::now())
    }
}

/// Builder for [`OverlayConfig`].
#[derive(Debug)]
pub struct OverlayConfigBuilder {
    config: OverlayConfig,
}

impl OverlayConfigBuilder {
    pub fn template(mut self, template: HeaderTemplate) -> Self {
        self.config.template = template;
        self
    }

    pub fn timezone(mut self, tz: impl Into<String>) -> Self {
        self.config.timezone = tz.into();
        self
    }

    pub fn date_format(mut self, fmt: impl Into<String>) -> Self {
        self.config.date_format = fmt.into();
        self
    }

    pub fn margin_left(mut self, pt: f32) -> Self {
        self.config.margin_left = pt;
        self
    }

    pub fn top_offset(mut self, pt: f32) -> Self {
        self.config.top_offset = pt;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OverlayConfig, OverlayError> {
        let c = &self.config;
        c.tz()?;
        if StrftimeItems::new(&c.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(OverlayError::InvalidConfig(format!(
                "invalid date format '{}'",
                c.date_format
            )));
        }
        for (name, v) in [("margin_left", c.margin_left), ("top_offset", c.top_offset)] {
            if !v.is_finite() || v < 0.0 {
                return Err(OverlayError::InvalidConfig(format!(
                    "{name} must be a finite, non-negative number of points, got {v}"
                )));
            }
        }
        c.template.validate()?;
        Ok(self.config)
    }
}

// ── Header template ──────────────────────────────────────────────────────

/// The twelve standard Type1 text faces every PDF reader ships with.
///
/// Symbol and ZapfDingbats are left out: they do not use WinAnsiEncoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The `/BaseFont` name written into the font dictionary.
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
        }
    }
}

/// A run of header lines sharing one font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub font: StandardFont,
    /// Font size in points.
    pub size: f32,
    /// Baseline-to-baseline distance inside the block. Default: 1.2 × `size`.
    #[serde(default)]
    pub leading: Option<f32>,
    /// Line templates; `{name}`, `{phone}` and `{date}` are substituted.
    pub lines: Vec<String>,
    /// Distance from this block's last baseline to the next block's first one.
    #[serde(default)]
    pub gap_after: f32,
}

impl TextBlock {
    pub fn leading(&self) -> f32 {
        self.leading.unwrap_or(self.size * 1.2)
    }
}

/// Everything drawn on the cover page, top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderTemplate {
    pub blocks: Vec<TextBlock>,
}

impl Default for HeaderTemplate {
    fn default() -> Self {
        Self {
            blocks: vec![
                TextBlock {
                    font: StandardFont::HelveticaBold,
                    size: 14.0,
                    leading: Some(0.25 * INCH),
                    lines: vec![
                        "Instituto Vitalis de Saúde Feminina".into(),
                        "Diagnóstico Hormonal Personalizado".into(),
                        "Mapa da Cascata Hormonal e Nível de Estresse Endócrino".into(),
                    ],
                    gap_after: 0.5 * INCH,
                },
                TextBlock {
                    font: StandardFont::Helvetica,
                    size: 12.0,
                    leading: Some(0.2 * INCH),
                    lines: vec![
                        "Nome: {name}".into(),
                        "Telefone: {phone}".into(),
                        "Data: {date}".into(),
                        "Tipo de Avaliação: Pré-Diagnóstico de Cascata Hormonal".into(),
                    ],
                    gap_after: 0.5 * INCH,
                },
                TextBlock {
                    font: StandardFont::HelveticaOblique,
                    size: 10.0,
                    leading: None,
                    lines: vec![
                        "Relatório confidencial preparado com base nas suas respostas ao questionário de equilíbrio hormonal.".into(),
                    ],
                    gap_after: 0.0,
                },
            ],
        }
    }
}

impl HeaderTemplate {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load and validate a template from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, OverlayError> {
        let path = path.as_ref();
        let invalid = |detail: String| OverlayError::InvalidTemplate {
            path: path.to_path_buf(),
            detail,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let template = Self::from_json_str(&raw).map_err(|e| invalid(e.to_string()))?;
        template.validate().map_err(|e| invalid(e.to_string()))?;
        Ok(template)
    }

    /// Total number of line templates across all blocks.
    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(|b| b.lines.len()).sum()
    }

    fn validate(&self) -> Result<(), OverlayError> {
        if self.line_count() == 0 {
            return Err(OverlayError::InvalidConfig(
                "header template has no lines".into(),
            ));
        }
        for (i, block) in self.blocks.iter().enumerate() {
            let bad = |v: f32| !v.is_finite() || v < 0.0;
            if !block.size.is_finite() || block.size <= 0.0 {
                return Err(OverlayError::InvalidConfig(format!(
                    "block {} has non-positive font size {}",
                    i + 1,
                    block.size
                )));
            }
            if bad(block.leading()) || bad(block.gap_after) {
                return Err(OverlayError::InvalidConfig(format!(
                    "block {} has a negative or non-finite spacing",
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Listener settings for the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address. Default: `0.0.0.0`.
    pub host: String,
    /// TCP port. Default: 8000.
    pub port: u16,
    /// Largest accepted request body in bytes. Default: 25 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
