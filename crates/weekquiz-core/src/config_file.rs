use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paginate::{PaginationConfig, ShortPoolPolicy};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub pagination: Option<PaginationSection>,
    pub harvest: Option<HarvestSection>,
    pub output: Option<OutputSection>,
    pub server: Option<ServerSection>,
    pub pdf: Option<PdfSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationSection {
    pub weeks: Option<usize>,
    pub questions_per_week: Option<usize>,
    pub on_short_pool: Option<ShortPoolPolicy>,
    pub variation_marker: Option<String>,
    pub backfill_window: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestSection {
    pub require_answer: Option<bool>,
    /// Replaces the built-in question patterns.
    pub question_patterns: Option<Vec<String>>,
    /// Tried after the question patterns in effect.
    pub extra_question_patterns: Option<Vec<String>>,
    /// Replaces the built-in answer patterns.
    pub answer_patterns: Option<Vec<String>>,
    /// Tried after the answer patterns in effect.
    pub extra_answer_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub root: Option<String>,
}

/// Page regions skipped during PDF text extraction, as fractions of the
/// page height.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfSection {
    pub header_exclusion: Option<f32>,
    pub footer_exclusion: Option<f32>,
}

impl ConfigFile {
    /// Pagination settings with defaults filled in.
    pub fn pagination_config(&self) -> PaginationConfig {
        let defaults = PaginationConfig::default();
        let Some(p) = &self.pagination else {
            return defaults;
        };
        PaginationConfig {
            weeks: p.weeks.unwrap_or(defaults.weeks),
            questions_per_week: p.questions_per_week.unwrap_or(defaults.questions_per_week),
            on_short_pool: p.on_short_pool.unwrap_or(defaults.on_short_pool),
            variation_marker: p
                .variation_marker
                .clone()
                .unwrap_or(defaults.variation_marker),
            backfill_window: p.backfill_window.or(defaults.backfill_window),
        }
    }

    pub fn require_answer(&self) -> Option<bool> {
        self.harvest.as_ref().and_then(|h| h.require_answer)
    }

    pub fn harvest_section(&self) -> HarvestSection {
        self.harvest.clone().unwrap_or_default()
    }

    pub fn pdf_section(&self) -> PdfSection {
        self.pdf.clone().unwrap_or_default()
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.output
            .as_ref()
            .and_then(|o| o.path.as_deref())
            .map(PathBuf::from)
    }

    pub fn server_port(&self) -> Option<u16> {
        self.server.as_ref().and_then(|s| s.port)
    }

    pub fn server_root(&self) -> Option<PathBuf> {
        self.server
            .as_ref()
            .and_then(|s| s.root.as_deref())
            .map(PathBuf::from)
    }
}

/// Platform config directory path: `<config_dir>/weekquiz/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("weekquiz").join("config.toml"))
}

/// Load config by cascading CWD `.weekquiz.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".weekquiz.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let bp = base.pagination.unwrap_or_default();
    let op = overlay.pagination.unwrap_or_default();
    let bh = base.harvest.unwrap_or_default();
    let oh = overlay.harvest.unwrap_or_default();
    let bo = base.output.unwrap_or_default();
    let oo = overlay.output.unwrap_or_default();
    let bs = base.server.unwrap_or_default();
    let os = overlay.server.unwrap_or_default();
    let bd = base.pdf.unwrap_or_default();
    let od = overlay.pdf.unwrap_or_default();

    ConfigFile {
        pagination: Some(PaginationSection {
            weeks: op.weeks.or(bp.weeks),
            questions_per_week: op.questions_per_week.or(bp.questions_per_week),
            on_short_pool: op.on_short_pool.or(bp.on_short_pool),
            variation_marker: op.variation_marker.or(bp.variation_marker),
            backfill_window: op.backfill_window.or(bp.backfill_window),
        }),
        harvest: Some(HarvestSection {
            require_answer: oh.require_answer.or(bh.require_answer),
            question_patterns: oh.question_patterns.or(bh.question_patterns),
            extra_question_patterns: oh.extra_question_patterns.or(bh.extra_question_patterns),
            answer_patterns: oh.answer_patterns.or(bh.answer_patterns),
            extra_answer_patterns: oh.extra_answer_patterns.or(bh.extra_answer_patterns),
        }),
        output: Some(OutputSection {
            path: oo.path.or(bo.path),
        }),
        server: Some(ServerSection {
            port: os.port.or(bs.port),
            root: os.root.or(bs.root),
        }),
        pdf: Some(PdfSection {
            header_exclusion: od.header_exclusion.or(bd.header_exclusion),
            footer_exclusion: od.footer_exclusion.or(bd.footer_exclusion),
        }),
    }
}
