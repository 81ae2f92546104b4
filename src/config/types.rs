//! Typed site configuration.
//!
//! `SiteConfig` defines the full shape of the configuration and every
//! field's fallback value. Overrides are untyped trees merged onto the
//! serialized form of these defaults.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Complete site configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub info: InfoConfig,
    pub class: ClassConfig,
    pub theme: ThemeConfig,
    pub features: FeaturesConfig,
    pub navigation: Vec<NavItem>,
    pub footer: FooterConfig,
    pub social: SocialConfig,
    pub integrations: IntegrationsConfig,
}

/// Site metadata, mostly used for `<head>` tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoConfig {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub author: String,
}

/// Class identity shown across the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub name: String,
    pub school: String,
    pub slogan: String,
}

/// Visual theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Preset theme name.
    pub preset: String,
    pub custom: ThemeCustom,
    pub images: ThemeImages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeCustom {
    pub colors: ThemeColors,
    pub layout: ThemeLayout,
}

/// Color overrides. `None` falls back to the preset's colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: Option<String>,
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeLayout {
    pub border_radius: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeImages {
    pub logo: Option<String>,
    pub banner: Option<String>,
    pub background: Option<String>,
}

/// Feature switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(rename = "darkMode")]
    pub dark_mode: bool,
    #[serde(rename = "customCSS")]
    pub custom_css: bool,
}

/// A navigation entry, optionally with nested entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavItem {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NavItem>>,
}

impl NavItem {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            children: None,
        }
    }
}

/// Footer text. Both fields accept placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterConfig {
    pub copyright: String,
    pub extra: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialConfig {
    pub bilibili: Option<String>,
    pub github: Option<String>,
}

/// Third-party integrations, all disabled by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    pub analytics: AnalyticsConfig,
    pub comments: CommentsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsProvider {
    Google,
    Umami,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub provider: Option<AnalyticsProvider>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentsProvider {
    Giscus,
    Waline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentsConfig {
    pub provider: Option<CommentsProvider>,
    pub repo: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            info: InfoConfig {
                title: "班级静态展示页".into(),
                description: "一个美观、快速、可自定义的班级静态网站模板。".into(),
                keywords: "班级,主页,静态网站,Nuxt,Vue".into(),
                author: "青色漫地_wait".into(),
            },
            class: ClassConfig {
                name: "未命名班级".into(),
                school: "未知学校".into(),
                slogan: "每一天，都充满无限可能。".into(),
            },
            theme: ThemeConfig {
                preset: "default".into(),
                custom: ThemeCustom {
                    colors: ThemeColors {
                        primary: None,
                        background: None,
                    },
                    layout: ThemeLayout {
                        border_radius: "12px".into(),
                    },
                },
                images: ThemeImages {
                    logo: Some("/uploads/class-logo.png".into()),
                    banner: Some("/uploads/class-banner.jpg".into()),
                    background: None,
                },
            },
            features: FeaturesConfig {
                dark_mode: true,
                custom_css: false,
            },
            navigation: vec![
                NavItem::new("班级首页", "/"),
                NavItem::new("班级相册", "/album"),
                NavItem::new("荣誉墙", "/honors"),
                NavItem::new("关于我们", "/about"),
            ],
            footer: FooterConfig {
                copyright: "© {year} {class.name}. All rights reserved.".into(),
                extra: String::new(),
            },
            social: SocialConfig {
                bilibili: Some("https://space.bilibili.com/482891296".into()),
                github: Some("https://github.com/qsmd-wait/Class-Static-Display-Page".into()),
            },
            integrations: IntegrationsConfig {
                analytics: AnalyticsConfig {
                    provider: None,
                    id: None,
                },
                comments: CommentsConfig {
                    provider: None,
                    repo: None,
                },
            },
        }
    }
}

impl SiteConfig {
    /// Convert to the untyped tree that overrides are merged onto.
    pub fn to_tree(&self) -> ConfigResult<Value> {
        serde_json::to_value(self).map_err(ConfigError::DefaultsTree)
    }

    /// Load a complete configuration from a YAML defaults file.
    ///
    /// Unlike the override document, every non-optional field must be present.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::DefaultsUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::DefaultsInvalid {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Where the default configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultsSource {
    /// `SiteConfig::default()`, compiled into the binary.
    Builtin,
    /// A YAML file holding a complete configuration.
    File(PathBuf),
}

impl DefaultsSource {
    /// Build the default tree. This is the only fatal step of a cycle.
    pub fn load_tree(&self) -> ConfigResult<Value> {
        match self {
            DefaultsSource::Builtin => SiteConfig::default().to_tree(),
            DefaultsSource::File(path) => SiteConfig::load(path)?.to_tree(),
        }
    }

    /// The file backing the defaults, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DefaultsSource::Builtin => None,
            DefaultsSource::File(path) => Some(path),
        }
    }
}

impl std::fmt::Display for DefaultsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultsSource::Builtin => write!(f, "builtin"),
            DefaultsSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Configuration after merge and placeholder resolution.
///
/// Published snapshots are shared as `Arc<ResolvedConfig>` and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    tree: Value,
}

impl ResolvedConfig {
    pub fn new(tree: Value) -> Self {
        Self { tree }
    }

    /// The resolved tree, including any fields unknown to `SiteConfig`.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Look up a value by dotted path, e.g. `footer.copyright`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        super::placeholders::lookup(&self.tree, path)
    }

    /// Typed view of the resolved tree.
    ///
    /// Fails only if an override changed a field to an incompatible type.
    pub fn site(&self) -> Result<SiteConfig, serde_json::Error> {
        SiteConfig::deserialize(&self.tree)
    }

    /// Canonical artifact text: pretty JSON, two-space indent.
    pub fn to_pretty_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(&self.tree).map_err(ConfigError::Serialize)
    }

    pub fn into_tree(self) -> Value {
        self.tree
    }
}
