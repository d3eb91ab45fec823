//! Internationalization (i18n) support
//!
//! Month names and interface strings for the listing page. A handful of
//! locales are built in; `languages/<lang>.yml` files in the site directory
//! override or extend them.

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Strings for one locale
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Locale {
    /// Abbreviated month names, January first
    pub months_short: Vec<String>,
    /// Full month names, January first
    pub months: Vec<String>,
    /// Interface strings keyed by id ("load_more", "exit_preview", ...)
    pub strings: HashMap<String, String>,
}

impl Locale {
    fn builtin(months_short: [&str; 12], months: [&str; 12], strings: &[(&str, &str)]) -> Self {
        Self {
            months_short: months_short.iter().map(|m| m.to_string()).collect(),
            months: months.iter().map(|m| m.to_string()).collect(),
            strings: strings
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Overlay non-empty values from another locale
    fn merge(&mut self, other: Locale) {
        if other.months_short.len() == 12 {
            self.months_short = other.months_short;
        }
        if other.months.len() == 12 {
            self.months = other.months;
        }
        self.strings.extend(other.strings);
    }
}

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> locale
    locales: HashMap<String, Locale>,
}

impl I18n {
    /// Create a handler with the built-in locales
    pub fn new(language: &str) -> Self {
        let mut locales = HashMap::new();

        locales.insert(
            "en".to_string(),
            Locale::builtin(
                [
                    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov",
                    "Dec",
                ],
                [
                    "January", "February", "March", "April", "May", "June", "July", "August",
                    "September", "October", "November", "December",
                ],
                &[
                    ("load_more", "Load more posts"),
                    ("exit_preview", "Leave preview mode"),
                    ("loading", "Loading..."),
                    ("empty", "No posts yet."),
                    ("load_failed", "Could not load more posts. Try again."),
                ],
            ),
        );
        locales.insert(
            "pt-BR".to_string(),
            Locale::builtin(
                [
                    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov",
                    "Dez",
                ],
                [
                    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto",
                    "Setembro", "Outubro", "Novembro", "Dezembro",
                ],
                &[
                    ("load_more", "Carregar mais posts"),
                    ("exit_preview", "Sair do modo Preview"),
                    ("loading", "Carregando..."),
                    ("empty", "Nenhum post ainda."),
                    ("load_failed", "Não foi possível carregar mais posts. Tente novamente."),
                ],
            ),
        );
        locales.insert(
            "es".to_string(),
            Locale::builtin(
                [
                    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov",
                    "Dic",
                ],
                [
                    "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto",
                    "Septiembre", "Octubre", "Noviembre", "Diciembre",
                ],
                &[
                    ("load_more", "Cargar más posts"),
                    ("exit_preview", "Salir del modo vista previa"),
                    ("loading", "Cargando..."),
                    ("empty", "Aún no hay posts."),
                ],
            ),
        );
        locales.insert(
            "fr".to_string(),
            Locale::builtin(
                [
                    "Janv", "Févr", "Mars", "Avr", "Mai", "Juin", "Juil", "Août", "Sept", "Oct",
                    "Nov", "Déc",
                ],
                [
                    "Janvier", "Février", "Mars", "Avril", "Mai", "Juin", "Juillet", "Août",
                    "Septembre", "Octobre", "Novembre", "Décembre",
                ],
                &[
                    ("load_more", "Charger plus d'articles"),
                    ("exit_preview", "Quitter l'aperçu"),
                    ("loading", "Chargement..."),
                ],
            ),
        );
        locales.insert(
            "de".to_string(),
            Locale::builtin(
                [
                    "Jan", "Feb", "Mär", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov",
                    "Dez",
                ],
                [
                    "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August",
                    "September", "Oktober", "November", "Dezember",
                ],
                &[
                    ("load_more", "Weitere Beiträge laden"),
                    ("exit_preview", "Vorschau verlassen"),
                    ("loading", "Wird geladen..."),
                ],
            ),
        );

        Self {
            language: language.to_string(),
            locales,
        }
    }

    /// Load language files from a directory
    ///
    /// Each `<lang>.yml` is merged over the built-in locale of the same name.
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<Locale>(&content) {
                Ok(locale) => {
                    self.locales
                        .entry(lang.to_string())
                        .or_default()
                        .merge(locale);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Locale for the current language
    ///
    /// Lookup tries the exact tag, then its primary subtag ("pt" for "pt-PT"),
    /// then English.
    fn locale(&self) -> Option<&Locale> {
        let primary = self.language.split(['-', '_']).next().unwrap_or("");
        self.locales
            .get(&self.language)
            .or_else(|| self.locales.get(primary))
            .or_else(|| {
                self.locales
                    .iter()
                    .find(|(tag, _)| tag.split('-').next() == Some(primary))
                    .map(|(_, locale)| locale)
            })
    }

    /// Get a translation by key, falling back to English, then to the key
    pub fn get(&self, key: &str) -> String {
        self.locale()
            .and_then(|l| l.strings.get(key))
            .or_else(|| self.locales.get("en").and_then(|l| l.strings.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Abbreviated month name, `month` is 1-based
    pub fn month_short(&self, month: u32) -> String {
        self.month_from(month, |l| &l.months_short)
    }

    /// Full month name, `month` is 1-based
    pub fn month_long(&self, month: u32) -> String {
        self.month_from(month, |l| &l.months)
    }

    fn month_from(&self, month: u32, table: impl Fn(&Locale) -> &Vec<String>) -> String {
        let idx = month.saturating_sub(1) as usize;
        self.locale()
            .and_then(|l| table(l).get(idx))
            .or_else(|| self.locales.get("en").and_then(|l| table(l).get(idx)))
            .cloned()
            .unwrap_or_else(|| format!("{:02}", month))
    }

    /// All interface strings for the current language, English-filled
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = self
            .locale()
            .map(|l| l.strings.clone())
            .unwrap_or_default();

        if let Some(en) = self.locales.get("en") {
            for (k, v) in &en.strings {
                result.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }

        result
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}
